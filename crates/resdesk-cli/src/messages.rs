//! `reply` and `thread` command handlers.
//!
//! Both resolve a single reservation by client name (and date, when the name
//! is ambiguous) and key its thread with [`Reservation::thread_key`].

use anyhow::{bail, Context};
use chrono::NaiveDate;
use resdesk_client::{FileThreadStore, RelayClient, ReservationFetcher, ThreadMessage};
use resdesk_core::{AppConfig, Reservation};

/// Picks the one reservation for `client` (case-insensitive), narrowed to
/// `date` when given.
///
/// # Errors
///
/// Fails when nothing matches, or when several reservations match and no
/// date was given.
pub(crate) fn find_reservation<'a>(
    reservations: &'a [Reservation],
    client: &str,
    date: Option<NaiveDate>,
) -> anyhow::Result<&'a Reservation> {
    let wanted = client.trim().to_lowercase();
    let matches: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.client_name.to_lowercase() == wanted)
        .filter(|r| date.is_none_or(|d| r.calendar_date() == d))
        .collect();

    match matches.as_slice() {
        [] => match date {
            Some(d) => bail!("no reservation for '{client}' on {d}"),
            None => bail!("no reservation for '{client}'"),
        },
        [only] => Ok(*only),
        several => {
            let dates: Vec<String> = several
                .iter()
                .map(|r| r.calendar_date().to_string())
                .collect();
            bail!(
                "'{client}' has {} reservations ({}); pass --date to pick one",
                several.len(),
                dates.join(", ")
            )
        }
    }
}

async fn resolve(
    config: &AppConfig,
    client: &str,
    date: Option<NaiveDate>,
) -> anyhow::Result<Reservation> {
    let data = ReservationFetcher::from_config(config)?.fetch().await?;
    find_reservation(&data.reservations, client, date).cloned()
}

/// Record the guest's message, ask the relay for a reply, and record that too.
///
/// The guest message is stored before the relay is called so it survives a
/// relay failure.
///
/// # Errors
///
/// Returns an error if the reservation cannot be resolved, the thread store
/// cannot be written, or the relay call fails.
pub(crate) async fn run_reply(
    config: &AppConfig,
    client: &str,
    date: Option<NaiveDate>,
    message: &str,
) -> anyhow::Result<()> {
    let reservation = resolve(config, client, date).await?;
    let key = reservation.thread_key();
    let store = FileThreadStore::new(&config.threads_path);
    let relay = RelayClient::from_config(config)?;

    store
        .append(&key, message, false)
        .await
        .context("failed to record guest message")?;

    let reply = relay.generate_reply(message, &reservation).await?;
    store
        .append(&key, &reply, true)
        .await
        .context("failed to record reply")?;

    tracing::info!(thread_key = %key, "reply generated");
    println!("{reply}");
    Ok(())
}

/// Print the stored thread for one reservation.
///
/// # Errors
///
/// Returns an error if the reservation cannot be resolved.
pub(crate) async fn run_thread(
    config: &AppConfig,
    client: &str,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let reservation = resolve(config, client, date).await?;
    let key = reservation.thread_key();
    let store = FileThreadStore::new(&config.threads_path);
    let thread = store.load(&key).await;

    println!(
        "{} on {} ({} guests)",
        reservation.client_name,
        reservation.date.format("%Y-%m-%d %H:%M"),
        reservation.number_of_guests
    );
    if thread.is_empty() {
        println!("no messages yet");
        return Ok(());
    }
    for message in &thread {
        println!("{}", format_message(message));
    }
    Ok(())
}

pub(crate) fn format_message(message: &ThreadMessage) -> String {
    let who = if message.is_reply { "restaurant" } else { "guest" };
    format!(
        "[{}] {who}: {}",
        message.timestamp.format("%Y-%m-%d %H:%M"),
        message.content
    )
}
