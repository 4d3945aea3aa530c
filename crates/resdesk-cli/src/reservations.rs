//! `list` and `insights` command handlers.

use resdesk_client::ReservationFetcher;
use resdesk_core::{
    compute_insights, filter_reservations, AppConfig, FilterCriteria, InsightSummary, Reservation,
};

/// Fetches the dataset and applies `criteria`.
pub(crate) async fn load_filtered(
    config: &AppConfig,
    criteria: &FilterCriteria,
) -> anyhow::Result<Vec<Reservation>> {
    let fetcher = ReservationFetcher::from_config(config)?;
    let data = fetcher.fetch().await?;
    Ok(filter_reservations(&data.reservations, criteria))
}

/// Print matching reservations, earliest first.
///
/// # Errors
///
/// Returns an error if the dataset cannot be fetched.
pub(crate) async fn run_list(
    config: &AppConfig,
    criteria: &FilterCriteria,
    json: bool,
) -> anyhow::Result<()> {
    let reservations = load_filtered(config, criteria).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reservations)?);
        return Ok(());
    }

    if reservations.is_empty() {
        println!("no reservations match the given filters");
        return Ok(());
    }

    let header = format!(
        "{:<18}{:<8}{:<5}{:<24}REQUESTS",
        "DATE", "GUESTS", "VIP", "CLIENT"
    );
    println!("{header}");
    for r in &reservations {
        println!("{}", format_row(r));
    }
    println!();
    println!("{} reservation(s)", reservations.len());

    Ok(())
}

/// Print the insight summary for matching reservations.
///
/// # Errors
///
/// Returns an error if the dataset cannot be fetched.
pub(crate) async fn run_insights(
    config: &AppConfig,
    criteria: &FilterCriteria,
    json: bool,
) -> anyhow::Result<()> {
    let reservations = load_filtered(config, criteria).await?;
    let summary = compute_insights(&reservations);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary));
    }
    Ok(())
}

pub(crate) fn format_row(r: &Reservation) -> String {
    let client = if r.client_name.chars().count() > 22 {
        format!("{}...", r.client_name.chars().take(19).collect::<String>())
    } else {
        r.client_name.clone()
    };
    format!(
        "{:<18}{:<8}{:<5}{:<24}{}",
        r.date.format("%Y-%m-%d %H:%M").to_string(),
        r.number_of_guests,
        if r.is_vip { "yes" } else { "" },
        client,
        r.special_requests.join("; ")
    )
}

pub(crate) fn format_summary(summary: &InsightSummary) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    line(format!("Reservations:       {}", summary.total_reservations));
    line(format!("Total guests:       {}", summary.total_guests));
    line(format!("Average party size: {:.1}", summary.average_party_size));
    line(format!("VIP guests:         {}", summary.vip_count));
    line(format!("Total revenue:      {:.2}", summary.total_revenue));
    line(format!("Average revenue:    {:.2}", summary.average_revenue));

    if summary.popular_dishes.is_empty() {
        line("Popular dishes:     none".to_string());
    } else {
        line("Popular dishes:".to_string());
        for (rank, dish) in summary.popular_dishes.iter().enumerate() {
            line(format!("  {}. {} ({})", rank + 1, dish.name, dish.quantity));
        }
    }

    line(format!(
        "Special occasions:  {}",
        summary.special_occasion_count
    ));
    for occasion in &summary.special_occasions {
        line(format!("  {}: {}", occasion.client_name, occasion.request));
    }
    out
}
