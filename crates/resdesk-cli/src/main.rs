mod messages;
mod reservations;

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use resdesk_core::{AppConfig, DateScope, FilterCriteria};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "resdesk")]
#[command(about = "Restaurant reservation dashboard command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List reservations matching the filters, sorted by date
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show aggregate statistics for reservations matching the filters
    Insights {
        #[command(flatten)]
        filter: FilterArgs,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Record a guest message and draft a reply through the relay
    Reply {
        /// Client name as it appears on the reservation
        client: String,
        /// The guest's message
        #[arg(long, short)]
        message: String,
        /// Reservation date (YYYY-MM-DD) when the client has several
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the message thread for a reservation
    Thread {
        /// Client name as it appears on the reservation
        client: String,
        /// Reservation date (YYYY-MM-DD) when the client has several
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, Default, Args)]
struct FilterArgs {
    /// Only reservations on this day (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Case-insensitive text over client names, requests and dishes
    #[arg(long)]
    search: Option<String>,
    /// Only VIP guests
    #[arg(long)]
    vip_only: bool,
    /// Only reservations with special requests
    #[arg(long)]
    special_requests: bool,
    /// Only reservations with a dietary-tagged dish
    #[arg(long)]
    dietary: bool,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        Self {
            date_scope: args.date.map_or(DateScope::All, DateScope::On),
            search_query: args.search,
            vip_only: args.vip_only,
            has_special_requests: args.special_requests,
            has_dietary_restrictions: args.dietary,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resdesk_core::load_app_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    tracing::debug!(env = %config.env, source = %config.data_source, "starting");
    match command {
        Commands::List { filter, json } => {
            reservations::run_list(config, &filter.into(), json).await
        }
        Commands::Insights { filter, json } => {
            reservations::run_insights(config, &filter.into(), json).await
        }
        Commands::Reply {
            client,
            message,
            date,
        } => messages::run_reply(config, &client, date, &message).await,
        Commands::Thread { client, date } => messages::run_thread(config, &client, date).await,
    }
}
