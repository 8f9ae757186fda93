use clap::Parser;
use expense_dashboard::args::{Args, Command};
use expense_dashboard::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Values in a .env file in the working directory become defaults for the env-backed flags.
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // When EXPENSES_IN_TEST_MODE is set and non-empty the seeded in-memory sheet is used instead
    // of Google Sheets.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args).await?.print(),

        Command::Dashboard(dashboard_args) => {
            let config = Config::load(home).await?;
            commands::dashboard(&config, mode, dashboard_args)
                .await?
                .print()
        }

        Command::Months(months_args) => {
            let config = Config::load(home).await?;
            commands::months(&config, mode, months_args).await?.print()
        }

        Command::Rows(rows_args) => {
            let config = Config::load(home).await?;
            commands::rows(&config, mode, rows_args).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => {
            // Only this package's library and binary log at the requested level.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
