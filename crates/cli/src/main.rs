use crate::{
    commands::Commands,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
    ship::{ShipOptions, ShipReport},
};
use clap::Parser;
use sink_core::retry::RetryPolicy;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod ship;
mod shutdown;

#[derive(Parser)]
#[command(name = "pgsink", version, about = "Ship JSON records into a PostgreSQL table")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli.command, &shutdown).await {
        Ok(()) if shutdown.is_shutdown_requested() => ExitCode::ShutdownRequested,
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => ExitCode::ShutdownRequested,
        Err(err) => {
            error!(error = %err, "pgsink failed");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(command: Commands, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    match command {
        Commands::Ship {
            input,
            batch_size,
            tag,
            max_attempts,
            report,
            conn,
        } => {
            let env = conn::load_env(&conn)?;
            let config = conn::resolve_config(&conn, &env)?;

            let cancel = shutdown.cancel_token();
            let startup = RetryPolicy::default();
            let mut sink = tokio::select! {
                _ = cancel.cancelled() => return Err(CliError::ShutdownRequested),
                sink = conn::open_sink(config, &startup) => sink?,
            };

            let delivery = RetryPolicy::for_delivery();
            let options = ShipOptions {
                tag,
                batch_size,
                retry: RetryPolicy::new(max_attempts, delivery.base_delay, delivery.max_delay),
            };

            let reader = open_input(input).await?;
            let summary = ship::ship(&mut sink, reader, &options, &cancel).await?;
            write_summary(&summary, report).await
        }
        Commands::TestConn { conn } => {
            let env = conn::load_env(&conn)?;
            let config = conn::resolve_config(&conn, &env)?;
            conn::test_connection(config).await
        }
    }
}

async fn open_input(input: Option<PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin>, CliError> {
    Ok(match input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

async fn write_summary(summary: &ShipReport, path: Option<PathBuf>) -> Result<(), CliError> {
    match path {
        Some(path) => output::write_report(summary, &path).await,
        None => output::print_report(summary),
    }
}
