use anyhow::Result;
use clap::Parser;
use qdps::cli::Cli;
use qdps::config::{AppSettings, Paths};
use qdps::error::CliError;
use qdps::output;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CliError>() {
                Some(CliError::Cancelled) => output::print_warning(&e.to_string()),
                _ => output::print_error(&format!("{:#}", e)),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let paths = match Paths::discover() {
        Ok(paths) => Some(paths),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    let settings = match (&cli.config, &paths) {
        (Some(path), _) => AppSettings::load_from(path)?,
        (None, Some(paths)) => AppSettings::load(paths)?,
        (None, None) => AppSettings::default(),
    };
    debug!("settings: {:?}", settings);

    cli.scan
        .execute(&settings, paths.as_ref(), cli.verbose, cli.quiet)
        .await?;
    Ok(())
}
