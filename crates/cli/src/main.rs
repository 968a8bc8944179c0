// folio CLI entry point.

use std::path::PathBuf;

use clap::Parser;
use folio_engine::config::FolioConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;

use exit_code::ExitCode;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "folio", about = "Block-based notebook documents")]
struct Cli {
    /// Block database file (defaults to the configured path).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: commands::Command,
}

fn init_tracing(fallback_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mut config = FolioConfig::load();
    init_tracing(&config.log_filter);

    if let Some(db) = cli.db {
        config.database_path = db;
    }
    let format = OutputFormat::detect(cli.json);

    match commands::run(cli.command, &config, format).await {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => {
            output::print_anyhow_error(format, &error);
            ExitCode::from_error(&error).into()
        }
    }
}
