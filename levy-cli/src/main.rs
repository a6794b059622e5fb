use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use levy_cli::app::{self, Command, Settings};
use levy_cli::config::LevyConfig;
use levy_cli::logging;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Bangladeshi income tax and trade duty calculator.
///
/// Settings come from `levy.toml` in the working directory (or `--config`);
/// flags given here override the file.
#[derive(Debug, Parser)]
#[command(name = "levy", version)]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `levy.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log filter, e.g. `debug` or `info,levy_core=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = LevyConfig::load(cli.config.as_deref())?;

    // RUST_LOG beats the file; --log-level beats both.
    let level = cli.log_level.or_else(|| {
        std::env::var_os("RUST_LOG")
            .is_none()
            .then_some(config.logging.level.clone())
            .flatten()
    });
    if let Some(level) = level {
        logging::set_log_level(&level)?;
    }
    if let Some(path) = cli.log_file.as_ref().or(config.logging.file.as_ref()) {
        logging::enable_file_logging(path)?;
    }

    let db_config = config.database.overridden(cli.backend, cli.db);

    let settings = Settings {
        default_fiscal_year: config.tax.default_fiscal_year,
    };

    let repo = app::build_registry().create(&db_config).await?;
    debug!(command = ?cli.command, "running command");

    let output = app::run(&*repo, &settings, cli.command).await?;
    println!("{output}");

    Ok(())
}
