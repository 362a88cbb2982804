//! Headless launcher host speaking line-delimited JSON on stdin/stdout.
//!
//! All tracing output goes to stderr (and optionally a log file) so that
//! stdout remains a clean protocol channel.

use clap::Parser;
use std::path::PathBuf;

use lantern::LanternConfig;

/// Command-line arguments accepted by `lantern-host`.
#[derive(Parser, Debug)]
#[command(name = "lantern-host", version, about = "Launcher query host over stdin/stdout")]
struct Args {
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "LANTERN_CONFIG",
        help = "Configuration file (default: config.toml in the config directory)"
    )]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "NAMES",
        value_delimiter = ',',
        help = "Only query these providers, comma separated (default: all)"
    )]
    modules: Vec<String>,

    #[arg(long, help = "Also write a daily log file to the logs directory")]
    log_file: bool,

    #[arg(long, help = "Do not read or record usage history")]
    no_history: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = LanternConfig::load(args.config.as_deref())?;
    config.restrict_to(args.modules);
    if args.log_file {
        config.logging.file = true;
    }
    if args.no_history {
        config.history.enabled = false;
    }
    config.validate()?;

    let _log_guard = lantern::logging::init(&config.logging)?;
    tracing::info!("lantern-host starting");

    lantern::run_stdio(config).await.map_err(|e| {
        tracing::error!(error = %e, "lantern-host exited with error");
        anyhow::anyhow!("lantern-host failed: {e}")
    })?;

    tracing::info!("lantern-host shut down cleanly");
    Ok(())
}
