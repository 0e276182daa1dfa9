use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use studymind_client::ClientSettings;

mod app;
mod effects;
mod logging;
mod persistence;
mod ui;

use logging::LogDestination;

/// StudyMind - ask exam-style questions about your own PDF study material
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend base URL (defaults to $STUDYMIND_API_URL, then http://localhost:8000)
    #[arg(long)]
    api_url: Option<String>,

    /// Milliseconds between ingestion status checks
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Directory holding persisted study settings
    #[arg(long, default_value = ".studymind")]
    data_dir: PathBuf,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    log: LogDestination,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::initialize(cli.log);

    // CLI flags > env vars > defaults
    let mut settings = ClientSettings::from_env();
    if let Some(url) = cli.api_url {
        settings = settings.with_base_url(url);
    }
    if let Some(ms) = cli.poll_interval_ms {
        settings.poll_interval = Duration::from_millis(ms.max(1));
    }

    app::run(settings, cli.data_dir)
}
