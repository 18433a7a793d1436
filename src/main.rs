use clap::Parser;
use supdog_stats::app::App;
use supdog_stats::cli::Cli;
use supdog_stats::config::Config;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; only a missing file falls back to the defaults
    let config = match Config::load_optional(&cli.config)? {
        Some(config) => config,
        None => {
            eprintln!("Warning: {} not found, using default configuration", cli.config);
            Config::builtin()?
        }
    };

    // Initialize telemetry
    let _telemetry = supdog_stats::telemetry::init_telemetry(&config.telemetry)?;

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id, command = cli.command.name());

    let app = App::from_config(config)?;
    let result = cli.command.execute(&app).instrument(span.clone()).await;
    if let Err(e) = &result {
        span.in_scope(|| tracing::error!(error = %format!("{:#}", e), "Job failed"));
    }
    result
}
