use catalog_harvest::app::App;
use catalog_harvest::cli::Args;
use catalog_harvest::config::Config;
use catalog_harvest::logging::setup_logging;
use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();
    let passes = args.passes();

    // Logging depends on the config, so a bad config can only be reported on stderr
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        passes = ?passes,
        listings_path = %config.listings_path.display(),
        details_path = %config.details_path.display(),
        "starting catalog harvest"
    );

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = ?e, "Failed to initialize application");
            return ExitCode::FAILURE;
        }
    };

    // First Ctrl+C stops new work; everything already persisted stays on disk
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, stopping the current pass");
            signal_token.cancel();
        }
    });

    let code = app.run(&passes, shutdown).await;
    info!("catalog harvest finished");
    code
}
