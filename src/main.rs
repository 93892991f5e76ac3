//! Session-registry binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use session_registry::cli::{parse_args, print_help, print_version};
use session_registry::config::Config;
use session_registry::{logging, EvictionScheduler, SessionStore};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Try 'session-registry --help' for more information.");
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_with_level(config.log_filter()).ok();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("session-registry failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("session-registry v{}", env!("CARGO_PKG_VERSION"));

    let eviction = config.to_eviction_config()?;
    let store: Arc<SessionStore> = Arc::new(SessionStore::new());
    info!("Session store initialized");

    let handle = EvictionScheduler::new(Arc::clone(&store), eviction).start()?;
    info!(policies = ?handle.policies(), "Eviction scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    handle.shutdown().await;
    info!(remaining = store.count(), "session-registry stopped");
    Ok(())
}
