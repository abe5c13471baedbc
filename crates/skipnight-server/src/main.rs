//! Host bridge binary for the SkipNight vote engine.
//!
//! Runs the vote engine over in-memory worlds and speaks JSON lines: host
//! events and host commands arrive on stdin, rendered notices, progress bars,
//! replies, and resolutions leave on stdout. Logs go to stderr so stdout stays
//! machine-readable.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `skipnight-config.yaml` (or `SKIPNIGHT_CONFIG`)
//! 2. Initialize structured logging (tracing) at the configured level
//! 3. Compile message templates
//! 4. Build the engine and its tick loop
//! 5. Start the stdout writer and stdin reader tasks
//! 6. Tick until stdin closes or Ctrl-C
//! 7. Flush queued work and output

mod error;
mod input;
mod output;
mod protocol;

use std::path::PathBuf;
use std::time::Duration;

use skipnight_core::config::SkipConfig;
use skipnight_core::messaging::MessageCatalog;
use skipnight_core::runner::TickCallback;
use skipnight_core::{SimWorlds, TickLoop, VoteEngine};
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;
use crate::output::{JsonLinesMessenger, SummaryCallback};

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "skipnight-config.yaml";

/// Environment variable naming an alternative configuration file.
const CONFIG_PATH_ENV: &str = "SKIPNIGHT_CONFIG";

/// Application entry point for the bridge.
///
/// # Errors
///
/// Returns an error if configuration, templates, or stdout fail.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (mut config, from_file) = load_config(&config_path)?;
    config.logging.apply_env_overrides();

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("skipnight-server starting");
    info!(
        path = %config_path.display(),
        from_file,
        tick_interval_ms = config.scheduler.tick_interval_ms,
        check_interval_ticks = config.scheduler.check_interval_ticks,
        step_ticks = config.fast_forward.step_ticks,
        "Configuration loaded"
    );

    // 3. Compile message templates.
    let catalog = MessageCatalog::new(&config.messages)?;

    // 4. Build the engine.
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let messenger = JsonLinesMessenger::new(catalog, out_tx.clone());
    let tick_interval = Duration::from_millis(config.scheduler.tick_interval_ms);
    let engine = VoteEngine::new(config, SimWorlds::new(), messenger);
    let (mut tick_loop, handle) = TickLoop::new(engine);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 5. Start the I/O pumps.
    let writer = tokio::spawn(output::write_lines(out_rx, tokio::io::stdout()));
    let reader = {
        let out = out_tx.clone();
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let result =
                input::read_lines(BufReader::new(tokio::io::stdin()), handle, out, config_path)
                    .await;
            shutdown.send_replace(true);
            result
        })
    };
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            shutdown_tx.send_replace(true);
        }
    });

    // 6. Tick.
    let mut callback = SummaryCallback::new(out_tx);
    let total_ticks = tick_loop.run(tick_interval, shutdown_rx, &mut callback).await;

    // 7. Flush. Work the reader queued before stopping still gets applied.
    let summary = tick_loop.perform_one_tick();
    callback.on_tick(&summary);

    if reader.is_finished() {
        match reader.await {
            Ok(Ok(lines)) => info!(lines, "input drained"),
            Ok(Err(e)) => warn!(error = %e, "input stopped with an error"),
            Err(e) => warn!(error = %e, "input task failed"),
        }
    } else {
        reader.abort();
    }

    drop(tick_loop);
    drop(callback);
    let written = writer.await.map_err(|e| ServerError::Task {
        message: e.to_string(),
    })??;

    info!(total_ticks, written, "skipnight-server shutdown complete");
    Ok(())
}

/// Load the configuration, falling back to defaults when the file is absent.
///
/// Returns the configuration and whether it came from the file.
fn load_config(path: &std::path::Path) -> Result<(SkipConfig, bool), ServerError> {
    if path.exists() {
        Ok((SkipConfig::from_file(path)?, true))
    } else {
        Ok((SkipConfig::default(), false))
    }
}
