pub mod utils;

use std::path::Path;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server;
use crate::{ServiceConfig, ServiceState, StateSetupError};

/// How long spawned tasks get to finish after the shutdown signal
const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_FILE_NAME: &str = "hashdrop.log";

/// Exit status when the registry cannot be brought up
pub const EXIT_STATE_SETUP: i32 = 3;
/// Exit status when tasks outlive [`FINAL_SHUTDOWN_TIMEOUT`]
pub const EXIT_SHUTDOWN_TIMEOUT: i32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("error creating server state: {0}")]
    State(#[from] StateSetupError),
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

/// Handle for gracefully shutting down the daemon service.
pub struct ShutdownHandle {
    signal_waiter: JoinHandle<()>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Trigger shutdown programmatically
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Block until a signal (or [`shutdown`](Self::shutdown)) fires, then
    ///  give the servers [`FINAL_SHUTDOWN_TIMEOUT`] to drain. Exits the
    ///  process if they do not.
    pub async fn wait(self) {
        let _ = self.signal_waiter.await;

        let drained = tokio::time::timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(self.tasks)).await;
        if drained.is_err() {
            tracing::error!(
                "Failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            );
            std::process::exit(EXIT_SHUTDOWN_TIMEOUT);
        }
        tracing::info!("shutdown complete");
    }
}

fn env_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Daily-rolling file layer under `log_dir`
fn file_layer<S>(log_dir: &Path, level: tracing::Level) -> (impl Layer<S>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_dir, e
        );
    }

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter(level));

    (layer, guard)
}

/// Install the global subscriber: compact stdout plus, when `log_dir` is
///  set, a plain-text daily file. Also hooks panics into tracing and logs
///  the build info.
///
/// The returned guards flush the non-blocking writers and must outlive
///  the service.
pub fn init_logging(service_config: &ServiceConfig) -> Vec<WorkerGuard> {
    let level = service_config.log_level;
    let mut guards = Vec::new();

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(env_filter(level));

    let file_layer = service_config.log_dir.as_deref().map(|log_dir| {
        let (layer, guard) = file_layer(log_dir, level);
        guards.push(guard);
        layer
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Load the registry and spawn the API server.
///
/// The returned `ShutdownHandle` must be kept alive; dropping it does not stop the service.
pub async fn start_service(
    service_config: &ServiceConfig,
) -> Result<(ServiceState, ShutdownHandle), ServiceError> {
    let state = ServiceState::from_config(service_config).await?;
    let (signal_waiter, shutdown_tx, shutdown_rx) =
        utils::graceful_shutdown_blocker().map_err(ServiceError::Signal)?;

    let api_config = http_server::Config::new(service_config.api_listen_addr)
        .with_max_upload_size(service_config.max_upload_size_bytes);
    let api_state = state.clone();
    let api_task = tokio::spawn(async move {
        if let Err(e) = http_server::run_api(api_config, api_state, shutdown_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });

    tracing::info!(
        addr = %service_config.api_listen_addr,
        snapshot = %service_config.snapshot_path.display(),
        "hashdrop running"
    );

    let handle = ShutdownHandle {
        signal_waiter,
        tasks: vec![api_task],
        shutdown_tx,
    };

    Ok((state, handle))
}

/// Run the daemon until a shutdown signal arrives. For the CLI binary.
pub async fn spawn_service(service_config: &ServiceConfig) {
    let guards = init_logging(service_config);

    match start_service(service_config).await {
        Ok((_, handle)) => handle.wait().await,
        Err(e) => {
            tracing::error!("{}", e);
            // exit skips destructors, flush the log writers first
            drop(guards);
            std::process::exit(EXIT_STATE_SETUP);
        }
    }
}
