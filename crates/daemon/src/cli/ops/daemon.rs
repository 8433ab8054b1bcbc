use std::net::{Ipv4Addr, SocketAddr};

use clap::Args;

use hashdrop_daemon::state::AppState;
use hashdrop_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

/// Megabytes from config to a byte limit, capped instead of overflowing
fn upload_limit_bytes(max_upload_size_mb: usize) -> usize {
    max_upload_size_mb.saturating_mul(1024 * 1024)
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] hashdrop_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.hashdrop)
        let state = AppState::load(ctx.config_path.clone())?;

        let api_port = self.api_port.unwrap_or(state.config.api_port);
        let api_listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, api_port));

        let config = ServiceConfig {
            api_listen_addr,
            max_upload_size_bytes: upload_limit_bytes(state.config.max_upload_size_mb),
            snapshot_path: state.snapshot_path,
            write_mode: state.config.write_mode,
            key_policy: state.config.key_policy,
            snapshot_recovery: state.config.snapshot_recovery,
            log_level: tracing::Level::DEBUG,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_limit_bytes() {
        assert_eq!(upload_limit_bytes(500), 500 * 1024 * 1024);
        assert_eq!(upload_limit_bytes(0), 0);
        assert_eq!(upload_limit_bytes(usize::MAX), usize::MAX);
    }
}
