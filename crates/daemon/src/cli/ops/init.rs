use std::path::PathBuf;

use clap::{Args, ValueEnum};

use common::prelude::KeyPolicy;
use hashdrop_daemon::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port to write into the config
    #[arg(long)]
    pub api_port: Option<u16>,

    /// What an upload to an existing file key does
    #[arg(long, value_enum)]
    pub key_policy: Option<KeyPolicyArg>,

    /// Snapshot file name, relative to the config directory
    #[arg(long)]
    pub snapshot_file: Option<PathBuf>,
}

/// Key reuse policy for CLI selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyPolicyArg {
    /// Replace the file stored under the key (default)
    Overwrite,
    /// Refuse the upload with a conflict
    Reject,
}

impl From<KeyPolicyArg> for KeyPolicy {
    fn from(arg: KeyPolicyArg) -> Self {
        match arg {
            KeyPolicyArg::Overwrite => KeyPolicy::Overwrite,
            KeyPolicyArg::Reject => KeyPolicy::Reject,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::default();
        if let Some(port) = self.api_port {
            config.api_port = port;
        }
        if let Some(snapshot_file) = &self.snapshot_file {
            config.snapshot_file = snapshot_file.clone();
        }
        if let Some(key_policy) = self.key_policy {
            config.key_policy = key_policy.into();
        }

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(format!(
            "Initialized hashdrop in {}\n  config:   {}\n  snapshot: {}\n  api_port: {}",
            state.app_dir.display(),
            state.config_path.display(),
            state.snapshot_path.display(),
            state.config.api_port
        ))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        init: Init,
    }

    #[test]
    fn test_key_policy_flag() {
        let cli = Cli::try_parse_from(["init", "--key-policy", "reject"]).unwrap();
        assert_eq!(cli.init.key_policy.map(KeyPolicy::from), Some(KeyPolicy::Reject));

        let cli = Cli::try_parse_from(["init", "--key-policy", "overwrite"]).unwrap();
        assert_eq!(cli.init.key_policy.map(KeyPolicy::from), Some(KeyPolicy::Overwrite));

        let cli = Cli::try_parse_from(["init"]).unwrap();
        assert_eq!(cli.init.key_policy, None);

        assert!(Cli::try_parse_from(["init", "--key-policy", "ignore"]).is_err());
    }
}
