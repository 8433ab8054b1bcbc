use std::path::PathBuf;

use clap::Args;

use common::prelude::sanitize_display_name;
use hashdrop_daemon::http_server::api::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Fetch {
    /// Key the file was stored under
    #[arg(long)]
    pub file_key: String,

    /// Where to write the file (defaults to the stored name in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Overwrite the output file if it already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("{0} already exists, pass --force to overwrite")]
    Exists(PathBuf),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Fetch {
    type Error = FetchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fetched = ctx.client.download(&self.file_key).await?;

        // the server already strips paths, but never trust a header with our filesystem
        let output = self.output.clone().unwrap_or_else(|| {
            PathBuf::from(sanitize_display_name(
                fetched.filename.as_deref().unwrap_or(&self.file_key),
            ))
        });

        if output.exists() && !self.force {
            return Err(FetchError::Exists(output));
        }

        tokio::fs::write(&output, &fetched.content)
            .await
            .map_err(|source| FetchError::Write {
                path: output.clone(),
                source,
            })?;

        Ok(format!(
            "Fetched {} ({} bytes) to {}",
            self.file_key,
            fetched.content.len(),
            output.display()
        ))
    }
}
