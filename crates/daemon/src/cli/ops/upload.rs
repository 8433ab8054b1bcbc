use std::path::PathBuf;

use clap::Args;

use hashdrop_daemon::http_server::api::client::ApiError;
use hashdrop_daemon::http_server::api::v0::files::{UploadRequest, UploadResponse};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Bucket the file belongs to; duplicates are detected per bucket
    #[arg(long)]
    pub bucket_id: String,

    /// Key to store the file under
    #[arg(long)]
    pub file_key: String,

    /// Name to store instead of the local file name
    #[arg(long)]
    pub filename: Option<String>,

    /// Local file to upload
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|source| UploadError::Read {
                path: self.path.clone(),
                source,
            })?;

        let filename = self.filename.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let request = UploadRequest {
            bucket_id: self.bucket_id.clone(),
            file_key: self.file_key.clone(),
            filename,
            content,
        };
        let response: UploadResponse = ctx.client.call(request).await?;

        Ok(format!(
            "Uploaded {} as {}",
            response.filename, response.file_key
        ))
    }
}
