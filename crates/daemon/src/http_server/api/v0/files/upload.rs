use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::RegistryError;

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::http_server::ErrorBody;
use crate::ServiceState;

pub const BUCKET_ID_FIELD: &str = "bucket_id";
pub const FILE_KEY_FIELD: &str = "file_key";
pub const FILE_FIELD: &str = "file";

/// Client side of an upload: one file plus the bucket and key to store it under
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bucket_id: String,
    pub file_key: String,
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_key: String,
    /// Display name the file was stored under, with any path removed
    pub filename: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    let mut bucket_id = String::new();
    let mut file_key = String::new();
    let mut file: Option<(String, Bytes)> = None;

    // Parse multipart form data
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Multipart parsing error: {}", e);
        UploadError::MultipartError(e.to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            BUCKET_ID_FIELD => {
                bucket_id = field.text().await.map_err(|e| {
                    tracing::error!("Error reading bucket_id field: {}", e);
                    UploadError::MultipartError(e.to_string())
                })?;
            }
            FILE_KEY_FIELD => {
                file_key = field.text().await.map_err(|e| {
                    tracing::error!("Error reading file_key field: {}", e);
                    UploadError::MultipartError(e.to_string())
                })?;
            }
            FILE_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Error reading file data for {}: {}", filename, e);
                    UploadError::MultipartError(e.to_string())
                })?;
                file = Some((filename, data));
            }
            _ => {
                tracing::warn!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let (filename, data) =
        file.ok_or_else(|| UploadError::InvalidRequest("file is required".into()))?;

    tracing::info!(
        bucket_id = %bucket_id,
        file_key = %file_key,
        filename = %filename,
        size = data.len(),
        "Uploading file"
    );

    // snapshot writes block, keep them off the async workers
    let registry = state.registry().clone();
    let ingested = tokio::task::spawn_blocking(move || {
        registry.ingest(&bucket_id, &file_key, &filename, data)
    })
    .await
    .map_err(|e| {
        tracing::error!("Ingest task failed: {}", e);
        UploadError::Internal
    })??;

    Ok((
        http::StatusCode::OK,
        axum::Json(UploadResponse {
            file_key: ingested.key,
            filename: ingested.display_name,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Multipart error: {0}")]
    MultipartError(String),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Internal error")]
    Internal,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::InvalidRequest(msg) | UploadError::MultipartError(msg) => {
                ErrorBody::response(http::StatusCode::BAD_REQUEST, format!("Bad request: {}", msg))
            }
            UploadError::Registry(e @ RegistryError::Validation(_)) => {
                ErrorBody::response(http::StatusCode::BAD_REQUEST, e.to_string())
            }
            UploadError::Registry(
                e @ (RegistryError::DuplicateContent { .. } | RegistryError::KeyConflict(_)),
            ) => ErrorBody::response(http::StatusCode::CONFLICT, e.to_string()),
            UploadError::Registry(RegistryError::NotFound(key)) => ErrorBody::response(
                http::StatusCode::NOT_FOUND,
                format!("file with key {} does not exist", key),
            ),
            UploadError::Registry(RegistryError::Persistence(e)) => {
                tracing::error!("Failed to persist upload: {}", e);
                ErrorBody::response(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to save file metadata",
                )
            }
            UploadError::Internal => ErrorBody::response(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected error",
            ),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for UploadRequest {
    type Response = UploadResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/files")?;
        let form = Form::new()
            .text(BUCKET_ID_FIELD, self.bucket_id)
            .text(FILE_KEY_FIELD, self.file_key)
            .part(FILE_FIELD, Part::bytes(self.content).file_name(self.filename));
        Ok(client.post(full_url).multipart(form))
    }
}
