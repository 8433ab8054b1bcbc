use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::RegistryError;

use crate::http_server::api::client::ApiError;
use crate::http_server::ErrorBody;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchQuery {
    /// Serve with `Content-Disposition: inline` instead of as an attachment
    #[serde(default)]
    pub inline: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub file_key: String,
}

/// Bytes returned by a fetch, plus the name the server suggested for them
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub content: Bytes,
    pub filename: Option<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(file_key): Path<String>,
    Query(query): Query<FetchQuery>,
) -> Result<impl IntoResponse, FetchError> {
    tracing::debug!(file_key = %file_key, "Fetching file");

    let registry = state.registry().clone();
    let fetched = tokio::task::spawn_blocking(move || registry.fetch(&file_key))
        .await
        .map_err(|e| {
            tracing::error!("Fetch task failed: {}", e);
            FetchError::Internal
        })??;

    let mime_type = mime_guess::from_path(&fetched.display_name)
        .first_or_octet_stream()
        .to_string();
    let disposition = content_disposition(&fetched.display_name, query.inline.unwrap_or(false));

    Ok((
        http::StatusCode::OK,
        [(CONTENT_TYPE, mime_type), (CONTENT_DISPOSITION, disposition)],
        fetched.content,
    )
        .into_response())
}

/// Build a `Content-Disposition` value for `filename`.
///  Quotes, backslashes and control characters are dropped so the
///  header stays well formed.
pub fn content_disposition(filename: &str, inline: bool) -> String {
    let kind = if inline { "inline" } else { "attachment" };
    let escaped: String = filename
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    format!("{}; filename=\"{}\"", kind, escaped)
}

/// Pull the filename back out of a `Content-Disposition` value
pub fn parse_content_disposition(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|param| {
        let name = param.strip_prefix("filename=")?;
        let name = name.trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Internal error")]
    Internal,
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        match self {
            FetchError::Registry(RegistryError::NotFound(key)) => ErrorBody::response(
                http::StatusCode::NOT_FOUND,
                format!("file with key {} does not exist", key),
            ),
            FetchError::Registry(e) => {
                tracing::error!("Unexpected registry error on fetch: {}", e);
                ErrorBody::response(http::StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error")
            }
            FetchError::Internal => ErrorBody::response(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected error",
            ),
        }
    }
}

// Client side. The response is raw bytes rather than JSON, so this
//  goes through `ApiClient::download` instead of `ApiRequest`.
impl FetchRequest {
    pub fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let mut full_url = base_url.join("/api/v0/files/")?;
        full_url
            .path_segments_mut()
            .map_err(|_| ApiError::UrlParse(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(&self.file_key);
        Ok(client.get(full_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("report.pdf", false),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition("report.pdf", true),
            "inline; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition("a\"b\r\n.txt", false),
            "attachment; filename=\"ab.txt\""
        );
    }

    #[test]
    fn test_parse_content_disposition() {
        assert_eq!(
            parse_content_disposition("attachment; filename=\"notes.txt\"").as_deref(),
            Some("notes.txt")
        );
        assert_eq!(
            parse_content_disposition("inline;filename=x.bin").as_deref(),
            Some("x.bin")
        );
        assert_eq!(parse_content_disposition("attachment"), None);
    }

    #[test]
    fn test_fetch_request_escapes_key() {
        let base = Url::parse("http://localhost:5050").unwrap();
        let request = FetchRequest {
            file_key: "a b/c".to_string(),
        }
        .build_request(&base, &Client::new())
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://localhost:5050/api/v0/files/a%20b%2Fc"
        );
    }
}
