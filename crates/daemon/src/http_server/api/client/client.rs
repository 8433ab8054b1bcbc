use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use reqwest::{Client, Response};
use url::Url;

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::v0::files::fetch::parse_content_disposition;
use crate::http_server::api::v0::files::{FetchRequest, FetchedFile};
use crate::http_server::ErrorBody;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        // no default Content-Type: uploads set their own multipart boundary
        let client = Client::builder().build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = check_status(request_builder.send().await?).await?;
        Ok(response.json::<T::Response>().await?)
    }

    /// Fetch the raw bytes stored under `file_key`
    pub async fn download(&self, file_key: &str) -> Result<FetchedFile, ApiError> {
        let request = FetchRequest {
            file_key: file_key.to_string(),
        };
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = check_status(request_builder.send().await?).await?;

        let filename = filename_from_headers(response.headers());
        let content = response.bytes().await?;

        Ok(FetchedFile { content, filename })
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}

/// Suggested filename from `Content-Disposition`. The server sends the
///  stored name as raw UTF-8, which `HeaderValue::to_str` would reject.
fn filename_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?;
    parse_content_disposition(&String::from_utf8_lossy(value.as_bytes()))
}

/// Turn a non-2xx reply into [`ApiError::HttpStatus`], preferring the
///  `msg` of a JSON error body over the raw text
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    let msg = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.msg)
        .unwrap_or(text);
    Err(ApiError::HttpStatus(status, msg))
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_filename_from_headers_keeps_utf8() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_bytes("attachment; filename=\"résumé.pdf\"".as_bytes()).unwrap(),
        );
        assert_eq!(filename_from_headers(&headers).as_deref(), Some("résumé.pdf"));
    }

    #[test]
    fn test_filename_from_headers_missing() {
        assert_eq!(filename_from_headers(&HeaderMap::new()), None);
    }
}
