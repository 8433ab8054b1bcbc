use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::ErrorBody;

pub async fn not_found_handler(headers: HeaderMap) -> Response {
    let accepts_json = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"));

    if accepts_json {
        ErrorBody::response(StatusCode::NOT_FOUND, "not found")
    } else {
        (
            StatusCode::NOT_FOUND,
            [(axum::http::header::CONTENT_TYPE, "text/plain")],
            "not found",
        )
            .into_response()
    }
}
