use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

mod not_found;

pub use not_found::not_found_handler;

/// JSON body of every API error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub msg: String,
}

impl ErrorBody {
    pub fn response(status: StatusCode, msg: impl Into<String>) -> Response {
        (status, Json(ErrorBody { msg: msg.into() })).into_response()
    }
}
