use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio::time::timeout;

use super::data_source::*;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReadyBody {
    Ok { records: usize },
    Failure { message: String },
}

/// 200 with the record count while uploads can be persisted, 503 otherwise
#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    let (status, body) = match timeout(HEALTH_CHECK_TIMEOUT, data_src.is_ready()).await {
        Ok(Ok(readiness)) => (
            StatusCode::OK,
            ReadyBody::Ok {
                records: readiness.records,
            },
        ),
        Ok(Err(e)) => {
            tracing::warn!("readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ReadyBody::Failure {
                    message: e.to_string(),
                },
            )
        }
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ReadyBody::Failure {
                message: "health check timed out".to_string(),
            },
        ),
    };

    (status, Json(body)).into_response()
}
