use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod fetch;
pub mod upload;

// Re-export for convenience
pub use fetch::{FetchQuery, FetchRequest, FetchedFile};
pub use upload::{UploadRequest, UploadResponse};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(upload::handler))
        .route("/:file_key", get(fetch::handler))
        .with_state(state)
}
