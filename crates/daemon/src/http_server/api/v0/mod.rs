use axum::Router;

pub mod files;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/files", files::router(state.clone()))
        .with_state(state)
}
