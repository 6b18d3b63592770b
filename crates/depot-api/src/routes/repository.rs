//! Fallback handler for the repository tree.

use axum::extract::{Request, State};
use axum::response::Response;

use crate::state::AppState;

/// Any method, any path outside `/-/`.
pub async fn serve(State(state): State<AppState>, request: Request) -> Response {
    state.controller.handle(request).await
}
