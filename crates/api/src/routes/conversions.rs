//! Route definitions for conversion jobs.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::conversions;
use crate::state::AppState;

/// Routes mounted at `/conversions`.
///
/// ```text
/// POST   /                    create_conversion
/// GET    /{id}                get_conversion
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(conversions::create_conversion))
        .route("/{id}", get(conversions::get_conversion))
}
