pub mod conversions;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /conversions                                     submit a drawing (POST)
/// /conversions/{id}                                recorded conversion (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/conversions", conversions::router())
}
