//! Shared response envelope types for API handlers.
//!
//! Record lookups use a `{ "data": ... }` envelope. Conversion outcomes are
//! returned bare, in the shape the chat client expects.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
