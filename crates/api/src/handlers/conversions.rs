//! Handlers for conversion jobs.
//!
//! `POST /conversions` runs one job end to end and answers with its
//! outcome. The job runs on its own task, so a client that disconnects
//! mid-request never interrupts the engine race or the cleanup.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use cad3d_core::error::CoreError;
use cad3d_core::outcome::JobOutcome;
use cad3d_core::types::DbId;
use cad3d_db::models::conversion::Conversion;
use cad3d_db::repositories::ConversionRepo;
use cad3d_pipeline::ConversionRequest;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /conversions
// ---------------------------------------------------------------------------

/// Submit a drawing for conversion and wait for the outcome.
///
/// 200 with a success outcome, 500 with a failure outcome. A body that is
/// not a valid request is answered 400 (413 when oversized) in the same
/// outcome shape.
pub async fn create_conversion(
    State(state): State<AppState>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected conversion request body");
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return (status, Json(JobOutcome::failed(rejection.body_text())));
        }
    };

    let handle = state.orchestrator.submit(request);
    let outcome = handle.outcome().await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome))
}

// ---------------------------------------------------------------------------
// GET /conversions/{id}
// ---------------------------------------------------------------------------

/// Fetch a recorded conversion by its `modelId`.
pub async fn get_conversion(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Conversion>>> {
    let pool = state.require_pool()?;
    let conversion = ConversionRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Conversion",
                id: id.to_string(),
            })
        })?;
    Ok(Json(DataResponse { data: conversion }))
}
