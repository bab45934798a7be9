// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.

pub mod auth;
pub mod health;

use crate::error::AppError;
use crate::validation::ValidationError;
use axum::extract::rejection::JsonRejection;
use axum::Json;

/// Unwrap a JSON body, reporting unreadable bodies as invalid input.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ValidationError::Body(rejection.body_text()).into())
}
