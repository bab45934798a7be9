// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Register, login, refresh and logout endpoints.
//!
//! Handlers only decode bodies and pick status codes; every decision is
//! made by the [`AuthService`](crate::auth::AuthService).
use super::json_body;
use crate::{error::AppError, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use towernotes_common::{CredentialsRequest, MessageResponse, RefreshRequest, TokenPair};

pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenPair>), AppError> {
    let request = json_body(body)?;
    let pair = state.auth.register(&request.username, &request.password).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let request = json_body(body)?;
    let pair = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(pair))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let request = json_body(body)?;
    let pair = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(pair))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let request = json_body(body)?;
    state.auth.logout(&request.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}
