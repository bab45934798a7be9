// ============================
// crates/backend-lib/src/handlers/health.rs
// ============================
use crate::middleware::AuthUser;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use towernotes_common::UserIdentity;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub user: UserIdentity,
}

/// Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Echo the identity the gate attached to the request.
pub async fn protected(AuthUser(identity): AuthUser) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        user: identity.into(),
    })
}
