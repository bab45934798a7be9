// ============================
// crates/backend-lib/src/middleware/auth_gate.rs
// ============================
//! Bearer-token gate for protected routes.
//!
//! The gate verifies the access token statelessly and stores the proven
//! [`Identity`] in the request extensions, where [`AuthUser`] picks it up.
use crate::auth::Identity;
use crate::error::AppError;
use crate::metrics::GATE_REJECTED;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware: reject the request unless it carries a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match bearer_token(request.headers()) {
        Some(token) => state.verifier.verify(token),
        None => Err(AppError::Unauthorized),
    }
    .inspect_err(|_| counter!(GATE_REJECTED).increment(1))?;

    tracing::debug!(user_id = %identity.user_id, "request authorized");
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Extractor for the identity established by [`require_auth`].
///
/// Used outside the gate it rejects with `Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SigningKey, TokenIssuer};
    use crate::clock::SystemClock;
    use crate::config::Settings;
    use crate::store::FlatFileStore;
    use axum::{
        body::Body,
        http::{HeaderValue, Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn state() -> Arc<AppState> {
        let settings = Settings::for_tests();
        Arc::new(
            AppState::from_store(FlatFileStore::in_memory(), Arc::new(SystemClock), settings)
                .unwrap(),
        )
    }

    fn gated(state: Arc<AppState>) -> Router {
        async fn whoami(AuthUser(identity): AuthUser) -> String {
            identity.username
        }

        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    async fn call(state: Arc<AppState>, authorization: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = gated(state)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    fn token_for(state: &AppState, issued_at: chrono::DateTime<Utc>) -> String {
        let key = SigningKey::new(&state.settings.auth.jwt_secret);
        TokenIssuer::new(&key)
            .issue(Uuid::new_v4(), "alice", issued_at)
            .unwrap()
            .access_token
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn valid_token_passes_with_identity() {
        let state = state();
        let token = token_for(&state, Utc::now());

        let response = gated(state)
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"alice");
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_unauthorized() {
        let state = state();
        assert_eq!(call(state.clone(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(call(state.clone(), Some("Token abc")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(call(state, Some("Bearer")).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_or_garbage_token_is_unauthorized() {
        let state = state();
        let expired = token_for(&state, Utc::now() - Duration::hours(1));

        assert_eq!(
            call(state.clone(), Some(&format!("Bearer {expired}"))).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(state, Some("Bearer not-a-token")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn extractor_without_gate_rejects() {
        let state = state();
        let token = token_for(&state, Utc::now());

        async fn whoami(AuthUser(identity): AuthUser) -> String {
            identity.username
        }
        let app = Router::new().route("/whoami", get(whoami));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
