// ============================
// crates/backend-lib/src/auth/jwt.rs
// ============================
//! Access-token issuance and verification (HS256).
//!
//! The issuer produces the access/refresh pair for a user at a given instant.
//! It touches no storage; persisting the refresh half is the caller's job.
//! Expiry of access tokens is judged against the same injected clock that
//! stamps them.
use crate::clock::Clock;
use crate::error::AppError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use thiserror::Error;
use towernotes_common::{TokenPair, UserIdentity};
use uuid::Uuid;

/// Access token lifetime
pub const ACCESS_TOKEN_TTL: Duration = Duration::minutes(15);
/// Refresh token lifetime
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(7);

/// Entropy of a refresh token (256 bits)
const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("failed to sign access token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Process-wide HMAC secret shared by issuer and verifier
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(secret.as_ref().to_vec())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Access token payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    /// Makes every issued token distinct, even within the same second
    pub jti: Uuid,
}

/// Identity proven by a valid access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl From<Identity> for UserIdentity {
    fn from(identity: Identity) -> Self {
        UserIdentity {
            user_id: identity.user_id.to_string(),
            username: identity.username,
        }
    }
}

/// Output of [`TokenIssuer::issue`]
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

impl IssuedTokens {
    pub fn pair(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(key: &SigningKey) -> Self {
        Self::with_ttls(key, ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL)
    }

    pub fn with_ttls(key: &SigningKey, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&key.0),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, TokenError> {
        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            jti: Uuid::new_v4(),
        };
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token: new_refresh_token(),
            refresh_expires_at: now + self.refresh_ttl,
        })
    }
}

/// Opaque refresh token: random bytes, URL-safe base64 without padding.
/// Carries no claims; it is only a lookup key.
fn new_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Clone)]
pub struct AccessVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl AccessVerifier {
    pub fn new(key: &SigningKey, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is still required to be present, but compared below
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(&key.0),
            validation,
            clock,
        }
    }

    /// Check signature and expiry. Forged, tampered and expired tokens all
    /// fail the same way.
    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            tracing::debug!(kind = ?err.kind(), "access token rejected");
            AppError::Unauthorized
        })?;

        if data.claims.exp <= self.clock.now().timestamp() {
            tracing::debug!("access token expired");
            return Err(AppError::Unauthorized);
        }

        Ok(Identity {
            user_id: data.claims.user_id,
            username: data.claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use std::collections::HashSet;

    const SECRET: &str = "test-signing-secret-with-enough-bytes";

    fn setup() -> (TokenIssuer, AccessVerifier) {
        let key = SigningKey::new(SECRET);
        (
            TokenIssuer::new(&key),
            AccessVerifier::new(&key, Arc::new(SystemClock)),
        )
    }

    #[test]
    fn issued_access_token_verifies() {
        let (issuer, verifier) = setup();
        let user_id = Uuid::new_v4();

        let tokens = issuer.issue(user_id, "alice", Utc::now()).unwrap();
        let identity = verifier.verify(&tokens.access_token).unwrap();

        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn issue_is_driven_by_the_given_instant() {
        let (issuer, _) = setup();
        let now = Utc::now();
        let tokens = issuer.issue(Uuid::new_v4(), "alice", now).unwrap();
        assert_eq!(tokens.refresh_expires_at, now + REFRESH_TOKEN_TTL);
    }

    #[test]
    fn pairs_are_never_repeated() {
        let (issuer, _) = setup();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let first = issuer.issue(user_id, "alice", now).unwrap();
        let second = issuer.issue(user_id, "alice", now).unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(first.access_token, second.access_token);
    }

    #[test]
    fn refresh_token_carries_no_claims() {
        let (issuer, verifier) = setup();
        let tokens = issuer.issue(Uuid::new_v4(), "alice", Utc::now()).unwrap();
        assert!(!tokens.refresh_token.contains('.'));
        assert!(verifier.verify(&tokens.refresh_token).is_err());
    }

    #[test]
    fn refresh_token_shape() {
        let token = new_refresh_token();
        // 32 bytes base64 without padding is 43 chars
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let tokens: HashSet<String> = (0..1000).map(|_| new_refresh_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn expiry_follows_the_injected_clock() {
        let key = SigningKey::new(SECRET);
        let issued_at = Utc::now() - Duration::days(3);
        let clock = Arc::new(ManualClock::new(issued_at));
        let issuer = TokenIssuer::new(&key);
        let verifier = AccessVerifier::new(&key, clock.clone());

        // Long expired by the wall clock, fresh by the injected one
        let tokens = issuer.issue(Uuid::new_v4(), "alice", issued_at).unwrap();
        assert!(verifier.verify(&tokens.access_token).is_ok());

        clock.advance(ACCESS_TOKEN_TTL - Duration::seconds(1));
        assert!(verifier.verify(&tokens.access_token).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(
            verifier.verify(&tokens.access_token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let (issuer, verifier) = setup();
        let issued_at = Utc::now() - Duration::hours(1);
        let tokens = issuer.issue(Uuid::new_v4(), "alice", issued_at).unwrap();

        assert!(matches!(
            verifier.verify(&tokens.access_token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn foreign_signature_is_unauthorized() {
        let (_, verifier) = setup();
        let forger = TokenIssuer::new(&SigningKey::new("some-other-secret-of-similar-size!!"));
        let tokens = forger.issue(Uuid::new_v4(), "mallory", Utc::now()).unwrap();

        assert!(matches!(
            verifier.verify(&tokens.access_token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn tampered_payload_is_unauthorized() {
        let (issuer, verifier) = setup();
        let tokens = issuer.issue(Uuid::new_v4(), "alice", Utc::now()).unwrap();
        let other = issuer.issue(Uuid::new_v4(), "mallory", Utc::now()).unwrap();

        // Splice mallory's payload onto alice's signature
        let alice: Vec<&str> = tokens.access_token.split('.').collect();
        let mallory: Vec<&str> = other.access_token.split('.').collect();
        let spliced = format!("{}.{}.{}", alice[0], mallory[1], alice[2]);

        assert!(verifier.verify(&spliced).is_err());
        assert!(verifier.verify("not-a-jwt").is_err());
    }

    #[test]
    fn signing_key_debug_is_redacted() {
        let shown = format!("{:?}", SigningKey::new(SECRET));
        assert!(!shown.contains(SECRET));
    }
}
