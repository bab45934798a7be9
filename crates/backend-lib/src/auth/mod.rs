// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod jwt;
pub mod password;
mod service;
mod service_impl;

pub use jwt::{
    AccessVerifier, Claims, Identity, IssuedTokens, SigningKey, TokenError, TokenIssuer,
    ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL,
};
pub use password::{HashError, PasswordHashing, ScryptHasher, DEFAULT_LOG_N};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
