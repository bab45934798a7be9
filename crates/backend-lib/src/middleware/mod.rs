// crates/backend-lib/src/middleware/mod.rs

//! Request middleware.

pub mod auth_gate;

pub use auth_gate::{bearer_token, require_auth, AuthUser};
