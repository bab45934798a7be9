// ============================
// crates/cli/src/lib.rs
// ============================
//! Command-line client for the towernotes auth server.
//!
//! Talks to the auth endpoints over HTTP and keeps the issued token pair in
//! the local credential file between invocations.

pub mod api;
pub mod session;

pub use api::{AuthApi, ClientError, HttpAuthApi, DEFAULT_SERVER_URL};
pub use session::CliAuth;
