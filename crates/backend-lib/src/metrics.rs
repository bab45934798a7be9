// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_REGISTERED: &str = "auth.register";
pub const LOGIN_SUCCEEDED: &str = "auth.login.success";
pub const LOGIN_FAILED: &str = "auth.login.failure";
pub const REFRESH_ROTATED: &str = "auth.refresh.rotated";
pub const REFRESH_REJECTED: &str = "auth.refresh.rejected";
pub const LOGOUT: &str = "auth.logout";
pub const GATE_REJECTED: &str = "auth.gate.rejected";
pub const SESSIONS_SWEPT: &str = "session.swept";
