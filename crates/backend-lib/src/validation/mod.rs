// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request shape validation. Runs before any store access.

use thiserror::Error;

// Common validation constants
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    Username(String),

    #[error("Invalid password: {0}")]
    Password(String),

    #[error("Invalid refresh token: {0}")]
    RefreshToken(String),

    #[error("Malformed request body: {0}")]
    Body(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a username (3 to 50 characters)
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    // Count characters, not bytes
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(ValidationError::Username(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }

    Ok(username)
}

/// Validate a password chosen at registration
pub fn validate_new_password(password: &str) -> ValidationResult<&str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::Password(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password)
}

/// Validate a password presented at login. Only emptiness is checked here;
/// older accounts may predate the current length rule.
pub fn validate_login_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::Password(
            "Password must not be empty".to_string(),
        ));
    }

    Ok(password)
}

/// Validate a presented refresh token string
pub fn validate_refresh_token(token: &str) -> ValidationResult<&str> {
    if token.is_empty() {
        return Err(ValidationError::RefreshToken(
            "Refresh token must not be empty".to_string(),
        ));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("bob").is_ok());
        assert!(validate_username(&"a".repeat(50)).is_ok());

        assert!(validate_username("ab").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn username_length_counts_characters() {
        // 3 characters, 6 bytes
        assert!(validate_username("äöü").is_ok());
        // 50 characters, 100 bytes
        assert!(validate_username(&"é".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_passwords() {
        assert!(validate_new_password("secret").is_ok());
        assert!(validate_new_password("12345").is_err());

        assert!(validate_login_password("x").is_ok());
        assert_eq!(
            validate_login_password(""),
            Err(ValidationError::Password(
                "Password must not be empty".to_string()
            ))
        );
    }

    #[test]
    fn test_validate_refresh_token() {
        assert!(validate_refresh_token("abc").is_ok());
        assert!(validate_refresh_token("").is_err());
    }
}
