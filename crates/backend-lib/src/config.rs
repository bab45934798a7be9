// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Layering: built-in defaults, then a TOML file, then `TOWERNOTES_*`
//! environment variables (`__` separates nested keys, e.g.
//! `TOWERNOTES_AUTH__JWT_SECRET`).
use crate::auth::{SigningKey, DEFAULT_LOG_N};
use chrono::Duration;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
/// Environment variable prefix
pub const ENV_PREFIX: &str = "TOWERNOTES_";
/// Shortest accepted HMAC secret
pub const MIN_SECRET_BYTES: usize = 32;

/// Upper bound on token lifetimes (about a century)
const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Directory holding the auth store snapshot
    pub data_dir: PathBuf,
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    pub auth: AuthSettings,
    pub session: SessionSettings,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC secret for access tokens. Required; there is no usable default.
    pub jwt_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    /// scrypt work factor (log2 N)
    pub scrypt_log_n: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Period of the expired-session sweep; 0 disables it.
    pub sweep_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_json: false,
            auth: AuthSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
            scrypt_log_n: DEFAULT_LOG_N,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("auth", &self.auth)
            .field("session", &self.session)
            .finish()
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("scrypt_log_n", &self.scrypt_log_n)
            .finish()
    }
}

impl Settings {
    /// Load from `config.toml` in the working directory (if present) and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from an explicit TOML file (missing files are skipped) and the
    /// environment, then validate.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(path.as_ref())
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Provider stack without extraction, for callers that add overrides.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_BYTES} bytes"
            )));
        }
        if self.auth.access_ttl_secs == 0 || self.auth.refresh_ttl_secs == 0 {
            return Err(ConfigError::Invalid("token lifetimes must be non-zero".into()));
        }
        if self.auth.access_ttl_secs >= self.auth.refresh_ttl_secs {
            return Err(ConfigError::Invalid(
                "auth.access_ttl_secs must be shorter than auth.refresh_ttl_secs".into(),
            ));
        }
        if self.auth.refresh_ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::Invalid("auth.refresh_ttl_secs is too large".into()));
        }
        if !(1..=20).contains(&self.auth.scrypt_log_n) {
            return Err(ConfigError::Invalid(
                "auth.scrypt_log_n must be between 1 and 20".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log_level {:?}",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn signing_key(&self) -> SigningKey {
        SigningKey::new(&self.auth.jwt_secret)
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(clamp_secs(self.auth.access_ttl_secs))
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(clamp_secs(self.auth.refresh_ttl_secs))
    }

    /// `None` when the background sweep is disabled
    pub fn sweep_interval(&self) -> Option<std::time::Duration> {
        (self.session.sweep_interval_secs > 0)
            .then(|| std::time::Duration::from_secs(self.session.sweep_interval_secs))
    }

    /// Valid settings with a fixed secret and a cheap hasher.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            auth: AuthSettings {
                jwt_secret: "unit-test-secret-0123456789abcdef".to_string(),
                scrypt_log_n: 4,
                ..AuthSettings::default()
            },
            ..Settings::default()
        }
    }
}

fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs.min(MAX_TTL_SECS)).unwrap_or(i64::MAX / 1000)
}
