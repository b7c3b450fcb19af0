//! Gateway configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server
//! starts.
//!
//! ## Required Variables
//!
//! - `JWT_SECRET` - HS256 secret for bearer verification (min 16 bytes)
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:3000`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `MAX_BODY_BYTES` - Request body cap (default: 65536)
//! - `RATE_LOGIN_WINDOW_SECS` / `RATE_LOGIN_MAX` - login budget (60s / 10)
//! - `RATE_OTP_WINDOW_SECS` / `RATE_OTP_MAX` - OTP budget (60s / 5)
//! - `RATE_API_WINDOW_SECS` / `RATE_API_MAX` - generic budget (60s / 120)

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::gateway::rate_limit::{RateBudget, RateBudgets};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
    /// HS256 signing secret bearer tokens are verified against.
    pub jwt_secret: String,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    pub rate_login_window_secs: u64,
    pub rate_login_max: u32,
    pub rate_otp_window_secs: u64,
    pub rate_otp_max: u32,
    pub rate_api_window_secs: u64,
    pub rate_api_max: u32,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is missing.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        Ok(Self {
            listen_addr: env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            jwt_secret,
            max_body_bytes: env_parsed("MAX_BODY_BYTES", 65_536),
            rate_login_window_secs: env_parsed("RATE_LOGIN_WINDOW_SECS", 60),
            rate_login_max: env_parsed("RATE_LOGIN_MAX", 10),
            rate_otp_window_secs: env_parsed("RATE_OTP_WINDOW_SECS", 60),
            rate_otp_max: env_parsed("RATE_OTP_MAX", 5),
            rate_api_window_secs: env_parsed("RATE_API_WINDOW_SECS", 60),
            rate_api_max: env_parsed("RATE_API_MAX", 120),
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is shorter than 16 bytes
    /// - `LOG_FORMAT` is not `text` or `json`
    /// - `LISTEN` is not `host:port`
    /// - any rate budget or the body cap is zero
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 16 {
            anyhow::bail!("JWT_SECRET must be at least 16 bytes");
        }

        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be greater than 0");
        }

        for (name, value) in [
            ("RATE_LOGIN_WINDOW_SECS", self.rate_login_window_secs),
            ("RATE_OTP_WINDOW_SECS", self.rate_otp_window_secs),
            ("RATE_API_WINDOW_SECS", self.rate_api_window_secs),
        ] {
            if value == 0 {
                anyhow::bail!("{name} must be greater than 0");
            }
        }

        for (name, value) in [
            ("RATE_LOGIN_MAX", self.rate_login_max),
            ("RATE_OTP_MAX", self.rate_otp_max),
            ("RATE_API_MAX", self.rate_api_max),
        ] {
            if value == 0 {
                anyhow::bail!("{name} must be greater than 0");
            }
        }

        Ok(())
    }

    /// Window budgets in the limiter's terms.
    pub fn rate_budgets(&self) -> RateBudgets {
        RateBudgets {
            login: RateBudget {
                window: Duration::from_secs(self.rate_login_window_secs),
                max_requests: self.rate_login_max,
            },
            otp: RateBudget {
                window: Duration::from_secs(self.rate_otp_window_secs),
                max_requests: self.rate_otp_max,
            },
            api: RateBudget {
                window: Duration::from_secs(self.rate_api_window_secs),
                max_requests: self.rate_api_max,
            },
        }
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!("  JWT secret: {}", mask_secret(&self.jwt_secret));
        tracing::info!("  Max body bytes: {}", self.max_body_bytes);
        tracing::info!(
            "  Rate budgets: login {}/{}s, otp {}/{}s, api {}/{}s",
            self.rate_login_max,
            self.rate_login_window_secs,
            self.rate_otp_max,
            self.rate_otp_window_secs,
            self.rate_api_max,
            self.rate_api_window_secs,
        );
    }
}

/// Masks a secret for logging, keeping only its length visible.
fn mask_secret(secret: &str) -> String {
    format!("*** ({} bytes)", secret.len())
}

/// Loads and validates configuration from environment variables.
///
/// # Note
///
/// Expects environment variables to be already loaded (e.g., via
/// `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn base_config() -> Config {
        Config {
            listen_addr: "0.0.0.0:3000".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            jwt_secret: "a-long-enough-test-secret".to_string(),
            max_body_bytes: 65_536,
            rate_login_window_secs: 60,
            rate_login_max: 10,
            rate_otp_window_secs: 60,
            rate_otp_max: 5,
            rate_api_window_secs: 60,
            rate_api_max: 120,
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = base_config();
        assert!(config.validate().is_ok());

        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
        config.jwt_secret = "a-long-enough-test-secret".to_string();

        config.log_format = "invalid".to_string();
        assert!(config.validate().is_err());
        config.log_format = "json".to_string();
        assert!(config.validate().is_ok());

        config.listen_addr = "3000".to_string();
        assert!(config.validate().is_err());
        config.listen_addr = "0.0.0.0:3000".to_string();

        config.rate_login_max = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mask_secret_hides_content() {
        let masked = mask_secret("super-secret-value");
        assert!(!masked.contains("super"));
        assert!(masked.contains("18"));
    }

    #[test]
    #[serial]
    fn test_from_env_requires_secret() {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::remove_var("JWT_SECRET");
        }
        assert!(Config::from_env().is_err());

        unsafe {
            env::set_var("JWT_SECRET", "a-long-enough-test-secret");
            env::set_var("RATE_LOGIN_MAX", "3");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.rate_login_max, 3);
        assert_eq!(config.rate_otp_max, 5);

        // Cleanup
        unsafe {
            env::remove_var("JWT_SECRET");
            env::remove_var("RATE_LOGIN_MAX");
        }
    }
}
