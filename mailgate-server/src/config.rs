//! Service configuration
//!
//! All values come from the environment. A missing or empty signing secret
//! and malformed numeric values are startup-time fatal, never per-request
//! errors.

use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Duration;

use mailgate_core::normalize_email;

use crate::email::SmtpConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Server-held secret: signs session tokens and keys the OTP digests
    pub auth_secret: String,

    /// Normalized allow-list; empty means every email is allowed
    pub allowed_emails: Vec<String>,

    /// How long an issued passcode stays valid
    pub otp_ttl: Duration,

    /// Minimum gap between passcode issuances for one email
    pub otp_resend_cooldown: Duration,

    /// Verification attempts before a challenge is destroyed
    pub otp_max_attempts: u32,

    /// How long a session token stays valid
    pub session_ttl: Duration,

    /// SMTP configuration; `None` falls back to the console sender
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let auth_secret = std::env::var("AUTH_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .context("AUTH_SECRET must be set to a non-empty signing secret")?;

        let allowed_emails = std::env::var("ALLOWED_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(normalize_email)
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            port: env_parse("PORT", 4000)?,
            auth_secret,
            allowed_emails,
            otp_ttl: env_seconds("OTP_TTL_SECONDS", 600)?,
            otp_resend_cooldown: env_seconds("OTP_RESEND_COOLDOWN_SECONDS", 60)?,
            otp_max_attempts: env_parse("OTP_MAX_ATTEMPTS", 5)?,
            session_ttl: env_seconds("SESSION_TTL_SECONDS", 60 * 60 * 24 * 30)?,
            smtp: SmtpConfig::from_env(),
        })
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

fn env_seconds(key: &str, default: i64) -> Result<Duration> {
    let seconds: i64 = env_parse(key, default)?;
    if seconds <= 0 {
        bail!("invalid {}: must be a positive number of seconds", key);
    }
    Ok(Duration::seconds(seconds))
}
