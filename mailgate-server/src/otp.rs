//! OTP challenge management
//!
//! Issues, rate-limits, and verifies one-time passcodes per email. All
//! state lives in the injected [`AuthStore`]; only a keyed digest of each
//! code is retained, never the code itself. Every public operation prunes
//! expired challenges first, which bounds memory without a background task.
//!
//! Public operations come in pairs: a convenience form that reads the wall
//! clock and a time-explicit `_at` form, so cooldown and expiry behavior is
//! testable without waiting.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::Rng;
use sha2::Sha256;

use mailgate_core::normalize_email;

use crate::config::Config;
use crate::error::AuthError;
use crate::store::{AuthStore, OtpChallenge};

type HmacSha256 = Hmac<Sha256>;

/// A freshly issued challenge. The code is returned exactly once, for
/// out-of-band delivery; it is not recoverable afterwards.
#[derive(Debug)]
pub struct IssuedChallenge {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

pub struct ChallengeManager {
    store: Arc<AuthStore>,
    secret: Vec<u8>,
    allowed_emails: Vec<String>,
    ttl: Duration,
    resend_cooldown: Duration,
    max_attempts: u32,
}

impl ChallengeManager {
    pub fn new(config: &Config, store: Arc<AuthStore>) -> Self {
        Self {
            store,
            secret: config.auth_secret.clone().into_bytes(),
            allowed_emails: config.allowed_emails.clone(),
            ttl: config.otp_ttl,
            resend_cooldown: config.otp_resend_cooldown,
            max_attempts: config.otp_max_attempts,
        }
    }

    /// Issue a new challenge for an email, replacing any previous one.
    pub fn issue(&self, email: &str) -> Result<IssuedChallenge, AuthError> {
        self.issue_at(email, Utc::now())
    }

    pub fn issue_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedChallenge, AuthError> {
        self.store.prune_challenges(now, self.resend_cooldown);

        let email = normalize_email(email);
        self.check_allowed(&email)?;

        // The throttle entry guard is held across the whole issuance, so
        // two concurrent requests for one email cannot both pass the
        // cooldown check.
        let mut last_issued = self
            .store
            .last_issued
            .entry(email.clone())
            .or_insert(DateTime::UNIX_EPOCH);
        if now - *last_issued < self.resend_cooldown {
            tracing::warn!(email = %email, "Passcode resend throttled");
            return Err(AuthError::RateLimited);
        }

        let code = generate_code();
        let expires_at = now + self.ttl;
        self.store.challenges.insert(
            email.clone(),
            OtpChallenge {
                email: email.clone(),
                code_hash: self.code_hash(&email, &code),
                attempts: 0,
                expires_at,
            },
        );
        *last_issued = now;
        drop(last_issued);

        Ok(IssuedChallenge {
            email,
            code,
            expires_at,
        })
    }

    /// Verify a submitted code and consume the challenge on success.
    ///
    /// The attempt is spent before correctness is considered: once the
    /// budget is exhausted the call fails closed even if this submission
    /// carries the correct code.
    pub fn verify_and_consume(&self, email: &str, code: &str) -> Result<(), AuthError> {
        self.verify_and_consume_at(email, code, Utc::now())
    }

    pub fn verify_and_consume_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.store.prune_challenges(now, self.resend_cooldown);

        let email = normalize_email(email);
        self.check_allowed(&email)?;

        let submitted = self.code_mac(&email, code.trim());

        match self.store.challenges.entry(email.clone()) {
            Entry::Vacant(_) => Err(AuthError::NoActiveChallenge),
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at <= now {
                    occupied.remove();
                    return Err(AuthError::ChallengeExpired);
                }

                let challenge = occupied.get_mut();
                challenge.attempts += 1;
                if challenge.attempts > self.max_attempts {
                    occupied.remove();
                    tracing::warn!(email = %email, "Challenge destroyed after too many attempts");
                    return Err(AuthError::TooManyAttempts);
                }

                // Constant-time comparison of keyed digests
                if submitted.verify_slice(&occupied.get().code_hash).is_err() {
                    return Err(AuthError::InvalidCode);
                }

                occupied.remove();
                Ok(())
            }
        }
    }

    /// Allow-list check on a normalized email. An empty list allows all.
    fn check_allowed(&self, email: &str) -> Result<(), AuthError> {
        if self.allowed_emails.is_empty() || self.allowed_emails.iter().any(|e| e == email) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    fn code_mac(&self, email: &str, code: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(email.as_bytes());
        mac.update(b":");
        mac.update(code.as_bytes());
        mac
    }

    /// Keyed digest of a code, salted with the email and server secret
    fn code_hash(&self, email: &str, code: &str) -> [u8; 32] {
        self.code_mac(email, code).finalize().into_bytes().into()
    }
}

/// Uniform 6-digit code from the OS generator; leading zeros survive as a
/// zero-padded string.
fn generate_code() -> String {
    let n: u32 = OsRng.gen_range(0..1_000_000);
    format!("{:06}", n)
}
