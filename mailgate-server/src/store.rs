//! In-memory auth state
//!
//! One store object owns every piece of mutable state in the subsystem:
//! live OTP challenges, resend throttles, and the token revocation set. It
//! is constructed once and handed to the challenge manager and session
//! authority, which keeps tests isolated and leaves room to put a different
//! store behind the same seam later.
//!
//! The maps are sharded (`DashMap`): operations for different emails do not
//! contend on one lock, while mutations for a single email are serialized
//! by the entry guards the managers take.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// A live one-time-passcode challenge. At most one exists per email.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub email: String,
    /// Keyed digest of the code; the code itself is never stored
    pub code_hash: [u8; 32],
    pub attempts: u32,
    pub expires_at: DateTime<Utc>,
}

/// Process-local store for challenges, throttles, and revocations
#[derive(Default)]
pub struct AuthStore {
    pub(crate) challenges: DashMap<String, OtpChallenge>,
    pub(crate) last_issued: DashMap<String, DateTime<Utc>>,
    pub(crate) revoked: DashMap<String, DateTime<Utc>>,
}

impl AuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop challenges whose expiry has passed, across all emails, and
    /// throttle records old enough that the cooldown can no longer apply.
    /// Best-effort: expired entries are also rejected on use even if a
    /// prune has not run yet.
    pub(crate) fn prune_challenges(&self, now: DateTime<Utc>, throttle_horizon: Duration) {
        self.challenges.retain(|_, c| c.expires_at > now);
        self.last_issued.retain(|_, at| now - *at < throttle_horizon);
    }

    /// Drop revocation entries past their expiry. After that point the
    /// token they covered is rejected by its own expiry check, so keeping
    /// the digest serves nothing.
    pub(crate) fn prune_revoked(&self, now: DateTime<Utc>) {
        self.revoked.retain(|_, expires_at| *expires_at > now);
    }

    /// Number of live challenges (test observability)
    pub fn challenge_count(&self) -> usize {
        self.challenges.len()
    }
}
