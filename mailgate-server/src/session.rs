//! Session issuance, resolution, and revocation
//!
//! Session tokens are stateless and self-verifying; the authority keeps
//! only the revocation set, which overrides otherwise-valid tokens. The
//! set is keyed by a digest of the full token text so raw tokens are never
//! retained server-side.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use mailgate_core::{derive_user_id, normalize_email, token, DecodeOptions, SessionClaims};

use crate::config::Config;
use crate::error::AuthError;
use crate::store::AuthStore;

/// A resolved session view. Reconstructed from token claims on every use,
/// never looked up.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionAuthority {
    store: Arc<AuthStore>,
    secret: Vec<u8>,
    session_ttl: Duration,
}

impl SessionAuthority {
    pub fn new(config: &Config, store: Arc<AuthStore>) -> Self {
        Self {
            store,
            secret: config.auth_secret.clone().into_bytes(),
            session_ttl: config.session_ttl,
        }
    }

    /// Mint a session for an email that just passed OTP verification.
    ///
    /// The only failure mode is a misconfigured codec, which is fatal for
    /// the deployment rather than something a caller can recover from.
    pub fn create_session(&self, email: &str) -> Result<Session, AuthError> {
        self.create_session_at(email, Utc::now())
    }

    pub fn create_session_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let user_id = derive_user_id(&email).to_string();
        let expires_at = now + self.session_ttl;

        let claims = SessionClaims {
            email: email.clone(),
            user_id: user_id.clone(),
            iat: Some(now.timestamp()),
            exp: expires_at.timestamp(),
        };
        let token = token::encode(&claims, &self.secret)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Session {
            token,
            email,
            user_id,
            issued_at: now,
            expires_at,
        })
    }

    /// Resolve a bearer token to its session view.
    ///
    /// Revocation is absolute: the digest check runs before any token
    /// content is trusted. Absence of a valid session is always `None`;
    /// the boundary layer picks the user-facing status.
    pub fn resolve(&self, token_text: &str) -> Option<Session> {
        self.resolve_at(token_text, Utc::now())
    }

    pub fn resolve_at(&self, token_text: &str, now: DateTime<Utc>) -> Option<Session> {
        self.store.prune_revoked(now);

        let token_text = token_text.trim();
        if token_text.is_empty() {
            return None;
        }
        if self.store.revoked.contains_key(&token_digest(token_text)) {
            return None;
        }

        let claims = token::decode(token_text, &self.secret, now, DecodeOptions::default())?;

        Some(Session {
            token: token_text.to_string(),
            email: claims.email,
            user_id: claims.user_id,
            issued_at: claims
                .iat
                .and_then(|s| DateTime::from_timestamp(s, 0))
                .unwrap_or(now),
            expires_at: DateTime::from_timestamp(claims.exp, 0)?,
        })
    }

    /// Revoke a presented token.
    ///
    /// Expiry is not checked: an already-expired but correctly-signed
    /// token can still be revoked explicitly. When the claims cannot be
    /// read the entry is stored with a conservative fallback expiry so a
    /// forged expiry cannot pin it forever. Idempotent.
    pub fn revoke(&self, token_text: &str) {
        self.revoke_at(token_text, Utc::now());
    }

    pub fn revoke_at(&self, token_text: &str, now: DateTime<Utc>) {
        self.store.prune_revoked(now);

        let token_text = token_text.trim();
        if token_text.is_empty() {
            return;
        }

        let opts = DecodeOptions {
            verify_signature: true,
            verify_expiry: false,
        };
        let claimed_exp = token::decode(token_text, &self.secret, now, opts)
            .and_then(|claims| DateTime::from_timestamp(claims.exp, 0));

        let expires_at = claimed_exp.unwrap_or(now + self.session_ttl);
        self.store
            .revoked
            .insert(token_digest(token_text), expires_at);
        tracing::info!("Session token revoked");
    }
}

/// SHA-256 of the full token text, hex-encoded. The revocation set stores
/// digests, never tokens.
fn token_digest(token_text: &str) -> String {
    let digest = Sha256::digest(token_text.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            port: 0,
            auth_secret: "unit-test-secret".to_string(),
            allowed_emails: Vec::new(),
            otp_ttl: Duration::seconds(600),
            otp_resend_cooldown: Duration::seconds(60),
            otp_max_attempts: 5,
            session_ttl: Duration::days(30),
            smtp: None,
        }
    }

    fn authority() -> (SessionAuthority, Arc<AuthStore>) {
        let store = Arc::new(AuthStore::new());
        (
            SessionAuthority::new(&test_config(), Arc::clone(&store)),
            store,
        )
    }

    #[test]
    fn test_create_and_resolve_round_trip() {
        let (authority, _) = authority();
        let now = Utc::now();

        let session = authority.create_session_at("alice@example.com", now).unwrap();
        let resolved = authority.resolve_at(&session.token, now).unwrap();

        assert_eq!(resolved.email, "alice@example.com");
        assert_eq!(resolved.user_id, session.user_id);
        assert_eq!(
            resolved.user_id,
            derive_user_id("alice@example.com").to_string()
        );
    }

    #[test]
    fn test_resolve_rejects_expired_token() {
        let (authority, _) = authority();
        let now = Utc::now();

        let session = authority.create_session_at("alice@example.com", now).unwrap();
        let after_expiry = session.expires_at + Duration::seconds(1);

        assert!(authority.resolve_at(&session.token, after_expiry).is_none());
    }

    #[test]
    fn test_revoke_overrides_valid_token() {
        let (authority, _) = authority();
        let now = Utc::now();

        let session = authority.create_session_at("alice@example.com", now).unwrap();
        assert!(authority.resolve_at(&session.token, now).is_some());

        authority.revoke_at(&session.token, now);
        assert!(authority.resolve_at(&session.token, now).is_none());

        // Idempotent
        authority.revoke_at(&session.token, now);
        assert!(authority.resolve_at(&session.token, now).is_none());
    }

    #[test]
    fn test_revocation_only_covers_that_exact_token() {
        let (authority, _) = authority();
        let now = Utc::now();

        let alice = authority.create_session_at("alice@example.com", now).unwrap();
        let bob = authority.create_session_at("bob@example.com", now).unwrap();

        authority.revoke_at(&alice.token, now);

        assert!(authority.resolve_at(&alice.token, now).is_none());
        assert!(authority.resolve_at(&bob.token, now).is_some());
    }

    #[test]
    fn test_revoking_expired_token_records_its_own_expiry() {
        let (authority, store) = authority();
        let now = Utc::now();

        let session = authority.create_session_at("alice@example.com", now).unwrap();
        let after_expiry = session.expires_at + Duration::seconds(1);

        // Signature still verifies, expiry is ignored for revocation
        authority.revoke_at(&session.token, after_expiry);

        // The entry expired the moment it was written, so the next prune
        // clears it; the token stays rejected by its own expiry.
        authority.resolve_at("anything", after_expiry + Duration::seconds(1));
        assert!(store.revoked.is_empty());
        assert!(authority.resolve_at(&session.token, after_expiry).is_none());
    }

    #[test]
    fn test_revoking_garbage_uses_fallback_expiry() {
        let (authority, store) = authority();
        let now = Utc::now();

        authority.revoke_at("not-a-token", now);

        let entry = store.revoked.get(&token_digest("not-a-token")).unwrap();
        assert_eq!(*entry.value(), now + Duration::days(30));
    }

    #[test]
    fn test_resolve_collapses_malformed_tokens() {
        let (authority, _) = authority();
        let now = Utc::now();

        assert!(authority.resolve_at("", now).is_none());
        assert!(authority.resolve_at("   ", now).is_none());
        assert!(authority.resolve_at("a.b", now).is_none());
        assert!(authority.resolve_at("a.b.c.d", now).is_none());
    }

    #[test]
    fn test_resolve_rejects_token_signed_with_other_secret() {
        let (authority, _) = authority();
        let now = Utc::now();

        let mut other = test_config();
        other.auth_secret = "different-secret".to_string();
        let foreign = SessionAuthority::new(&other, Arc::new(AuthStore::new()));

        let session = foreign.create_session_at("alice@example.com", now).unwrap();
        assert!(authority.resolve_at(&session.token, now).is_none());
    }

    #[test]
    fn test_token_digest_is_hex_of_sha256() {
        let digest = token_digest("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
