//! Deterministic identity derivation
//!
//! Maps a normalized email address to a stable user id. The id is the first
//! 128 bits of a SHA-256 digest of the normalized email, stamped with the
//! UUID version-4 / RFC-4122 variant bits so it is shaped exactly like a
//! randomly generated UUID while being fully deterministic.

use sha2::{Digest, Sha256};
use uuid::{Builder, Uuid, Variant, Version};

/// Normalize an email for hashing and lookups: trim whitespace, lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Derive the stable user id for an email address.
///
/// Total function: same email (after normalization) always yields the same
/// id, across processes and restarts.
pub fn derive_user_id(email: &str) -> Uuid {
    let digest = Sha256::digest(normalize_email(email).as_bytes());

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);

    Builder::from_bytes(bytes)
        .with_version(Version::Random)
        .with_variant(Variant::RFC4122)
        .into_uuid()
}
