//! Signed session tokens
//!
//! A session token is a self-contained signed artifact: three base64url
//! segments (header, payload, HMAC-SHA256 tag) joined by `.`. The format is
//! private — there is no algorithm negotiation, and the header is required
//! to match what [`encode`] produces byte-for-byte in meaning.
//!
//! Signature and expiry verification are independently toggleable: session
//! revocation has to read claims out of an expired-but-correctly-signed
//! token, while still rejecting forged ones.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::Result;

type HmacSha256 = Hmac<Sha256>;

const ALG: &str = "HS256";
const TYP: &str = "JWT";

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,

    #[serde(rename = "userId")]
    pub user_id: String,

    /// Issued-at, Unix seconds. Optional on decode for tolerance of tokens
    /// minted before the field existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiry, Unix seconds
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Which checks [`decode`] applies
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub verify_signature: bool,
    pub verify_expiry: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_signature: true,
            verify_expiry: true,
        }
    }
}

/// Encode and sign a session token with the server secret.
pub fn encode(claims: &SessionClaims, secret: &[u8]) -> Result<String> {
    let header = Header {
        alg: ALG.to_string(),
        typ: TYP.to_string(),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_string(&header)?);
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_string(claims)?);

    let message = format!("{}.{}", header_b64, payload_b64);
    let tag = mac(secret, message.as_bytes()).finalize().into_bytes();
    let sig_b64 = URL_SAFE_NO_PAD.encode(tag);

    Ok(format!("{}.{}", message, sig_b64))
}

/// Parse a session token, applying the selected checks.
///
/// Any failure — wrong segment count, malformed base64 or JSON, header
/// mismatch, bad signature, missing or mistyped claims, expired token —
/// collapses to `None`. Callers treat the token uniformly as unusable and
/// never learn why.
pub fn decode(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
    opts: DecodeOptions,
) -> Option<SessionClaims> {
    let token = token.trim();

    let mut parts = token.split('.');
    let header_b64 = parts.next()?;
    let payload_b64 = parts.next()?;
    let sig_b64 = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let header_bytes = URL_SAFE_NO_PAD.decode(header_b64).ok()?;
    let header: Header = serde_json::from_slice(&header_bytes).ok()?;
    if header.alg != ALG || header.typ != TYP {
        return None;
    }

    if opts.verify_signature {
        let sig = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
        let message = format!("{}.{}", header_b64, payload_b64);
        // Constant-time comparison; a length mismatch also rejects.
        mac(secret, message.as_bytes()).verify_slice(&sig).ok()?;
    }

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let claims: SessionClaims = serde_json::from_slice(&payload_bytes).ok()?;

    if opts.verify_expiry && claims.exp.saturating_mul(1000) <= now.timestamp_millis() {
        return None;
    }

    Some(claims)
}

fn mac(secret: &[u8], message: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac
}
