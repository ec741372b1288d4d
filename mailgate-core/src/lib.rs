//! Mailgate Core Library
//!
//! Primitives for email-gated sessions:
//! - A compact signed session-token format (construct, parse, verify)
//! - Deterministic derivation of a stable user id from an email address
//!
//! Everything in this crate is a pure function of its inputs; there is no
//! shared state and no I/O.

pub mod error;
pub mod identity;
pub mod token;

pub use error::Error;
pub use identity::{derive_user_id, normalize_email};
pub use token::{DecodeOptions, SessionClaims};

/// Result type for mailgate-core operations
pub type Result<T> = std::result::Result<T, Error>;
