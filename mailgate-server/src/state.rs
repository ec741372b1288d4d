//! Shared application state

use std::sync::Arc;

use chrono::Duration;

use crate::config::Config;
use crate::email::EmailSender;
use crate::otp::ChallengeManager;
use crate::session::SessionAuthority;
use crate::store::AuthStore;

/// State shared across request handlers. The challenge manager and session
/// authority are built over one injected [`AuthStore`].
pub struct AppState<E> {
    pub otp: ChallengeManager,
    pub sessions: SessionAuthority,
    pub email_sender: E,
    pub otp_ttl: Duration,
}

impl<E: EmailSender> AppState<E> {
    pub fn new(config: &Config, email_sender: E) -> Self {
        let store = Arc::new(AuthStore::new());
        Self {
            otp: ChallengeManager::new(config, Arc::clone(&store)),
            sessions: SessionAuthority::new(config, store),
            email_sender,
            otp_ttl: config.otp_ttl,
        }
    }
}
