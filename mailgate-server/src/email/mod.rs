//! Email sending abstractions

pub mod console;
pub mod smtp;

pub use console::ConsoleEmailSender;
pub use smtp::{SmtpConfig, SmtpEmailSender};

/// Trait for delivering login passcodes
///
/// Delivery failure propagates to the issuance caller; a code the user
/// never receives is useless, and the subsystem does not retry.
pub trait EmailSender: Send + Sync {
    /// Send a passcode to an email address. `ttl_seconds` is how long the
    /// code stays valid, for the message text.
    fn send_passcode(&self, email: &str, code: &str, ttl_seconds: u64) -> Result<(), String>;
}

/// Allow using Box<dyn EmailSender> as an EmailSender
impl EmailSender for Box<dyn EmailSender> {
    fn send_passcode(&self, email: &str, code: &str, ttl_seconds: u64) -> Result<(), String> {
        (**self).send_passcode(email, code, ttl_seconds)
    }
}
