//! Console-based email sender for development

use super::EmailSender;

/// Email sender that logs to console (for development)
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailSender for ConsoleEmailSender {
    fn send_passcode(&self, email: &str, code: &str, ttl_seconds: u64) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  LOGIN CODE FOR: {}", email);
        println!("  CODE: {}", code);
        println!("  VALID FOR: {} minutes", ttl_seconds / 60);
        println!("========================================");
        println!();

        tracing::info!(email = %email, "Login code sent to console");

        Ok(())
    }
}
