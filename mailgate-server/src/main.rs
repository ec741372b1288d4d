//! Mailgate Server
//!
//! Email-gated authentication service: one-time passcodes by email,
//! exchanged for signed stateless session tokens with explicit revocation.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailgate_server::{routes, AppState, Config, ConsoleEmailSender, EmailSender, SmtpEmailSender};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailgate_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; a bad secret or malformed value aborts here
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        allowed_emails = config.allowed_emails.len(),
        otp_ttl_seconds = config.otp_ttl.num_seconds(),
        session_ttl_seconds = config.session_ttl.num_seconds(),
        "Loaded configuration"
    );

    // Pick the email transport
    let email_sender: Box<dyn EmailSender> = match config.smtp.clone() {
        Some(smtp) => Box::new(SmtpEmailSender::new(smtp).map_err(anyhow::Error::msg)?),
        None => {
            tracing::warn!("SMTP not configured; login codes will be printed to the console");
            Box::new(ConsoleEmailSender::new())
        }
    };

    // Create app state and router
    let state = Arc::new(AppState::new(&config, email_sender));
    let app = routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Mailgate listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
