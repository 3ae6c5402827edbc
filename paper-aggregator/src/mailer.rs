use crate::config::EmailConfig;
use crate::types::{AggregatorError, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

/// Port that speaks TLS from the first byte; anything else upgrades with STARTTLS
const IMPLICIT_TLS_PORT: u16 = 465;

/// Build the plain-text report mail for every configured recipient.
pub fn build_message(config: &EmailConfig, subject: &str, body: String) -> Result<Message> {
    let sender = config
        .sender()
        .ok_or_else(|| AggregatorError::MissingSetting("email.from".to_string()))?;

    let mut builder = Message::builder()
        .from(sender.parse::<Mailbox>().map_err(|e| email_error("sender", e))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN);

    for recipient in &config.to {
        builder = builder.to(recipient.parse::<Mailbox>().map_err(|e| email_error("recipient", e))?);
    }

    builder.body(body).map_err(|e| email_error("message", e))
}

fn email_error(what: &str, e: impl std::fmt::Display) -> AggregatorError {
    AggregatorError::Email(format!("invalid {}: {}", what, e))
}

fn transport(config: &EmailConfig) -> Result<SmtpTransport> {
    let user = config.smtp_user.clone().unwrap_or_default();
    let password = config.smtp_password.clone().unwrap_or_default();

    let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
        SmtpTransport::relay(&config.smtp_host)
    } else {
        SmtpTransport::starttls_relay(&config.smtp_host)
    }
    .map_err(|e| AggregatorError::Email(e.to_string()))?;

    Ok(builder
        .port(config.smtp_port)
        .credentials(Credentials::new(user, password))
        .build())
}

/// Mail the report. Blocking SMTP I/O runs off the async runtime.
pub async fn send_report(config: &EmailConfig, subject: &str, body: String) -> Result<()> {
    let message = build_message(config, subject, body)?;
    let mailer = transport(config)?;
    let recipients = config.to.len();

    tokio::task::spawn_blocking(move || mailer.send(&message))
        .await
        .map_err(|e| AggregatorError::Email(format!("mail task failed: {}", e)))?
        .map_err(|e| AggregatorError::Email(e.to_string()))?;

    info!("Report mailed to {} recipient(s)", recipients);
    Ok(())
}

/// Send when SMTP is fully configured; a delivery failure is logged, never returned.
pub async fn deliver_if_configured(config: &EmailConfig, subject: &str, body: String) -> bool {
    if !config.smtp_ready() {
        info!("SMTP not configured, report kept on disk only");
        return false;
    }

    match send_report(config, subject, body).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to send report email: {}", e);
            false
        }
    }
}
