use std::sync::Arc;

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;

/// Outbound email client.
///
/// Constructed once at startup and shared through `AppState`. With
/// `email.enabled = false` the transport is never built and sends are
/// logged instead, which is what tests run with.
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from = Mailbox::new(
            Some(config.from_name.clone()),
            config
                .from_address
                .parse()
                .context("invalid email.from_address")?,
        );

        let transport = if config.enabled {
            Some(
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .context("invalid SMTP relay configuration")?
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ))
                    .build(),
            )
        } else {
            None
        };

        Ok(Self { transport, from })
    }

    /// Deliver an email on a background task.
    ///
    /// Delivery failures are logged and never propagate to the request
    /// that triggered the email.
    pub fn send_in_background(self: &Arc<Self>, to: String, subject: String, html: String) {
        let mailer = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &subject, html).await {
                tracing::error!("Failed to send email to {} ({}): {:#}", to, subject, e);
            }
        });
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let Some(transport) = &self.transport else {
            tracing::info!("Email sending disabled; skipping '{}' to {}", subject, to);
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        transport.send(message).await?;
        tracing::info!("Sent '{}' to {}", subject, to);
        Ok(())
    }
}
