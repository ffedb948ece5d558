//! Mailer that writes outgoing mail to the log instead of delivering it.

use async_trait::async_trait;

use forum_core::domain::mask_email;
use forum_core::ports::{MailError, Mailer, OutgoingMail};

/// Development mailer. Production deployments plug a real transport into
/// the [`Mailer`] port.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mask_email(&mail.to),
            subject = %mail.subject,
            body = %mail.html,
            "Outgoing mail"
        );
        Ok(())
    }
}
