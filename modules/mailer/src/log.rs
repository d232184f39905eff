use async_trait::async_trait;

use crate::error::Result;
use crate::{DeliveryReceipt, EmailMessage, Mailer};

/// Logs the email instead of sending it. For local runs without a provider account.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn provider(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        message.validate()?;
        tracing::info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            html_bytes = message.html.len(),
            "Email not sent (log provider)"
        );
        tracing::debug!(text = %message.text, "Email body");
        Ok(DeliveryReceipt {
            provider: "log",
            message_id: None,
        })
    }
}
