use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{api_error, Result};
use crate::{DeliveryReceipt, EmailMessage, Mailer};

const RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: Option<String>,
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: crate::http_client(),
            api_key: api_key.into(),
            base_url: RESEND_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn provider(&self) -> &'static str {
        "resend"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        message.validate()?;

        let resp = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &message.from,
                to: &message.to,
                subject: &message.subject,
                html: &message.html,
                text: &message.text,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error("resend", resp).await);
        }

        let body: SendResponse = resp.json().await?;
        tracing::info!(recipients = message.to.len(), id = ?body.id, "Resend accepted email");
        Ok(DeliveryReceipt {
            provider: "resend",
            message_id: body.id,
        })
    }
}
