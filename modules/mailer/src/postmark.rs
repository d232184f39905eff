use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{api_error, Result};
use crate::{DeliveryReceipt, EmailMessage, Mailer};

const POSTMARK_API_URL: &str = "https://api.postmarkapp.com";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendRequest<'a> {
    from: &'a str,
    to: String,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    message_stream: &'static str,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(rename = "MessageID")]
    message_id: Option<String>,
}

pub struct PostmarkMailer {
    client: reqwest::Client,
    server_token: String,
    base_url: String,
}

impl PostmarkMailer {
    pub fn new(server_token: impl Into<String>) -> Self {
        Self {
            client: crate::http_client(),
            server_token: server_token.into(),
            base_url: POSTMARK_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Mailer for PostmarkMailer {
    fn provider(&self) -> &'static str {
        "postmark"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        message.validate()?;

        let resp = self
            .client
            .post(format!("{}/email", self.base_url))
            .header("X-Postmark-Server-Token", &self.server_token)
            .header("Accept", "application/json")
            .json(&SendRequest {
                from: &message.from,
                to: message.to.join(","),
                subject: &message.subject,
                html_body: &message.html,
                text_body: &message.text,
                message_stream: "outbound",
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error("postmark", resp).await);
        }

        let body: SendResponse = resp.json().await?;
        tracing::info!(recipients = message.to.len(), id = ?body.message_id, "Postmark accepted email");
        Ok(DeliveryReceipt {
            provider: "postmark",
            message_id: body.message_id,
        })
    }
}
