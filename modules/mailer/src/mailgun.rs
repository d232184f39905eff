use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{api_error, Result};
use crate::{DeliveryReceipt, EmailMessage, Mailer};

const MAILGUN_API_URL: &str = "https://api.mailgun.net";

#[derive(Deserialize)]
struct SendResponse {
    id: Option<String>,
}

pub struct MailgunMailer {
    client: reqwest::Client,
    api_key: String,
    domain: String,
    base_url: String,
}

impl MailgunMailer {
    pub fn new(api_key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            client: crate::http_client(),
            api_key: api_key.into(),
            domain: domain.into(),
            base_url: MAILGUN_API_URL.to_string(),
        }
    }

    /// Use `https://api.eu.mailgun.net` for EU-hosted domains.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    fn provider(&self) -> &'static str {
        "mailgun"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        message.validate()?;

        let to = message.to.join(",");
        let form = [
            ("from", message.from.as_str()),
            ("to", to.as_str()),
            ("subject", message.subject.as_str()),
            ("text", message.text.as_str()),
            ("html", message.html.as_str()),
        ];

        let resp = self
            .client
            .post(format!("{}/v3/{}/messages", self.base_url, self.domain))
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error("mailgun", resp).await);
        }

        let body: SendResponse = resp.json().await?;
        tracing::info!(recipients = message.to.len(), id = ?body.id, "Mailgun queued email");
        Ok(DeliveryReceipt {
            provider: "mailgun",
            message_id: body.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_message;
    use mockito::Matcher;

    #[tokio::test]
    async fn send_posts_form_with_basic_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v3/mg.example.com/messages")
            // "api:key-1" base64-encoded
            .match_header("authorization", "Basic YXBpOmtleS0x")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("to".into(), "alice@example.com,bob@example.org".into()),
                Matcher::UrlEncoded("subject".into(), "India IPO digest".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id":"<2026@mg.example.com>","message":"Queued. Thank you."}"#)
            .create_async()
            .await;

        let mailer = MailgunMailer::new("key-1", "mg.example.com").with_base_url(server.url());
        let receipt = mailer.send(&test_message()).await.unwrap();

        assert_eq!(receipt.message_id.as_deref(), Some("<2026@mg.example.com>"));
        mock.assert_async().await;
    }
}
