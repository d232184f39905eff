use async_trait::async_trait;
use serde::Serialize;

use crate::error::{api_error, Result};
use crate::{split_mailbox, DeliveryReceipt, EmailMessage, Mailer};

const SENDGRID_API_URL: &str = "https://api.sendgrid.com";

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> Address<'a> {
    /// SendGrid wants the bare address in `email`; a display name goes in `name`.
    fn parse(mailbox: &'a str) -> Self {
        let (name, email) = split_mailbox(mailbox);
        Self { email, name }
    }
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Body<'a> {
    #[serde(rename = "type")]
    mime: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Body<'a>>,
}

pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SendGridMailer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: crate::http_client(),
            api_key: api_key.into(),
            base_url: SENDGRID_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    fn provider(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        message.validate()?;

        // text/plain must precede text/html.
        let request = SendRequest {
            personalizations: vec![Personalization {
                to: message.to.iter().map(|to| Address::parse(to)).collect(),
            }],
            from: Address::parse(&message.from),
            subject: &message.subject,
            content: vec![
                Body {
                    mime: "text/plain",
                    value: &message.text,
                },
                Body {
                    mime: "text/html",
                    value: &message.html,
                },
            ],
        };

        let resp = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error("sendgrid", resp).await);
        }

        let message_id = resp
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        tracing::info!(recipients = message.to.len(), ?message_id, "SendGrid accepted email");
        Ok(DeliveryReceipt {
            provider: "sendgrid",
            message_id,
        })
    }
}
