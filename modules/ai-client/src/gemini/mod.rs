mod client;
pub(crate) mod types;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{AiError, Result};
use crate::schema::sanitize_gemini_schema;
use crate::traits::ChatModel;

use client::GeminiClient;
use types::GenerateRequest;

const MAX_OUTPUT_TOKENS: u32 = 4096;

// =============================================================================
// Gemini Model
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: crate::http_client(Duration::from_secs(120)),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| AiError::Config("GEMINI_API_KEY environment variable not set".into()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }
}

#[async_trait]
impl ChatModel for Gemini {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_completion(&self, system: &str, user: &str) -> Result<String> {
        let request = GenerateRequest::new(system, user, MAX_OUTPUT_TOKENS);
        self.client()
            .generate(&self.model, &request)
            .await?
            .text()
            .ok_or(AiError::EmptyResponse("Gemini"))
    }

    /// The schema is sanitized here, so callers can pass the same schema to every provider.
    async fn json_completion(
        &self,
        system: &str,
        user: &str,
        schema: &serde_json::Value,
    ) -> Result<String> {
        let request = GenerateRequest::new(system, user, MAX_OUTPUT_TOKENS)
            .json_schema(sanitize_gemini_schema(schema.clone()));
        self.client()
            .generate(&self.model, &request)
            .await?
            .text()
            .ok_or(AiError::EmptyResponse("Gemini"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn json_completion_sends_sanitized_schema() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "g-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "type": "OBJECT" }
                }
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"ipos\":"},{"text":"[]}"}]},"finishReason":"STOP"}]}"#)
            .create_async()
            .await;

        let ai = Gemini::new("g-key", "gemini-2.0-flash").with_base_url(server.url());
        let schema = serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": { "ipos": { "type": "array", "items": { "type": "string" } } }
        });
        let reply = ai.json_completion("sys", "user", &schema).await.unwrap();

        assert_eq!(reply, "{\"ipos\":[]}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn blocked_prompt_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let ai = Gemini::new("g-key", "gemini-2.0-flash").with_base_url(server.url());
        let err = ai.chat_completion("sys", "user").await.unwrap_err();
        assert!(matches!(err, AiError::EmptyResponse("Gemini")));
    }
}
