mod client;
pub(crate) mod types;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{AiError, Result};
use crate::traits::ChatModel;

use client::ClaudeClient;
use types::*;

const STRUCTURED_TOOL: &str = "structured_response";

// =============================================================================
// Claude Model
// =============================================================================

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: crate::http_client(Duration::from_secs(120)),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            AiError::Config("ANTHROPIC_API_KEY environment variable not set".into())
        })?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn client(&self) -> ClaudeClient {
        let client = ClaudeClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }
}

#[async_trait]
impl ChatModel for Claude {
    fn provider(&self) -> &'static str {
        "claude"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_completion(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .system(system)
            .message(WireMessage::user(user));

        self.client()
            .chat(&request)
            .await?
            .text()
            .ok_or(AiError::EmptyResponse("Claude"))
    }

    /// Claude has no JSON mode; a forced tool call carries the structured reply.
    async fn json_completion(
        &self,
        system: &str,
        user: &str,
        schema: &serde_json::Value,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .system(system)
            .message(WireMessage::user(user))
            .forced_tool(ToolDefinitionWire {
                name: STRUCTURED_TOOL.to_string(),
                description: "Return the extracted data.".to_string(),
                input_schema: schema.clone(),
            });

        let response = self.client().chat(&request).await?;

        match response.tool_input() {
            Some(input) => Ok(serde_json::to_string(input)?),
            // Fall back to any text the model produced; the caller parses it leniently.
            None => response.text().ok_or(AiError::EmptyResponse("Claude")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_new() {
        let ai = Claude::new("sk-ant-test", "claude-haiku-4-5-20251001");
        assert_eq!(ai.model, "claude-haiku-4-5-20251001");
        assert_eq!(ai.api_key, "sk-ant-test");
    }

    #[tokio::test]
    async fn json_completion_returns_tool_input() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "sk-ant-test")
            .match_header("anthropic-version", client::ANTHROPIC_VERSION)
            .with_status(200)
            .with_body(
                r#"{"content":[{"type":"tool_use","id":"t1","name":"structured_response","input":{"ipos":[{"company":"Acme"}]}}],"stop_reason":"tool_use"}"#,
            )
            .create_async()
            .await;

        let ai = Claude::new("sk-ant-test", "claude-haiku-4-5-20251001").with_base_url(server.url());
        let reply = ai
            .json_completion("sys", "user", &serde_json::json!({"type": "object"}))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(parsed["ipos"][0]["company"], "Acme");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_completion_skips_unknown_blocks() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(200)
            .with_body(r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"Three IPOs open this week."}]}"#)
            .create_async()
            .await;

        let ai = Claude::new("k", "claude-haiku-4-5-20251001").with_base_url(server.url());
        let reply = ai.chat_completion("sys", "user").await.unwrap();
        assert_eq!(reply, "Three IPOs open this week.");
    }
}
