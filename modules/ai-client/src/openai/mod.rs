mod client;
pub(crate) mod types;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{AiError, Result};
use crate::traits::ChatModel;

use client::OpenAiClient;
use types::{ChatRequest, WireMessage};

const MAX_OUTPUT_TOKENS: u32 = 4096;

// =============================================================================
// OpenAi Model
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: crate::http_client(Duration::from_secs(120)),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AiError::Config("OPENAI_API_KEY environment variable not set".into()))?;
        Ok(Self::new(api_key, model))
    }

    /// Point at any OpenAI-compatible endpoint (Azure, vLLM, Ollama, a test server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAi {
    fn provider(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_completion(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest::for_model(&self.model, MAX_OUTPUT_TOKENS)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user));

        self.client()
            .chat(&request)
            .await?
            .into_text()
            .ok_or(AiError::EmptyResponse("OpenAI"))
    }

    async fn json_completion(
        &self,
        system: &str,
        user: &str,
        schema: &serde_json::Value,
    ) -> Result<String> {
        let request = ChatRequest::for_model(&self.model, MAX_OUTPUT_TOKENS)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user))
            .json_schema(schema.clone());

        self.client()
            .chat(&request)
            .await?
            .into_text()
            .ok_or(AiError::EmptyResponse("OpenAI"))
    }
}
