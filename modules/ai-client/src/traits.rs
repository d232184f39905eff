use async_trait::async_trait;

use crate::error::Result;

// =============================================================================
// ChatModel Trait
// =============================================================================

/// A single-turn chat model. One system prompt, one user prompt, one reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Short provider name for logs ("openai", "claude", "gemini").
    fn provider(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Free-form text completion.
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String>;

    /// Completion constrained to `schema`, returned as raw JSON text.
    ///
    /// Providers differ in how strictly they honour the schema, so callers
    /// should still parse the reply defensively.
    async fn json_completion(
        &self,
        system: &str,
        user: &str,
        schema: &serde_json::Value,
    ) -> Result<String>;
}
