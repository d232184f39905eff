use std::sync::Arc;

use crate::error::{AiError, Result};
use crate::{ChatModel, Claude, Gemini, OpenAi};

/// Which LLM vendor backs a `ChatModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Claude,
    Gemini,
}

impl Provider {
    pub fn from_str_loose(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open_ai" | "gpt" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(AiError::Config(format!("unknown LLM provider: {other}"))),
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Claude => "claude-haiku-4-5-20251001",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }

    /// Conventional environment variable holding this vendor's key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Claude => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn build(
        &self,
        api_key: &str,
        model: &str,
        base_url: Option<&str>,
    ) -> Arc<dyn ChatModel> {
        let chat: Arc<dyn ChatModel> = match self {
            Provider::OpenAi => {
                let ai = OpenAi::new(api_key, model);
                Arc::new(match base_url {
                    Some(url) => ai.with_base_url(url),
                    None => ai,
                })
            }
            Provider::Claude => {
                let ai = Claude::new(api_key, model);
                Arc::new(match base_url {
                    Some(url) => ai.with_base_url(url),
                    None => ai,
                })
            }
            Provider::Gemini => {
                let ai = Gemini::new(api_key, model);
                Arc::new(match base_url {
                    Some(url) => ai.with_base_url(url),
                    None => ai,
                })
            }
        };
        chat
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Claude => write!(f, "claude"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}
