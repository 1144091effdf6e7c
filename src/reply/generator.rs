//! Reply generator. Asks an LLM to play a worried, cooperative victim.
//!
//! Generation never fails outward. Every path ends in [`Generated`], and the
//! reply policy falls back to a template on anything but `Text`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, CompletionRequest, LlmConfig, LlmProvider};

/// How many trailing messages the model sees.
pub const HISTORY_WINDOW: usize = 4;

const PERSONA_PROMPT: &str = "You are a normal person worried about a bank, payment or \
     verification issue. You are NOT aware this is a scam. Sound casual, a little confused, \
     and cooperative. Reply like a real person texting back: one to three short sentences, \
     no lists, never mention scams or AI.";

/// Outcome of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    /// Usable, trimmed, non-empty text.
    Text(String),
    /// Nothing usable; the caller should fall back.
    NoResult(NoResultReason),
}

/// Why generation produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoResultReason {
    /// Switched off, or no credential configured.
    Disabled,
    /// The call exceeded its time budget.
    Timeout,
    /// Provider returned an error.
    Failed(String),
    /// Provider answered with blank text.
    Empty,
}

/// Something that can phrase a decoy reply from recent history.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, history: &[String]) -> Generated;
}

/// Settings for [`LlmReplyGenerator`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 150,
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&LlmConfig> for GeneratorConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        }
    }
}

/// LLM-backed generator. Without a provider it is inert.
pub struct LlmReplyGenerator {
    llm: Option<Arc<dyn LlmProvider>>,
    config: GeneratorConfig,
}

impl LlmReplyGenerator {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, config: GeneratorConfig) -> Self {
        Self { llm, config }
    }

    /// A generator that always returns `NoResult(Disabled)`.
    pub fn disabled() -> Self {
        Self::new(None, GeneratorConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.llm.is_some()
    }

    fn build_request(&self, history: &[String]) -> CompletionRequest {
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        let transcript = history[start..]
            .iter()
            .map(|m| format!("- {}", m))
            .collect::<Vec<_>>()
            .join("\n");

        let user_prompt = format!(
            "Conversation so far:\n{transcript}\n\nRespond naturally to continue the conversation."
        );

        CompletionRequest::new(vec![
            ChatMessage::system(PERSONA_PROMPT),
            ChatMessage::user(user_prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens)
    }
}

#[async_trait]
impl ReplyGenerator for LlmReplyGenerator {
    async fn generate(&self, history: &[String]) -> Generated {
        let Some(llm) = &self.llm else {
            return Generated::NoResult(NoResultReason::Disabled);
        };

        let request = self.build_request(history);

        match tokio::time::timeout(self.config.timeout, llm.complete(request)).await {
            Err(_) => {
                warn!(timeout = ?self.config.timeout, model = llm.model_name(), "Reply generation timed out");
                Generated::NoResult(NoResultReason::Timeout)
            }
            Ok(Err(e)) => {
                warn!(error = %e, model = llm.model_name(), "Reply generation failed");
                Generated::NoResult(NoResultReason::Failed(e.to_string()))
            }
            Ok(Ok(response)) => {
                let text = response.content.trim();
                if text.is_empty() {
                    debug!(model = llm.model_name(), "Reply generation returned blank text");
                    Generated::NoResult(NoResultReason::Empty)
                } else {
                    Generated::Text(text.to_string())
                }
            }
        }
    }
}
