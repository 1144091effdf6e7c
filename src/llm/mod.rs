//! LLM integration for the honeypot.
//!
//! Only used to phrase decoy replies. Talks to any OpenAI-compatible
//! chat-completions endpoint through [`OpenAiProvider`].

pub mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::LlmError;

/// Default OpenAI-compatible base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Default model for decoy replies.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for external reply generation.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Master switch. When off, no provider is ever built.
    pub enabled: bool,
    /// Credential. `None` also disables generation.
    pub api_key: Option<SecretString>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on one generation call.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 150,
            timeout: Duration::from_secs(10),
        }
    }
}

impl LlmConfig {
    /// Generation is live only when switched on and a credential is present.
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }
}

/// Create an LLM provider from configuration.
///
/// Returns `Ok(None)` when generation is switched off or no credential is
/// configured; callers treat that as "always fall back to templates".
pub fn create_provider(config: &LlmConfig) -> Result<Option<Arc<dyn LlmProvider>>, LlmError> {
    let api_key = match &config.api_key {
        Some(key) if config.is_active() => key.clone(),
        _ => {
            tracing::info!(
                enabled = config.enabled,
                has_key = config.api_key.is_some(),
                "External reply generation inactive, using templates only"
            );
            return Ok(None);
        }
    };

    let provider = OpenAiProvider::new(&config.api_url, api_key, &config.model, config.timeout)?;
    tracing::info!("Using OpenAI-compatible provider (model: {})", config.model);
    Ok(Some(Arc::new(provider)))
}
