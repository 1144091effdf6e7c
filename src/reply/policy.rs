//! Reply policy: silent until flagged, then generator first, templates second.

use std::sync::Arc;

use tracing::debug;

use super::generator::{Generated, ReplyGenerator};

/// Fallback replies, one per turn. Past the end the last one repeats.
///
/// Apostrophes are U+2019, matching the deployed wording byte for byte.
pub const REPLY_TEMPLATES: [&str; 4] = [
    "I\u{2019}m a bit confused, can you explain what I need to do?",
    "It\u{2019}s asking for more details. What exactly should I enter?",
    "I\u{2019}m seeing an error in my app. Can you resend the info?",
    "I don\u{2019}t want to mess this up. What should I do next?",
];

/// Ladder position for a zero-based turn index. Plateaus on the last entry.
pub fn template_index(turn_index: usize) -> usize {
    turn_index.min(REPLY_TEMPLATES.len() - 1)
}

/// Template for a zero-based turn index.
pub fn template_for_turn(turn_index: usize) -> &'static str {
    REPLY_TEMPLATES[template_index(turn_index)]
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Conversation not flagged; no reply.
    Silent,
    Generated,
    /// Fallback ladder, with the template index used.
    Template(usize),
}

impl ReplySource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Generated => "generated",
            Self::Template(_) => "template",
        }
    }
}

/// A chosen reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDecision {
    pub text: String,
    pub source: ReplySource,
}

pub struct ReplyPolicy {
    generator: Arc<dyn ReplyGenerator>,
}

impl ReplyPolicy {
    pub fn new(generator: Arc<dyn ReplyGenerator>) -> Self {
        Self { generator }
    }

    /// Decide this turn's reply from the full history and the current flag.
    pub async fn decide(&self, messages: &[String], scam_detected: bool) -> ReplyDecision {
        if !scam_detected {
            return ReplyDecision {
                text: String::new(),
                source: ReplySource::Silent,
            };
        }

        match self.generator.generate(messages).await {
            Generated::Text(text) => ReplyDecision {
                text,
                source: ReplySource::Generated,
            },
            Generated::NoResult(reason) => {
                let turn_index = messages.len().saturating_sub(1);
                let index = template_index(turn_index);
                debug!(?reason, turn_index, template = index, "Falling back to reply template");
                ReplyDecision {
                    text: template_for_turn(turn_index).to_string(),
                    source: ReplySource::Template(index),
                }
            }
        }
    }
}
