//! Shared types for the turn pipeline.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Intelligence ────────────────────────────────────────────────────

/// Artifacts extracted from scammer messages, one set per category.
///
/// Sets only ever grow. Categories overlap: a 16-digit card number is also a
/// valid bank account number and shows up in both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intelligence {
    pub upi_ids: BTreeSet<String>,
    pub bank_accounts: BTreeSet<String>,
    pub ifsc_codes: BTreeSet<String>,
    pub phishing_urls: BTreeSet<String>,
    pub card_numbers: BTreeSet<String>,
    pub otp_codes: BTreeSet<String>,
}

impl Intelligence {
    /// Union another record into this one, category by category.
    pub fn merge(&mut self, other: Intelligence) {
        self.upi_ids.extend(other.upi_ids);
        self.bank_accounts.extend(other.bank_accounts);
        self.ifsc_codes.extend(other.ifsc_codes);
        self.phishing_urls.extend(other.phishing_urls);
        self.card_numbers.extend(other.card_numbers);
        self.otp_codes.extend(other.otp_codes);
    }

    /// Total number of artifacts across all categories.
    pub fn total(&self) -> usize {
        self.upi_ids.len()
            + self.bank_accounts.len()
            + self.ifsc_codes.len()
            + self.phishing_urls.len()
            + self.card_numbers.len()
            + self.otp_codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// ── Conversation state ──────────────────────────────────────────────

/// Everything remembered about one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Caller-supplied identifier. Never validated.
    pub id: String,
    /// Scammer messages in arrival order. The engine's replies are not stored.
    pub messages: Vec<String>,
    /// Sticky: once a message matched the classifier this stays `true`.
    pub scam_detected: bool,
    pub intelligence: Intelligence,
    pub created_at: DateTime<Utc>,
    /// Last time a message was recorded; drives idle eviction.
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Fresh state: no messages, not flagged, no intelligence.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            scam_detected: false,
            intelligence: Intelligence::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and bump `updated_at`.
    pub fn record_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        self.updated_at = Utc::now();
    }

    /// Number of scammer messages seen.
    pub fn turns(&self) -> usize {
        self.messages.len()
    }

    /// Zero-based index of the latest message (0 before any message).
    pub fn turn_index(&self) -> usize {
        self.messages.len().saturating_sub(1)
    }
}

// ── Turn result ─────────────────────────────────────────────────────

/// Public view of a conversation after one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    pub scam_detected: bool,
    /// Empty until the conversation is flagged.
    pub agent_reply: String,
    pub turns: usize,
    pub extracted_intelligence: Intelligence,
}

impl TurnResult {
    /// Snapshot a conversation together with the reply chosen for this turn.
    pub fn from_state(state: &ConversationState, agent_reply: impl Into<String>) -> Self {
        Self {
            scam_detected: state.scam_detected,
            agent_reply: agent_reply.into(),
            turns: state.turns(),
            extracted_intelligence: state.intelligence.clone(),
        }
    }
}

// ── Message coercion ────────────────────────────────────────────────

/// Turn whatever the transport delivered into message text.
///
/// Strings pass through untouched. Objects and arrays become compact JSON so
/// structured payloads still flow through classification and extraction.
/// Other scalars use their JSON text (`42`, `true`, `null`). Never fails.
pub fn coerce_message(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
