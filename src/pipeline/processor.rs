//! Turn processor: one scammer message in, one updated conversation view out.
//!
//! Flow for a turn:
//! 1. Coerce the raw message to text
//! 2. Load (or create) the conversation under its per-id lock
//! 3. Append, classify, extract, and save
//! 4. Pick a reply from the saved history
//!
//! Nothing here returns an error. Store failures degrade to a fresh
//! in-turn state, generation failures to the template ladder.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::pipeline::extract;
use crate::pipeline::rules;
use crate::pipeline::types::{ConversationState, TurnResult, coerce_message};
use crate::reply::ReplyPolicy;
use crate::store::ConversationStore;

/// Per-conversation async mutexes, created on demand.
#[derive(Default)]
struct ConversationLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ConversationLocks {
    async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on.
    fn prune(&self) -> usize {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }
}

/// Orchestrates turns against a store and a reply policy.
pub struct TurnProcessor {
    store: Arc<dyn ConversationStore>,
    policy: ReplyPolicy,
    locks: ConversationLocks,
}

impl TurnProcessor {
    pub fn new(store: Arc<dyn ConversationStore>, policy: ReplyPolicy) -> Self {
        Self {
            store,
            policy,
            locks: ConversationLocks::default(),
        }
    }

    /// Process one message of any shape for a conversation.
    pub async fn process_turn(
        &self,
        conversation_id: &str,
        raw_message: &serde_json::Value,
    ) -> TurnResult {
        let message = coerce_message(raw_message);
        let _guard = self.locks.acquire(conversation_id).await;

        let mut state = match self.store.get_or_create(conversation_id).await {
            Ok(state) => state,
            Err(e) => {
                error!(conversation_id, error = %e, "Failed to load conversation, starting fresh");
                ConversationState::new(conversation_id)
            }
        };

        debug!(
            conversation_id,
            message = %message.chars().take(100).collect::<String>(),
            "Processing turn"
        );

        let flagged = rules::is_scam(&message);
        if flagged {
            debug!(
                conversation_id,
                keywords = ?rules::matched_keywords(&message),
                "Message matched scam keywords"
            );
        }

        let found = extract::extract_all(&message);
        let newly_found = found.total();

        state.record_message(message);
        state.scam_detected |= flagged;
        state.intelligence.merge(found);

        // Commit before replying so a slow or failed reply can't lose the turn.
        if let Err(e) = self.store.save(state.clone()).await {
            error!(conversation_id, error = %e, "Failed to save conversation");
        }

        let decision = self.policy.decide(&state.messages, state.scam_detected).await;

        info!(
            conversation_id,
            turns = state.turns(),
            scam_detected = state.scam_detected,
            extracted = newly_found,
            reply_source = decision.source.label(),
            "Turn processed"
        );

        TurnResult::from_state(&state, decision.text)
    }

    /// Convenience for plain-text messages.
    pub async fn process_text(&self, conversation_id: &str, text: &str) -> TurnResult {
        self.process_turn(conversation_id, &serde_json::Value::String(text.to_string()))
            .await
    }

    /// Read-only view of a conversation, if it exists.
    pub async fn conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationState>, StoreError> {
        self.store.get(conversation_id).await
    }

    /// Number of conversations in the store.
    pub async fn conversation_count(&self) -> Result<usize, StoreError> {
        self.store.len().await
    }

    /// Evict idle conversations and drop their unused locks.
    pub async fn evict_idle(&self, ttl: Duration) -> Result<usize, StoreError> {
        let evicted = self.store.evict_idle(ttl).await?;
        let pruned = self.locks.prune();
        if pruned > 0 {
            debug!(pruned, "Pruned idle conversation locks");
        }
        Ok(evicted)
    }
}

/// Spawn a background task that periodically evicts idle conversations.
pub fn spawn_eviction_task(
    processor: Arc<TurnProcessor>,
    ttl: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = processor.evict_idle(ttl).await {
                warn!(error = %e, "Conversation eviction sweep failed");
            }
        }
    })
}
