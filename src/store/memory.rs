//! In-memory conversation store. Process lifetime, lost on restart.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::traits::ConversationStore;
use crate::error::StoreError;
use crate::pipeline::types::ConversationState;

/// `HashMap` behind a `tokio::sync::RwLock`.
#[derive(Default)]
pub struct InMemoryStore {
    conversations: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn get_or_create(&self, id: &str) -> Result<ConversationState, StoreError> {
        if let Some(state) = self.conversations.read().await.get(id) {
            return Ok(state.clone());
        }

        let mut conversations = self.conversations.write().await;
        let state = conversations.entry(id.to_string()).or_insert_with(|| {
            debug!(conversation_id = %id, "Creating conversation");
            ConversationState::new(id)
        });
        Ok(state.clone())
    }

    async fn save(&self, state: ConversationState) -> Result<(), StoreError> {
        self.conversations
            .write()
            .await
            .insert(state.id.clone(), state);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ConversationState>, StoreError> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.conversations.read().await.len())
    }

    async fn evict_idle(&self, ttl: Duration) -> Result<usize, StoreError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StoreError::Unavailable(format!("invalid ttl: {}", e)))?;
        let cutoff = Utc::now() - ttl;

        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|_, state| state.updated_at >= cutoff);
        let evicted = before - conversations.len();

        if evicted > 0 {
            info!(count = evicted, remaining = conversations.len(), "Evicted idle conversations");
        }

        Ok(evicted)
    }
}
