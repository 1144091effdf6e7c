//! `ConversationStore` trait, the only seam between turns and memory.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::pipeline::types::ConversationState;

/// Backend-agnostic conversation storage.
///
/// Implementations do not serialize turns; the turn processor holds a
/// per-conversation lock across `get_or_create` → `save`.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Fetch a conversation, creating an empty one on first reference.
    async fn get_or_create(&self, id: &str) -> Result<ConversationState, StoreError>;

    /// Persist a conversation, keyed by `state.id`. Replaces any previous value.
    async fn save(&self, state: ConversationState) -> Result<(), StoreError>;

    /// Fetch a conversation without creating it.
    async fn get(&self, id: &str) -> Result<Option<ConversationState>, StoreError>;

    /// Number of conversations held.
    async fn len(&self) -> Result<usize, StoreError>;

    /// Drop conversations idle for longer than `ttl`.
    /// Returns the number removed.
    async fn evict_idle(&self, ttl: Duration) -> Result<usize, StoreError>;
}
