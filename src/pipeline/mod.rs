//! Turn pipeline.
//!
//! Every inbound scammer message flows through:
//! 1. `types::coerce_message()`: any payload shape to text
//! 2. `rules::is_scam()`: keyword flagging (sticky per conversation)
//! 3. `extract::extract_all()`: regex intelligence, merged as sets
//! 4. `ReplyPolicy::decide()`: silence, LLM reply, or template

pub mod extract;
pub mod processor;
pub mod rules;
pub mod types;

pub use processor::{TurnProcessor, spawn_eviction_task};
pub use types::{ConversationState, Intelligence, TurnResult};
