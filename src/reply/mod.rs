//! Decoy replies: an optional LLM generator and the template fallback ladder.

pub mod generator;
pub mod policy;

pub use generator::{
    GeneratorConfig, Generated, LlmReplyGenerator, NoResultReason, ReplyGenerator,
};
pub use policy::{
    REPLY_TEMPLATES, ReplyDecision, ReplyPolicy, ReplySource, template_for_turn, template_index,
};
