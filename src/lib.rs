//! Honeypot: keeps scammers talking while it takes notes.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod reply;
pub mod store;
