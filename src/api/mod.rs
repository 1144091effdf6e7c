//! HTTP transport for the honeypot.

pub mod routes;

pub use routes::{AppState, honeypot_routes};
