use std::sync::Arc;

use anyhow::Context;

use honeypot::api::{AppState, honeypot_routes};
use honeypot::config::HoneypotConfig;
use honeypot::llm::create_provider;
use honeypot::pipeline::{TurnProcessor, spawn_eviction_task};
use honeypot::reply::{GeneratorConfig, LlmReplyGenerator, ReplyPolicy};
use honeypot::store::{ConversationStore, InMemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = HoneypotConfig::from_env().context("Invalid configuration")?;

    // ── Reply policy ────────────────────────────────────────────────────
    let llm = create_provider(&config.llm).context("Failed to create LLM provider")?;
    let generator = LlmReplyGenerator::new(llm, GeneratorConfig::from(&config.llm));

    eprintln!("🍯 Honeypot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening: http://{}", config.server.bind_address());
    eprintln!(
        "   LLM replies: {}",
        if generator.is_enabled() {
            format!("enabled ({})", config.llm.model)
        } else if config.llm.enabled {
            "disabled (no LLM_API_KEY)".to_string()
        } else {
            "disabled".to_string()
        }
    );
    eprintln!(
        "   API key: {}",
        if config.auth.enforce { "enforced" } else { "logged only" }
    );

    let policy = ReplyPolicy::new(Arc::new(generator));

    // ── Conversations ───────────────────────────────────────────────────
    let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
    let processor = Arc::new(TurnProcessor::new(store, policy));

    match config.retention.idle_ttl {
        Some(ttl) => {
            let _eviction_handle = spawn_eviction_task(
                Arc::clone(&processor),
                ttl,
                config.retention.sweep_interval,
            );
            eprintln!("   Retention: evict after {}s idle", ttl.as_secs());
        }
        None => eprintln!("   Retention: process lifetime"),
    }

    // ── HTTP ────────────────────────────────────────────────────────────
    let app = honeypot_routes(AppState {
        processor,
        auth: config.auth.clone(),
    });

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Honeypot server started");

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
