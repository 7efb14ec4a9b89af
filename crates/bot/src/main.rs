mod config;
mod delivery;
mod webhook;

use crate::config::BotConfig;
use crate::delivery::MessengerClient;
use crate::webhook::{app, AppState, BotRouter};
use anyhow::Result;
use kidz_catalog::ProductCatalog;
use kidz_dialogue::Router;
use kidz_intent::{IntentCatalog, IntentMatcher};
use kidz_kb::KbIndex;
use kidz_llm::{FallbackChain, OpenAiClient, OpenAiConfig};
use kidz_session::{InMemorySessionStore, SessionStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let config = BotConfig::from_env();

    // Data loads degrade to empty collections; the bot always starts.
    let intents = IntentCatalog::load_or_empty(&config.intents_path);
    let products = ProductCatalog::load_or_empty(&config.products_path);
    let kb = KbIndex::load_or_empty(&config.kb_index_path).await;

    let sessions = Arc::new(InMemorySessionStore::new(config.tuning.session));
    spawn_session_sweep(Arc::clone(&sessions));

    let pipeline = build_pipeline(&config, intents, products, kb, Arc::clone(&sessions));
    let delivery = match config.page_access_token.clone() {
        Some(token) => Some(MessengerClient::new(token)?),
        None => None,
    };

    let state = Arc::new(AppState {
        verify_token: config.verify_token.clone(),
        pipeline,
        delivery,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    log::info!("kidz-bot listening on {}", config.bind_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn build_pipeline(
    config: &BotConfig,
    intents: IntentCatalog,
    products: ProductCatalog,
    kb: KbIndex,
    sessions: Arc<InMemorySessionStore>,
) -> Option<BotRouter> {
    let openai = match OpenAiConfig::from_env() {
        Ok(openai) => openai,
        Err(err) => {
            log::error!("Model client unavailable ({err}); serving limited replies only");
            return None;
        }
    };
    if !kb.is_empty() && openai.embedding_model != kb.model() {
        log::warn!(
            "Configured embedding model '{}' differs from KB artifact model '{}'; \
             query vectors may not match the index",
            openai.embedding_model,
            kb.model()
        );
    }
    let client = match OpenAiClient::new(openai) {
        Ok(client) => client,
        Err(err) => {
            log::error!("Model client unavailable ({err}); serving limited replies only");
            return None;
        }
    };

    Some(Router::new(
        intents,
        IntentMatcher::new(config.tuning.matcher),
        kb,
        products,
        sessions,
        config.tuning.session,
        client.clone(),
        FallbackChain::new(client),
        config.tuning.policy.clone(),
        config.tuning.search,
    ))
}

/// Periodic eviction of idle sessions. Garbage collection only; losing a
/// session costs continuity, not correctness.
fn spawn_session_sweep(sessions: Arc<InMemorySessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let evicted = sessions.sweep(Instant::now());
            if evicted > 0 {
                log::info!("Session sweep evicted {evicted} idle sessions");
            }
        }
    });
}
