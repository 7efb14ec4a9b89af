use crate::delivery::MessengerClient;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use kidz_dialogue::{Outbound, Router};
use kidz_llm::OpenAiClient;
use kidz_session::InMemorySessionStore;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

pub type BotRouter = Router<Arc<InMemorySessionStore>, OpenAiClient, OpenAiClient>;

/// Shared server state. The pipeline is `None` when the model credentials
/// are missing; the bot then answers with a fixed limited-service notice
/// instead of crashing.
pub struct AppState {
    pub verify_token: Option<String>,
    pub pipeline: Option<BotRouter>,
    pub delivery: Option<MessengerClient>,
}

impl AppState {
    fn degraded_reply(text: &str) -> Vec<Outbound> {
        let reply = if kidz_text::contains_arabic(text) {
            "الخدمة متاحة بشكل محدود مؤقتًا. جربي تاني بعد شوية من فضلك."
        } else {
            "Service is temporarily limited. Please try again later."
        };
        vec![Outbound::Text(reply.to_string())]
    }
}

pub fn app(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/webhook", get(verify).post(receive))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Platform verification handshake: echo `hub.challenge` when the mode and
/// token match, 403 otherwise.
async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, StatusCode> {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token");
    let challenge = params.get("hub.challenge");

    match (mode, token, challenge, &state.verify_token) {
        (Some("subscribe"), Some(token), Some(challenge), Some(expected)) if token == expected => {
            log::info!("Webhook verified");
            Ok(challenge.clone())
        }
        _ => Err(StatusCode::FORBIDDEN),
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    object: Option<String>,
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
struct MessagingEvent {
    sender: Sender,
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct Sender {
    id: String,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    text: Option<String>,
}

/// Event intake. Always 200 once the payload parses as a page event; a
/// failed turn or failed delivery must not make the platform re-deliver.
async fn receive(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WebhookPayload>,
) -> StatusCode {
    if payload.object.as_deref() != Some("page") {
        return StatusCode::NOT_FOUND;
    }

    for entry in payload.entry {
        for event in entry.messaging {
            let Some(text) = event.message.and_then(|m| m.text) else {
                continue;
            };
            let user_id = event.sender.id;
            log::info!("Incoming message from {user_id}");

            let units = match &state.pipeline {
                Some(router) => router.handle_message(&user_id, &text).await,
                None => AppState::degraded_reply(&text),
            };
            match &state.delivery {
                Some(delivery) => delivery.deliver(&user_id, &units).await,
                None => log::error!("No delivery client; dropping reply to {user_id}"),
            }
        }
    }
    StatusCode::OK
}
