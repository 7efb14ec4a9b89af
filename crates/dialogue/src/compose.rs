use kidz_llm::{ChatMessage, MessageRole, ModelRequest};
use kidz_session::{HistoryTurn, Role};

/// Assemble a model request: persona first, then each labeled context
/// block as its own system message, then bounded history in chronological
/// order, the current user turn last. Only the output cap is set; input is
/// not separately truncated.
#[must_use]
pub fn compose<'a>(
    persona: &str,
    context_blocks: &[String],
    history: impl Iterator<Item = &'a HistoryTurn>,
    user_turn: &str,
    max_output_tokens: u32,
) -> ModelRequest {
    let mut messages = Vec::new();
    messages.push(ChatMessage::system(persona));
    for block in context_blocks {
        messages.push(ChatMessage::system(block.clone()));
    }
    for turn in history {
        let message = match turn.role {
            Role::User => ChatMessage::user(turn.content.clone()),
            Role::Assistant => ChatMessage::assistant(turn.content.clone()),
        };
        messages.push(message);
    }
    messages.push(ChatMessage::user(user_turn));

    debug_assert!(matches!(messages[0].role, MessageRole::System));
    ModelRequest {
        messages,
        max_output_tokens,
    }
}
