use crate::error::{LlmError, Result};
use crate::types::{ChatModel, ModelRequest};

/// Canned apology in the user's language family. Never exposes error
/// detail.
#[must_use]
pub fn apology_for(user_text: &str) -> String {
    if kidz_text::contains_arabic(user_text) {
        "عذرًا، حصلت مشكلة مؤقتة عندنا. ممكن تجربي تبعتي رسالتك تاني بعد شوية؟".to_string()
    } else {
        "Sorry, something went wrong on our side. Please try again in a moment.".to_string()
    }
}

/// Primary call, one alternate-shape retry on a shape mismatch, then the
/// canned apology. The chain itself never fails.
pub struct FallbackChain<M: ChatModel> {
    model: M,
}

impl<M: ChatModel> FallbackChain<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Primary call with the one alternate-shape retry. `Err` means both
    /// attempts failed; callers that can act on the distinction (for
    /// example, refunding a consumed side effect) use this directly.
    pub async fn try_generate(&self, request: &ModelRequest) -> Result<String> {
        match self.model.generate(request).await {
            Ok(text) => Ok(text),
            Err(LlmError::UnsupportedShape(detail)) => {
                log::warn!("Primary request shape rejected ({detail}); retrying alternate shape");
                self.model.generate_alternate(request).await
            }
            Err(err) => Err(err),
        }
    }

    /// Generate a reply, degrading on failure. `user_text` picks the
    /// apology language when both attempts fail.
    pub async fn generate(&self, request: &ModelRequest, user_text: &str) -> String {
        match self.try_generate(request).await {
            Ok(text) => text,
            Err(err) => {
                log::error!("Model call failed: {err}");
                apology_for(user_text)
            }
        }
    }
}
