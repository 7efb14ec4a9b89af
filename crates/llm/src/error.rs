use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Error, Debug)]
pub enum LlmError {
    /// Network, timeout or rate-limit failure. Retry-once or degrade,
    /// never fatal to the turn.
    #[error("Transient model error: {0}")]
    Transient(String),

    /// The model family rejected the request shape. Triggers the one-time
    /// alternate-shape retry.
    #[error("Unsupported request shape: {0}")]
    UnsupportedShape(String),

    /// Required secret or setting absent at startup. The component runs in
    /// degraded mode rather than crashing the process.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Transient(err.to_string())
    }
}
