// Typed errors with thiserror. Only config and envelope errors reach JS;
// data-shape problems degrade to "no trigger" and are logged instead.

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed jumpscare entry {id}: {reason}")]
    MalformedEntry { id: String, reason: String },

    #[error("Alert rendering failed: {0}")]
    Render(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
