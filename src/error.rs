use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Board not loaded")]
    BoardNotLoaded,

    #[error("Invalid drag token: {0}")]
    InvalidDragToken(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A chat turn is already pending")]
    ChatBusy,

    #[error("Not authorized")]
    Unauthorized,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server responded with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// True for failures caused by a missing or rejected credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
