use std::time::Duration;

/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the dispatch
/// layer can turn any adapter failure into the same in-chat error reply.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url: {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("external error: {0}")]
    External(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed by server")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
