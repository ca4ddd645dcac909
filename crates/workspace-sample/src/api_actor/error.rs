use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("API server is closed")]
    ServerClosed,
    #[error("API server dropped the response channel")]
    ServerDropped,
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Invalid params for {command}: {reason}")]
    InvalidParams { command: String, reason: String },
    #[error("{command} rejected: {message}")]
    Rejected { command: String, message: String },
}
