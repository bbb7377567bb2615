// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Response carried no code_submission_id: {0}")]
    MissingSubmissionId(String),

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Command {command} requires parameter '{name}'")]
    MissingParameter { command: String, name: String },

    #[error("Command {command} got parameter '{name}' more than once")]
    DuplicateParameter { command: String, name: String },

    #[error("Command {command} does not accept parameter '{name}'")]
    UnexpectedParameter { command: String, name: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Subscription protocol violation: {0}")]
    Protocol(String),

    #[error("Subscription returned an error: {0}")]
    Subscription(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
