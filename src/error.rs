use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("No non-loopback IPv4 address found for this host")]
    NoLocalAddress,

    #[error("Image server error: {0}")]
    Server(#[from] hyper::Error),

    #[error("Frame did not fetch the image within {0:?}")]
    DeliveryTimeout(Duration),

    #[error("Image server stopped before the frame fetched the image")]
    ServerStopped,

    #[error("Image server task failed: {0}")]
    ServerTask(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
