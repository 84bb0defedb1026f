//! Error types shared by the classifier, the detection session and the CLI

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the facial-affect crates.
///
/// A frame without a face and a feature list with missing actions are not
/// errors; they are handled as ordinary values by the classifier.
#[derive(Debug, Error)]
pub enum AffectError {
    #[error("Landmark service failed to initialize: {0}")]
    InitializationFailed(String),

    #[error("Landmark service initialization timed out after {0:?}")]
    InitializationTimeout(Duration),

    #[error("Detection session is not initialized")]
    NotInitialized,

    #[error("Detection session has been disposed")]
    Disposed,

    #[error("Landmark service error: {0}")]
    Service(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for facial-affect operations
pub type Result<T> = std::result::Result<T, AffectError>;
