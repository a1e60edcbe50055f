//! Error types for the webcam component

use thiserror::Error;
use webcam_media::MediaError;

/// Main error type for webcam component operations
#[derive(Error, Debug)]
pub enum WebcamError {
    /// Initialization error
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Reason for initialization failure
        reason: String,
    },

    /// A configuration value is out of range
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration {
        /// Offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Configuration could not be parsed
    #[error("Failed to parse configuration: {source}")]
    ConfigParse {
        /// Underlying parse error
        #[from]
        source: serde_json::Error,
    },

    /// Media layer error
    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Result type alias for webcam component operations
pub type WebcamResult<T> = Result<T, WebcamError>;
