//! Media acquisition error types and handling
//!
//! This module defines the error taxonomy shared by every acquisition path and
//! by the screenshot pipeline, along with the mapping from platform error
//! names (DOMException names in the browser) onto that taxonomy.

use thiserror::Error;

/// Main error type for media acquisition and capture operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// No capture capability exists in this execution context
    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform {
        /// Platform or context description
        platform: String,
    },

    /// The user or the platform refused access to a capture device
    #[error("Permission denied: {reason}")]
    PermissionDenied {
        /// Reason reported by the platform
        reason: String,
    },

    /// No available device can satisfy the requested constraints
    #[error("Constraint not satisfiable: {constraint}")]
    ConstraintNotSatisfiable {
        /// Constraint reported by the platform, or its message
        constraint: String,
    },

    /// Device not found error
    #[error("Device not found: {device_id}")]
    DeviceNotFound {
        /// Device identifier or requested kind
        device_id: String,
    },

    /// Device enumeration failed
    #[error("Device enumeration failed: {reason}")]
    DeviceEnumerationFailed {
        /// Failure reason
        reason: String,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Invalid state for operation
    #[error("Invalid state: {message}")]
    InvalidState {
        /// State error message
        message: String,
    },

    /// Raster surface could not be created or drawn
    #[error("Raster error: {message}")]
    Raster {
        /// Error message
        message: String,
    },

    /// Encoding a captured frame failed
    #[error("Encoding failed: {format} - {reason}")]
    EncodingFailed {
        /// Target image format
        format: String,
        /// Failure reason
        reason: String,
    },

    /// Constraints could not be serialized for the platform
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Any other platform-reported failure
    #[error("{name}: {message}")]
    Platform {
        /// Platform error name
        name: String,
        /// Error message
        message: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Map a platform error name onto the acquisition taxonomy.
    ///
    /// Both the current and the legacy browser spellings are recognised.
    pub fn from_platform(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                MediaError::PermissionDenied {
                    reason: message.to_string(),
                }
            }
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                MediaError::ConstraintNotSatisfiable {
                    constraint: message.to_string(),
                }
            }
            "NotFoundError" | "DevicesNotFoundError" => MediaError::DeviceNotFound {
                device_id: message.to_string(),
            },
            _ => MediaError::Platform {
                name: name.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// Whether this failure triggers the one-shot constraint relaxation retry
    pub fn is_constraint_failure(&self) -> bool {
        matches!(self, MediaError::ConstraintNotSatisfiable { .. })
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::ConstraintNotSatisfiable { .. } => true,
            MediaError::DeviceNotFound { .. } => true,
            MediaError::Raster { .. } => true,
            MediaError::UnsupportedPlatform { .. } => false,
            MediaError::PermissionDenied { .. } => false,
            MediaError::InvalidConfiguration { .. } => false,
            _ => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::UnsupportedPlatform { .. } => ErrorCategory::Platform,
            MediaError::PermissionDenied { .. } => ErrorCategory::Permission,
            MediaError::ConstraintNotSatisfiable { .. } => ErrorCategory::Constraint,
            MediaError::DeviceNotFound { .. } => ErrorCategory::Device,
            MediaError::DeviceEnumerationFailed { .. } => ErrorCategory::Device,
            MediaError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            MediaError::InvalidState { .. } => ErrorCategory::State,
            MediaError::Raster { .. } => ErrorCategory::Capture,
            MediaError::EncodingFailed { .. } => ErrorCategory::Capture,
            MediaError::Serialization { .. } => ErrorCategory::Configuration,
            MediaError::Platform { .. } => ErrorCategory::Platform,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Platform capability errors
    Platform,
    /// Access refused by user or policy
    Permission,
    /// Requested constraints cannot be met
    Constraint,
    /// Device and enumeration errors
    Device,
    /// Configuration and parameter errors
    Configuration,
    /// State management errors
    State,
    /// Screenshot rasterization and encoding errors
    Capture,
}

/// Helper trait for converting platform-specific errors
pub trait IntoMediaError {
    fn into_media_error(self, context: &str) -> MediaError;
}

impl IntoMediaError for image::ImageError {
    fn into_media_error(self, context: &str) -> MediaError {
        MediaError::EncodingFailed {
            format: context.to_string(),
            reason: self.to_string(),
        }
    }
}
