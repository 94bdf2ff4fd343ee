//! Error types and handling for `TripKML`

use thiserror::Error;

/// Main error type for the `TripKML` pipeline
#[derive(Error, Debug)]
pub enum TripKmlError {
    /// No usable embedded trip data in the document
    #[error("Extraction error: {message}")]
    Extraction { message: String },

    /// Contract violation while rendering markup
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TripKmlError {
    /// Create a new extraction error
    pub fn extraction<S: Into<String>>(message: S) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripKmlError::Extraction { message } => {
                format!("Could not find trip data in the page: {message}")
            }
            TripKmlError::Serialization { message } => {
                format!("Internal error while writing KML: {message}")
            }
            TripKmlError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripKmlError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            TripKmlError::Io { .. } => {
                "File operation failed. Please check the path and file permissions.".to_string()
            }
        }
    }
}
