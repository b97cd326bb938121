//! Error types for slide deck assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a slide deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A slide source or the slides directory does not exist.
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The converter could not render a slide source.
    #[error("Failed to convert {file}: {message}")]
    ConversionError { file: String, message: String },

    /// The build configuration is invalid or could not be parsed.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to serialize the presentation.
    #[error("Failed to write presentation: {0}")]
    WriteError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),
}

impl Error {
    /// Build a conversion error for the named source.
    pub fn conversion(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConversionError {
            file: file.into(),
            message: message.into(),
        }
    }
}
