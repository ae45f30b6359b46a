/*!
 * Error types for the doctrans application.
 *
 * This module contains custom error types for the different layers of the
 * translation pipeline, using the thiserror crate for ergonomic error definitions.
 * Backend errors never leave the orchestrator: they are turned into
 * "try the next backend" decisions there.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a hosted chat-completion API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// No credential is configured for the provider, no request was sent
    #[error("No API key configured for {0}")]
    AuthMissing(String),

    /// The API answered with a non-success status
    #[error("API responded with error: {status_code} - {body}")]
    UpstreamError {
        /// HTTP status code
        status_code: u16,
        /// Raw response body
        body: String,
    },

    /// The response did not contain `choices[0].message.content`
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    /// The request could not be sent or the response could not be read
    #[error("API request failed: {0}")]
    RequestFailed(String),
}

impl ProviderError {
    /// Whether this error means the backend was never contacted
    pub fn is_auth_missing(&self) -> bool {
        matches!(self, Self::AuthMissing(_))
    }
}

/// Errors raised by the local command line translator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// The translator binary could not be located
    #[error("Translation tool not available: {0}")]
    ToolUnavailable(String),

    /// The translator ran but did not produce a usable result
    #[error("Translation tool failed: {0}")]
    ToolExecutionError(String),
}

/// Errors that can occur while translating a document
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from a hosted provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The source document does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A backend answered with nothing
    #[error("Empty translation result from {0}")]
    EmptyTranslationResult(String),

    /// A whole-document translation lost or gained code fences
    #[error("Translated document has {found} code fence lines, source has {expected}")]
    StructureMismatch {
        /// Fence lines in the source
        expected: usize,
        /// Fence lines in the translation
        found: usize,
    },

    /// Reading or writing a document failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// A file the command writes could not be written
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
