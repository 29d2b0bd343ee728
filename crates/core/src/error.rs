//! Error types for slide recovery, normalization, and style extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to turn model output into parseable JSON.
///
/// Always absorbed by the caller: the affected slide falls back to a canned
/// default record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    /// Neither a `[` nor a `{` boundary exists in the text.
    #[error("No JSON structure found in response")]
    NoStructureFound,

    /// The repaired text still fails strict parsing.
    #[error("Failed to validate JSON structure: {message}")]
    ParseFailed {
        /// The repaired text handed to the parser.
        text: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Errors that can occur while building slide records or style patterns.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Model output could not be recovered into JSON.
    #[error("Recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    /// Parsed input has an unusable top-level shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The reference deck itself could not be opened or parsed.
    #[error("Style extraction error: {0}")]
    StyleExtraction(String),

    /// A persisted style-patterns document could not be parsed.
    #[error("Invalid style patterns document: {0}")]
    StyleDocument(String),

    /// The text-generation backend reported a failure.
    #[error("Generation backend error: {0}")]
    Backend(String),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
