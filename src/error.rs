//! Error types for contract-lock
//!
//! Every variant except [`Error::HardIncompatibility`] is fatal to a single
//! document or schema only; the workspace loader catches them per item.
//! Ordinary findings are not errors, they are [`crate::report::Problem`]s.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Source document or schema file does not exist
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Document has no `# Contract:` title marker
    #[error("Malformed document: no contract title marker in {}", path.display())]
    MalformedDocument { path: PathBuf },

    /// Schema violates the JSON Schema meta-specification
    #[error("Schema error in {}: {}", path.display(), violations.join("; "))]
    SchemaError {
        path: PathBuf,
        violations: Vec<String>,
    },

    /// Schema file is not valid JSON
    #[error("JSON decode error in {}: {source}", path.display())]
    JsonDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A producer postcondition contradicts a compatible consumer precondition
    #[error(
        "Hard incompatibility: postcondition '{postcondition}' of {producer} contradicts precondition '{precondition}' of {consumer}"
    )]
    HardIncompatibility {
        producer: String,
        consumer: String,
        postcondition: String,
        precondition: String,
    },

    /// A built-in extraction pattern failed to compile
    #[error("Regex error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for contract-lock operations
pub type Result<T> = std::result::Result<T, Error>;
