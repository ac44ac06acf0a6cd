//! Verification findings
//!
//! A [`Problem`] is a non-fatal finding collected by the checkers. It carries
//! a message and a category for filtering; there is no severity.

use serde::Serialize;
use std::fmt;

/// Category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    MissingDescription,
    MissingPreconditions,
    MissingPostconditions,
    Contradiction,
    TypeMismatch,
    FormatMismatch,
    ConstraintMismatch,
    UnresolvedReference,
    InconsistentError,
    InvalidSchema,
    InvalidExample,
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub kind: ProblemKind,
    pub message: String,
}

impl Problem {
    pub fn new(kind: ProblemKind, message: impl Into<String>) -> Self {
        Problem {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
