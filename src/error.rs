//! Error types for rating ingestion.
//!
//! Structural problems with an uploaded file fail the whole import. Rows whose
//! subject cannot be resolved are collected alongside the successful writes
//! instead of aborting.

use serde::Serialize;
use thiserror::Error;

/// Errors raised while ingesting or resolving a ratings file.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportError {
    /// The header row is missing or the subject column cannot be located.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A row's subject value does not name a problem in the target bank.
    #[error("line {line}: unresolved subject {value:?}: {reason}")]
    UnresolvedSubject {
        line: u64,
        value: String,
        reason: String,
    },
}

impl ImportError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ImportError::MalformedInput {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error aborts the whole import.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ImportError::MalformedInput { .. })
    }
}
