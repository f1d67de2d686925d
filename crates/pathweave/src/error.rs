//! Error types for Pathweave operations.
//!
//! This module provides the main error type [`PathweaveError`]. Conversion
//! itself never fails: problems in a document are reported as
//! [`ConversionWarning`](crate::warning::ConversionWarning)s. Errors only come
//! from misuse of the session API and from host failures.

use std::io;

use thiserror::Error;

use pathweave_core::{identifier::Id, model::DocumentError};

/// The main error type for Pathweave operations.
#[derive(Debug, Error)]
pub enum PathweaveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown element `{0}`")]
    UnknownElement(Id),

    #[error("element `{0}` is not bound to a graph item")]
    Unbound(Id),

    #[error("element `{0}` is already bound to a graph item")]
    AlreadyBound(Id),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("broken anchor chain for line `{line}`: {reason}")]
    BrokenChain { line: Id, reason: String },

    #[error("Host error: {0}")]
    Host(String),

    #[error("invalid view scale {0}, expected a positive finite number")]
    InvalidScale(f64),

    #[error("Config error: {0}")]
    Config(String),
}

impl PathweaveError {
    pub(crate) fn broken_chain(line: Id, reason: impl Into<String>) -> Self {
        Self::BrokenChain {
            line,
            reason: reason.into(),
        }
    }

    /// Returns `true` when the error reports a removed element handle.
    pub fn is_stale_handle(&self) -> bool {
        matches!(self, Self::Document(DocumentError::StaleHandle(_)))
    }
}
