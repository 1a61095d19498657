//! Error types for amlgraph operations.
//!
//! This module provides the main error type [`AmlError`] which wraps the
//! error conditions of every import phase: reading the input, parsing it,
//! writing the store, and querying it.

use std::{io, path::PathBuf};

use thiserror::Error;

use amlgraph_parser::ParseError;

use crate::store::StorageError;

/// The main error type for amlgraph operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries every diagnostic produced by the parser,
/// each with its error code and byte offset, so callers can render them
/// individually.
#[derive(Debug, Error)]
pub enum AmlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("input file `{}` does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("{err}")]
    Parse {
        err: ParseError,
        path: Option<PathBuf>,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Query error: {0}")]
    Query(String),
}

impl From<rusqlite::Error> for AmlError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(error))
    }
}

impl AmlError {
    /// Create a new `Parse` error for the document at `path`, if known.
    pub fn new_parse_error(err: ParseError, path: Option<PathBuf>) -> Self {
        Self::Parse { err, path }
    }
}
