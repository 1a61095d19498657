//! SQLite store of a resolved graph.
//!
//! [`materialize`] writes one row per entity, with foreign keys mirroring
//! the graph's handles and row ids derived from arena positions, so two
//! imports of the same document produce identical tables. The store is
//! replaced as a whole: a failed import never leaves a partial store behind.

mod materialize;
mod schema;

pub use materialize::materialize;

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure while writing or opening the store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to move store into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("store `{}` does not exist", .0.display())]
    MissingStore(PathBuf),
}
