//! File-boundary errors.
//!
//! Malformed *content* never errors: the parser keeps every line and the
//! analyzers degrade to `None` plus feedback. Missing or unreadable *files*
//! are an environment precondition the caller must fix, so those surface
//! as explicit errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NwctxtError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
