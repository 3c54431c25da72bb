//! Saved search error types

use std::path::PathBuf;

use thiserror::Error;

use crate::filter::FilterError;

#[derive(Error, Debug)]
pub enum SavedSearchError {
    #[error("Saved search not found: {0}")]
    NotFound(String),

    #[error("Cannot save an empty filter")]
    EmptyFilter,

    #[error("Invalid saved search name: {0}")]
    InvalidName(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt saved searches file {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },
}
