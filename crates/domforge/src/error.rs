//! Error types for document loading.
//!
//! Only input availability can fail: everything inside the markup is
//! handled leniently by the tree builder and degrades to text nodes
//! instead of erroring.

use std::path::PathBuf;

use thiserror::Error;

/// Why a document could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input buffer held no bytes at all.
    #[error("input document is empty")]
    EmptyInput,

    /// The path does not exist, is not a regular file, or cannot be read.
    #[error("file not found or not readable: {0}")]
    FileUnreadable(PathBuf),

    /// An I/O error while reading or writing a document file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
