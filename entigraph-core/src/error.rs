//! Error types for entity discovery and parsing.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, EntityError>;

/// Everything that can abort entity discovery, parsing or reference extraction.
///
/// Malformed markdown is never an error: missing headings or sections
/// degrade to defaults. Only I/O and path problems end up here.
#[derive(Error, Debug)]
pub enum EntityError {
    /// A category directory exists but could not be listed.
    #[error("failed to scan {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The file could not be read or is not valid UTF-8.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not live under the repository root.
    #[error("{} is not inside entity root {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// The file name has no usable stem.
    #[error("cannot derive an entity id from {}", .0.display())]
    InvalidPath(PathBuf),

    /// The cross-reference pattern failed to compile.
    #[error("invalid reference pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl EntityError {
    /// Wraps an I/O error with the offending path.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Path of the file or directory involved, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Discovery { path, .. }
            | Self::Io { path, .. }
            | Self::OutsideRoot { path, .. }
            | Self::InvalidPath(path) => Some(path),
            Self::Pattern(_) => None,
        }
    }
}
