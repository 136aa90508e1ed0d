//! Error taxonomy for a kubeglob run.
//!
//! Every variant is terminal for the file (or the whole run) it was raised for;
//! nothing here is retried. Per-file variants carry the path they refer to so the
//! CLI can report which manifest broke.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::contract::StoreError;

#[derive(Debug, Error)]
pub enum ApplyError {
    /// The glob did not compile. Raised before any filesystem access.
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("failed to create resource from {}: {source}", .path.display())]
    Submit {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl ApplyError {
    /// The file or directory the error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ApplyError::Pattern { .. } => None,
            ApplyError::Walk { path, .. }
            | ApplyError::Read { path, .. }
            | ApplyError::Decode { path, .. }
            | ApplyError::Submit { path, .. } => Some(path),
        }
    }
}

/// Why a byte buffer could not become a resource document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document root must be a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("metadata must be a mapping, found {0}")]
    MetadataNotAMapping(&'static str),
}

pub type ApplyResult<T> = Result<T, ApplyError>;
