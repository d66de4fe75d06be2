use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    // Opening a directory
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("access denied: {0}")]
    AccessDenied(PathBuf),

    // Mid-iteration native failure, distinct from clean exhaustion
    #[error("enumeration failed in {path}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Supplemental per-entry query failed
    #[error("metadata query failed for {path}")]
    MetadataQuery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Config
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

impl ScanError {
    /// The path this error occurred at, if applicable.
    /// Callers use this to present "skipped: <path>" without pattern matching on variants.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::NotADirectory(p)
            | Self::AccessDenied(p)
            | Self::Enumeration { path: p, .. }
            | Self::MetadataQuery { path: p, .. } => Some(p),
            Self::InvalidPattern(_) => None,
        }
    }

    /// The native error code carried by this error, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Enumeration { source, .. } | Self::MetadataQuery { source, .. } => {
                source.raw_os_error()
            }
            _ => None,
        }
    }

    /// Translate a native error from opening a directory cursor into the
    /// taxonomy. Anything without a dedicated variant stays an
    /// [`Enumeration`](Self::Enumeration) error carrying the native code.
    pub(crate) fn from_open(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::AccessDenied(path.to_path_buf()),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path.to_path_buf()),
            _ => Self::Enumeration {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}
