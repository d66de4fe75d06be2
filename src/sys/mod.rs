//! Platform backends.
//! This module hides OS differences (Unix/Windows) behind the [`Backend`]
//! contract so the rest of the crate stays platform-agnostic.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::entry::{Metadata, TypeHint};
use crate::error::ScanError;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::OsBackend;
#[cfg(windows)]
pub use windows::OsBackend;

/// Supplemental metadata query, shared by both backends.
///
/// Uses `symlink_metadata` so a symlink is reported with its own type,
/// matching what the enumeration calls hand back.
pub(crate) fn query_path(path: &Path) -> Result<(TypeHint, Metadata), ScanError> {
    let meta = std::fs::symlink_metadata(path).map_err(|source| ScanError::MetadataQuery {
        path: path.to_path_buf(),
        source,
    })?;

    let ft = meta.file_type();
    let hint = if ft.is_symlink() {
        TypeHint::Symlink
    } else if ft.is_dir() {
        TypeHint::Dir
    } else if ft.is_file() {
        TypeHint::File
    } else {
        TypeHint::Other
    };

    Ok((
        hint,
        Metadata {
            size: Some(meta.len()),
            modified: meta.modified().ok().map(epoch_secs),
            accessed: meta.accessed().ok().map(epoch_secs),
            created: meta.created().ok().map(epoch_secs),
        },
    ))
}

/// Seconds since the Unix epoch, negative for pre-epoch timestamps.
pub(crate) fn epoch_secs(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}
