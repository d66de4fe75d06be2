//! # dirscan
//!
//! Fast directory listing and recursive walking — keeps the metadata the OS
//! already gave you.
//!
//! Native directory enumeration reports each entry's type (and, on Windows,
//! its size and timestamps) as part of the scan call itself. A naive walk
//! throws that away and re-queries it with a `stat` per entry, multiplying
//! the syscall count by the size of the tree. dirscan keeps the free
//! information: listing a directory costs one open, one advance per entry,
//! and one close — nothing per-entry unless you explicitly ask for a field
//! the platform didn't supply.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! # fn main() -> Result<(), dirscan::ScanError> {
//! // Lazy listing of one directory's names.
//! for name in dirscan::list("/etc")? {
//!     println!("{}", name?);
//! }
//!
//! // Entries with type hints, filtered by a glob.
//! for entry in dirscan::scan("/var/log").pattern("*.log").entries()? {
//!     let entry = entry?;
//!     println!("{} dir={}", entry.name, entry.is_dir());
//! }
//!
//! // Recursive walk, pruning as we go.
//! for record in dirscan::walk("/home") {
//!     let record = record?;
//!     record.dirs.retain(|name| !name.starts_with('.'));
//!     println!("{}: {} files", record.path.display(), record.files.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Metadata policy
//!
//! By default every entry carries a type hint plus whatever else was
//! incidentally free (everything on Windows, nothing extra on Unix). Ask
//! for specific fields with [`MetadataRequest::Fields`] and dirscan issues
//! at most one supplemental query per entry — and only on platforms where
//! the field isn't already free. [`MetadataRequest::TypeOnly`] is the
//! guaranteed-cheap tier: it never triggers a query anywhere.
//!
//! # Custom backends
//!
//! The native surface — open a scan cursor, advance it, query one path's
//! metadata — is the [`Backend`] trait. The built-in backends wrap
//! `opendir`/`readdir` (Unix) and `FindFirstFileW`/`FindNextFileW`
//! (Windows); tests substitute instrumented in-memory backends via
//! [`ScanBuilder::backend`] and [`Walker::with_backend`].

pub mod backend;

mod builder;
mod entry;
mod enumerator;
mod error;
mod filter;
mod lister;
mod sys;
mod walker;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use backend::{Backend, RawEntry};
pub use builder::ScanBuilder;
pub use entry::{Entry, FieldSet, Metadata, MetadataRequest, TypeHint};
pub use enumerator::Enumerator;
pub use error::ScanError;
pub use filter::{GlobFilter, NameFilter};
pub use lister::Lister;
pub use sys::OsBackend;
pub use walker::{DirNames, OnError, WalkRecord, Walker};

// ── Entry points ──────────────────────────────────────────────────────────────

use std::path::Path;

/// Create a [`ScanBuilder`] for one directory's entries.
///
/// Configure filtering and metadata, then finish with
/// [`entries()`](ScanBuilder::entries) or [`names()`](ScanBuilder::names).
pub fn scan(path: impl Into<std::path::PathBuf>) -> ScanBuilder {
    ScanBuilder::new(path.into())
}

/// Lazily list one directory's entry names.
///
/// Equivalent to `scan(path).names()`. Never yields the `.`/`..` markers.
///
/// # Errors
///
/// [`ScanError::NotFound`], [`ScanError::NotADirectory`], or
/// [`ScanError::AccessDenied`] if `path` cannot be opened.
pub fn list(path: impl AsRef<Path>) -> Result<Lister, ScanError> {
    scan(path.as_ref().to_path_buf()).names()
}

/// Walk a directory tree, yielding one [`WalkRecord`] per directory.
///
/// Pre-order by default; configure with [`Walker::top_down`] and
/// [`Walker::on_error`] before iterating. Construction does no I/O — an
/// unopenable root surfaces as an error from the first pull, regardless of
/// the error mode.
pub fn walk(path: impl Into<std::path::PathBuf>) -> Walker {
    Walker::with_backend(path, OsBackend)
}
