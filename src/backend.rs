use std::path::Path;

use crate::entry::{FieldSet, Metadata, TypeHint};
use crate::error::ScanError;

/// What the core requires from the operating system: open a directory
/// cursor, advance it, and query full metadata for one path.
///
/// The two real backends diverge sharply: the Windows scan call returns
/// size and timestamps for free with every entry, while the Unix one
/// supplies only a type byte. [`free_fields`](Backend::free_fields) is the
/// capability flag that lets the enumerator decide — once per directory —
/// whether a requested field needs a supplemental per-entry query.
///
/// Backends yield entries exactly as the platform reports them, `.` and
/// `..` included; the enumerator filters those. A backend whose platform
/// cannot supply a reliable type bit reports [`TypeHint::Unknown`] and the
/// consumer falls back to [`query`](Backend::query) for that entry only.
///
/// Cursor release is RAII: `Cursor` types own the native handle and close
/// it in `Drop`, so abandonment on any exit path releases it exactly once.
pub trait Backend {
    /// The platform's directory-scanning cursor. Owns the native handle.
    type Cursor;

    /// The metadata fields the scan call populates for free.
    fn free_fields(&self) -> FieldSet;

    /// Whether `open` can apply a `*`/`?` wildcard pattern natively.
    fn supports_native_filter(&self) -> bool {
        false
    }

    /// Open a scanning cursor for `path`.
    ///
    /// `pattern` is only ever passed when
    /// [`supports_native_filter`](Backend::supports_native_filter) is true.
    ///
    /// # Errors
    ///
    /// [`ScanError::NotFound`], [`ScanError::NotADirectory`], or
    /// [`ScanError::AccessDenied`], per the native failure.
    fn open(&self, path: &Path, pattern: Option<&str>) -> Result<Self::Cursor, ScanError>;

    /// Advance the cursor. `Ok(None)` is clean exhaustion;
    /// [`ScanError::Enumeration`] is a mid-iteration native failure and
    /// carries the native code.
    fn advance(&self, cursor: &mut Self::Cursor) -> Result<Option<RawEntry>, ScanError>;

    /// Query full metadata for a single path — the fallback for fields the
    /// scan call did not supply. Does not follow symlinks.
    ///
    /// # Errors
    ///
    /// [`ScanError::MetadataQuery`] carrying the native error.
    fn query(&self, path: &Path) -> Result<(TypeHint, Metadata), ScanError>;
}

// One backend instance serves every level of a walk: the walker holds the
// backend by value and opens per-level enumerators through a borrow.
impl<B: Backend + ?Sized> Backend for &B {
    type Cursor = B::Cursor;

    fn free_fields(&self) -> FieldSet {
        (**self).free_fields()
    }

    fn supports_native_filter(&self) -> bool {
        (**self).supports_native_filter()
    }

    fn open(&self, path: &Path, pattern: Option<&str>) -> Result<Self::Cursor, ScanError> {
        (**self).open(path, pattern)
    }

    fn advance(&self, cursor: &mut Self::Cursor) -> Result<Option<RawEntry>, ScanError> {
        (**self).advance(cursor)
    }

    fn query(&self, path: &Path) -> Result<(TypeHint, Metadata), ScanError> {
        (**self).query(path)
    }
}

/// One entry as the native call reported it, before filtering.
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// The entry's name (may be `.` or `..` at this layer).
    pub name: String,

    /// The platform's classification of the entry.
    pub type_hint: TypeHint,

    /// Whatever metadata came free with the scan call.
    pub metadata: Metadata,
}
