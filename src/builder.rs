use std::path::PathBuf;

use crate::backend::Backend;
use crate::entry::{FieldSet, MetadataRequest};
use crate::enumerator::Enumerator;
use crate::error::ScanError;
use crate::filter::{native_compatible, GlobFilter, NameFilter};
use crate::lister::Lister;
use crate::sys::OsBackend;

// ---------------------------------------------------------------------------
// ScanBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring a single-directory enumeration.
///
/// Created via [`scan()`](crate::scan). Configure with chained builder
/// methods, then call [`entries()`](ScanBuilder::entries) for a full
/// [`Enumerator`] or [`names()`](ScanBuilder::names) for a names-only
/// [`Lister`].
///
/// # Example
///
/// ```rust,no_run
/// use dirscan::{FieldSet, MetadataRequest};
///
/// # fn main() -> Result<(), dirscan::ScanError> {
/// let entries = dirscan::scan("/var/log")
///     .pattern("*.log")
///     .metadata(MetadataRequest::Fields(FieldSet::SIZE | FieldSet::MODIFIED))
///     .entries()?;
///
/// for entry in entries {
///     let entry = entry?;
///     println!("{} {:?}", entry.name, entry.metadata.size);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ScanBuilder<B: Backend = OsBackend> {
    path: PathBuf,
    backend: B,
    pattern: Option<String>,
    filter: Option<Box<dyn NameFilter>>,
    request: MetadataRequest,
}

impl ScanBuilder<OsBackend> {
    pub(crate) fn new(path: PathBuf) -> ScanBuilder<OsBackend> {
        ScanBuilder {
            path,
            backend: OsBackend,
            pattern: None,
            filter: None,
            request: MetadataRequest::TypeOnly,
        }
    }
}

impl<B: Backend> ScanBuilder<B> {
    // ── Backend ───────────────────────────────────────────────────────────

    /// Substitute the platform backend.
    ///
    /// Primarily for testing: an in-memory [`Backend`] lets the enumeration
    /// and walking logic run against a fabricated tree, with native calls
    /// counted or made to fail on demand.
    pub fn backend<B2: Backend>(self, backend: B2) -> ScanBuilder<B2> {
        ScanBuilder {
            path: self.path,
            backend,
            pattern: self.pattern,
            filter: self.filter,
            request: self.request,
        }
    }

    // ── Filtering ─────────────────────────────────────────────────────────

    /// Keep only names matching a shell-glob pattern (`?` one character,
    /// `*` any run, `[...]` classes). Case sensitivity follows platform
    /// convention. Matching is name-based and type-agnostic.
    ///
    /// Where the platform enumeration call supports wildcards natively and
    /// the pattern uses only `*`/`?`, the pattern is pushed into the native
    /// call; otherwise it is matched in software. The two are behaviorally
    /// indistinguishable.
    ///
    /// Replaces any previously set pattern or filter.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self.filter = None;
        self
    }

    /// Keep only names accepted by a custom predicate. Plain closures work:
    /// `.filter(|name: &str| !name.starts_with('.'))`.
    ///
    /// Replaces any previously set pattern or filter.
    pub fn filter(mut self, f: impl NameFilter + 'static) -> Self {
        self.filter = Some(Box::new(f));
        self.pattern = None;
        self
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    /// What metadata to populate on each entry. Defaults to
    /// [`MetadataRequest::TypeOnly`], which never costs a per-entry query.
    pub fn metadata(mut self, request: MetadataRequest) -> Self {
        self.request = request;
        self
    }

    /// Shorthand for `.metadata(MetadataRequest::Fields(fields))`.
    pub fn fields(self, fields: FieldSet) -> Self {
        self.metadata(MetadataRequest::Fields(fields))
    }

    // ── Finishers ─────────────────────────────────────────────────────────

    /// Open the enumeration.
    ///
    /// # Errors
    ///
    /// [`ScanError::NotFound`], [`ScanError::NotADirectory`], or
    /// [`ScanError::AccessDenied`] from opening the directory;
    /// [`ScanError::InvalidPattern`] if the glob does not compile.
    pub fn entries(self) -> Result<Enumerator<B>, ScanError> {
        let (native, software): (Option<String>, Option<Box<dyn NameFilter>>) =
            match (self.pattern, self.filter) {
                (Some(pattern), _)
                    if self.backend.supports_native_filter() && native_compatible(&pattern) =>
                {
                    (Some(pattern), None)
                }
                (Some(pattern), _) => (None, Some(Box::new(GlobFilter::new(&pattern)?))),
                (None, filter) => (None, filter),
            };

        Enumerator::with_backend(
            self.backend,
            &self.path,
            native.as_deref(),
            software,
            self.request,
        )
    }

    /// Open a names-only listing — the metadata extraction is dropped
    /// entirely.
    ///
    /// # Errors
    ///
    /// Same as [`entries()`](ScanBuilder::entries); a lister has no failure
    /// modes of its own.
    pub fn names(self) -> Result<Lister<B>, ScanError> {
        self.entries().map(Lister::new)
    }
}
