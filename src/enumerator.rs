use std::path::{Path, PathBuf};

use log::trace;

use crate::backend::Backend;
use crate::entry::{Entry, MetadataRequest, TypeHint};
use crate::error::ScanError;
use crate::filter::NameFilter;
use crate::sys::OsBackend;

// ---------------------------------------------------------------------------
// Enumerator
// ---------------------------------------------------------------------------

/// A lazy, forward-only pass over one directory's entries.
///
/// Created via [`scan()`](crate::scan). Wraps the platform's native scan
/// cursor and yields [`Entry`] values in exactly the order the native call
/// reports them (implementation-defined, not sorted). `.` and `..` are
/// filtered out before any name filter runs.
///
/// The cursor is released exactly once — on exhaustion, on a mid-iteration
/// error, on [`close()`](Enumerator::close), or on drop — so breaking out
/// of a `for` loop early never leaks a native handle.
///
/// Metadata population follows the request made on the builder: free fields
/// always, plus at most one supplemental query per entry, and only when a
/// requested field is not free on this platform. A failed supplemental
/// query is yielded as [`ScanError::MetadataQuery`] in that entry's
/// position; the entries after it are still reachable.
pub struct Enumerator<B: Backend = OsBackend> {
    backend: B,
    cursor: Option<B::Cursor>,
    path: PathBuf,
    filter: Option<Box<dyn NameFilter>>,
    needs_query: bool,
}

impl<B: Backend> Enumerator<B> {
    /// Open an enumeration of `path` over an explicit backend.
    ///
    /// `pattern` is pushed into the native call when the backend supports
    /// it; `filter` (when present) is applied per entry in software. The
    /// builder guarantees at most one of the two is set.
    pub(crate) fn with_backend(
        backend: B,
        path: &Path,
        pattern: Option<&str>,
        filter: Option<Box<dyn NameFilter>>,
        request: MetadataRequest,
    ) -> Result<Enumerator<B>, ScanError> {
        // Decided once per directory, never per entry: the sentinel request
        // is always satisfied by the type hint, and a field request costs a
        // query only if the platform doesn't supply it for free.
        let needs_query = match request {
            MetadataRequest::TypeOnly => false,
            MetadataRequest::Fields(set) => !backend.free_fields().contains(set),
        };

        let cursor = backend.open(path, pattern)?;
        trace!("opened enumeration of {}", path.display());

        Ok(Enumerator {
            backend,
            cursor: Some(cursor),
            path: path.to_path_buf(),
            filter,
            needs_query,
        })
    }

    /// The directory being enumerated.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the native cursor. Idempotent; iteration after `close()`
    /// yields nothing. Dropping the enumerator has the same effect.
    pub fn close(&mut self) {
        if self.cursor.take().is_some() {
            trace!("closed enumeration of {}", self.path.display());
        }
    }
}

impl<B: Backend> Iterator for Enumerator<B> {
    type Item = Result<Entry, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = self.cursor.as_mut()?;

            let raw = match self.backend.advance(cursor) {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    self.close();
                    return None;
                }
                Err(e) => {
                    self.close();
                    return Some(Err(e));
                }
            };

            // The self/parent markers never reach the consumer, nor the
            // name filter.
            if raw.name == "." || raw.name == ".." {
                continue;
            }

            if let Some(filter) = &self.filter {
                if !filter.is_match(&raw.name) {
                    continue;
                }
            }

            let mut entry = Entry {
                name: raw.name,
                type_hint: raw.type_hint,
                metadata: raw.metadata,
            };

            if self.needs_query {
                match self.backend.query(&self.path.join(&entry.name)) {
                    Ok((hint, meta)) => {
                        entry.metadata.fill_from(meta);
                        if entry.type_hint == TypeHint::Unknown {
                            entry.type_hint = hint;
                        }
                    }
                    // Attached to this entry's position; the cursor stays
                    // open and the next pull continues the enumeration.
                    Err(e) => return Some(Err(e)),
                }
            }

            return Some(Ok(entry));
        }
    }
}
