use std::path::Path;

use crate::backend::Backend;
use crate::enumerator::Enumerator;
use crate::error::ScanError;
use crate::sys::OsBackend;

/// A names-only view over an [`Enumerator`].
///
/// Created via [`list()`](crate::list). Drops metadata extraction entirely
/// and forwards errors unchanged; it has no failure modes of its own.
pub struct Lister<B: Backend = OsBackend> {
    inner: Enumerator<B>,
}

impl<B: Backend> Lister<B> {
    pub(crate) fn new(inner: Enumerator<B>) -> Lister<B> {
        Lister { inner }
    }

    /// The directory being listed.
    pub fn path(&self) -> &Path {
        self.inner.path()
    }
}

impl<B: Backend> std::fmt::Debug for Lister<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lister")
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Iterator for Lister<B> {
    type Item = Result<String, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|res| res.map(|entry| entry.name))
    }
}
