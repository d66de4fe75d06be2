use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

use crate::backend::Backend;
use crate::entry::{MetadataRequest, TypeHint};
use crate::enumerator::Enumerator;
use crate::error::ScanError;
use crate::sys::OsBackend;

// ---------------------------------------------------------------------------
// OnError
// ---------------------------------------------------------------------------

/// What a [`Walker`] does when a nested directory fails to open.
///
/// Errors on the walk's *root* always surface from the first pull,
/// regardless of this setting — there is no partial traversal to preserve.
#[derive(Default)]
pub enum OnError {
    /// Skip the failing subtree silently and keep walking.
    #[default]
    Ignore,

    /// Yield the error where that directory's record would have been, and
    /// end the walk.
    Raise,

    /// Invoke the handler with the error (which carries the offending path,
    /// see [`ScanError::path`]) and keep walking.
    Callback(Box<dyn FnMut(&ScanError)>),
}

impl OnError {
    /// Shorthand for [`OnError::Callback`].
    pub fn callback(f: impl FnMut(&ScanError) + 'static) -> OnError {
        OnError::Callback(Box::new(f))
    }
}

impl fmt::Debug for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnError::Ignore => f.write_str("Ignore"),
            OnError::Raise => f.write_str("Raise"),
            OnError::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// WalkRecord / DirNames
// ---------------------------------------------------------------------------

/// One visited directory: its path, its subdirectory names, and its
/// non-directory names, in native enumeration order.
///
/// The record holds no native handle and may be kept for as long as the
/// caller likes.
#[derive(Debug, Clone)]
pub struct WalkRecord {
    /// The directory this record describes.
    pub path: PathBuf,

    /// Subdirectory names. In a pre-order walk this is a live handle: edit
    /// it before the next pull and the walker recurses into exactly the
    /// names that remain, in their current order. See [`DirNames`].
    pub dirs: DirNames,

    /// Non-directory entry names (files, symlinks, devices, ...).
    pub files: Vec<String>,
}

/// A subdirectory-name list shared between a [`WalkRecord`] and the walker
/// that produced it.
///
/// The walker re-reads the list *after* yielding the record, so clearing,
/// filtering, or reordering it between pulls prunes or reorders the
/// traversal with no separate control channel:
///
/// ```no_run
/// # fn main() -> Result<(), dirscan::ScanError> {
/// for record in dirscan::walk("/var/data") {
///     let record = record?;
///     // Never descend into VCS metadata.
///     record.dirs.retain(|name| name != ".git");
/// }
/// # Ok(())
/// # }
/// ```
///
/// In a post-order walk the children were visited before the record is
/// yielded, so mutation no longer influences traversal.
#[derive(Clone, Default)]
pub struct DirNames(Rc<RefCell<Vec<String>>>);

impl DirNames {
    fn new(names: Vec<String>) -> DirNames {
        DirNames(Rc::new(RefCell::new(names)))
    }

    /// A snapshot of the current names.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Replace the list wholesale — reorder, drop, or (rarely) add names.
    pub fn set(&self, names: Vec<String>) {
        *self.0.borrow_mut() = names;
    }

    /// Keep only the names the predicate accepts.
    pub fn retain(&self, mut f: impl FnMut(&str) -> bool) {
        self.0.borrow_mut().retain(|name| f(name));
    }

    /// Drop every name: the walker will not descend below this directory.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Sort the names, making descent order deterministic.
    pub fn sort(&self) {
        self.0.borrow_mut().sort();
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl fmt::Debug for DirNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.borrow().fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// A recursive, depth-first walk yielding one [`WalkRecord`] per directory.
///
/// Created via [`walk()`](crate::walk). Each directory level is realized
/// eagerly through one enumeration pass — entries are partitioned on the
/// free type hint alone, with a single metadata query as the rare-path
/// fallback for [`TypeHint::Unknown`] — and the level's native cursor is
/// released *before* its record is yielded. Open handles are therefore
/// bounded by tree depth, never by breadth, and a record never keeps a
/// handle alive.
///
/// Symbolic links are classified by their own type and never descended
/// into.
pub struct Walker<B: Backend = OsBackend> {
    backend: B,
    root: Option<PathBuf>,
    top_down: bool,
    on_error: OnError,
    // Pre-order: the subdirectory list of the last yielded record, re-read
    // (possibly mutated by the consumer) on the next pull.
    pending: Option<(PathBuf, DirNames)>,
    stack: Vec<Frame>,
    // Post-order: records held back until their children have been yielded.
    post: Vec<PostFrame>,
    done: bool,
}

struct Frame {
    base: PathBuf,
    names: std::vec::IntoIter<String>,
}

struct PostFrame {
    record: WalkRecord,
    names: std::vec::IntoIter<String>,
}

impl<B: Backend> Walker<B> {
    /// Walk `path` over an explicit backend. Construction does no I/O; the
    /// root is opened on the first pull.
    pub fn with_backend(path: impl Into<PathBuf>, backend: B) -> Walker<B> {
        Walker {
            backend,
            root: Some(path.into()),
            top_down: true,
            on_error: OnError::Ignore,
            pending: None,
            stack: Vec::new(),
            post: Vec::new(),
            done: false,
        }
    }

    /// Pre-order (`true`, the default) yields a directory before its
    /// children; post-order (`false`) yields children first. Subdirectory
    /// mutation only steers traversal in pre-order.
    pub fn top_down(mut self, yes: bool) -> Self {
        self.top_down = yes;
        self
    }

    /// Set the policy for nested directories that fail to open.
    pub fn on_error(mut self, mode: OnError) -> Self {
        self.on_error = mode;
        self
    }

    fn next_pre(&mut self) -> Option<Result<WalkRecord, ScanError>> {
        if let Some(root) = self.root.take() {
            return match scan_level(&self.backend, &root) {
                Ok(record) => {
                    self.pending = Some((root, record.dirs.clone()));
                    Some(Ok(record))
                }
                // Root errors bypass on_error: always surfaced.
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            };
        }

        if let Some((base, dirs)) = self.pending.take() {
            // Re-read after the consumer had its chance to prune/reorder.
            let names = dirs.to_vec();
            if !names.is_empty() {
                self.stack.push(Frame {
                    base,
                    names: names.into_iter(),
                });
            }
        }

        loop {
            let (base, name) = {
                let frame = self.stack.last_mut()?;
                match frame.names.next() {
                    Some(name) => (frame.base.clone(), name),
                    None => {
                        self.stack.pop();
                        continue;
                    }
                }
            };

            let path = base.join(&name);
            match scan_level(&self.backend, &path) {
                Ok(record) => {
                    self.pending = Some((path, record.dirs.clone()));
                    return Some(Ok(record));
                }
                Err(e) => match &mut self.on_error {
                    OnError::Ignore => {
                        debug!("skipping {}: {e}", path.display());
                        continue;
                    }
                    OnError::Raise => {
                        self.done = true;
                        return Some(Err(e));
                    }
                    OnError::Callback(handler) => {
                        handler(&e);
                        continue;
                    }
                },
            }
        }
    }

    fn next_post(&mut self) -> Option<Result<WalkRecord, ScanError>> {
        if let Some(root) = self.root.take() {
            match scan_level(&self.backend, &root) {
                Ok(record) => {
                    let names = record.dirs.to_vec();
                    self.post.push(PostFrame {
                        record,
                        names: names.into_iter(),
                    });
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        loop {
            let descend = {
                let top = self.post.last_mut()?;
                top.names.next().map(|name| top.record.path.join(name))
            };

            let path = match descend {
                Some(path) => path,
                None => {
                    // Children exhausted: the held-back parent is next.
                    let frame = self.post.pop()?;
                    return Some(Ok(frame.record));
                }
            };

            match scan_level(&self.backend, &path) {
                Ok(record) => {
                    let names = record.dirs.to_vec();
                    self.post.push(PostFrame {
                        record,
                        names: names.into_iter(),
                    });
                }
                Err(e) => match &mut self.on_error {
                    OnError::Ignore => debug!("skipping {}: {e}", path.display()),
                    OnError::Raise => {
                        self.done = true;
                        return Some(Err(e));
                    }
                    OnError::Callback(handler) => handler(&e),
                },
            }
        }
    }
}

impl<B: Backend> Iterator for Walker<B> {
    type Item = Result<WalkRecord, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.top_down {
            self.next_pre()
        } else {
            self.next_post()
        }
    }
}

// ---------------------------------------------------------------------------
// One directory level
// ---------------------------------------------------------------------------

/// Enumerate one directory to completion and partition its entries.
///
/// Partitioning uses only the free type hint; an `Unknown` hint costs one
/// metadata query for that entry alone. The enumeration cursor is dropped
/// before the record is returned, keeping handle lifetime strictly
/// per-level.
fn scan_level<B: Backend>(backend: &B, path: &Path) -> Result<WalkRecord, ScanError> {
    debug!("walking {}", path.display());

    let enumerator =
        Enumerator::with_backend(backend, path, None, None, MetadataRequest::TypeOnly)?;

    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for res in enumerator {
        let entry = res?;
        let hint = match entry.type_hint {
            TypeHint::Unknown => match backend.query(&path.join(&entry.name)) {
                Ok((hint, _)) => hint,
                // Can't descend into something we can't classify; list it
                // with the files and move on.
                Err(e) => {
                    debug!("type fallback failed for {}/{}: {e}", path.display(), entry.name);
                    TypeHint::Other
                }
            },
            hint => hint,
        };

        if hint == TypeHint::Dir {
            dirs.push(entry.name);
        } else {
            files.push(entry.name);
        }
    }

    Ok(WalkRecord {
        path: path.to_path_buf(),
        dirs: DirNames::new(dirs),
        files,
    })
}
