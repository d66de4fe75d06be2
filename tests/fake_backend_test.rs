//! The behavioral contract run against an instrumented in-memory backend:
//! call counting proves the metadata economy (no supplemental queries
//! unless a requested field isn't free) and handle balance (every open
//! cursor is closed, including on abandonment), and injected failures
//! exercise the walker's error modes without needing real permission
//! tricks.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Mutex;

use dirscan::{Backend, FieldSet, Metadata, OnError, RawEntry, ScanError, TypeHint, Walker};

// ---------------------------------------------------------------------------
// FakeBackend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Counters {
    opens: Cell<usize>,
    closes: Cell<usize>,
    queries: Cell<usize>,
}

/// An in-memory tree. Directory listings include the `.`/`..` markers the
/// real platforms report, so the tests prove they are filtered out.
#[derive(Default)]
struct FakeBackend {
    tree: BTreeMap<PathBuf, Vec<RawEntry>>,
    meta: BTreeMap<PathBuf, (TypeHint, Metadata)>,
    free: FieldSet,
    deny: BTreeSet<PathBuf>,
    // Path -> advance() fails after this many entries.
    fail_after: BTreeMap<PathBuf, usize>,
    counters: Rc<Counters>,
}

struct FakeCursor {
    entries: std::vec::IntoIter<RawEntry>,
    served: usize,
    fail_after: Option<usize>,
    path: PathBuf,
    counters: Rc<Counters>,
}

impl Drop for FakeCursor {
    fn drop(&mut self) {
        self.counters.closes.set(self.counters.closes.get() + 1);
    }
}

impl Backend for FakeBackend {
    type Cursor = FakeCursor;

    fn free_fields(&self) -> FieldSet {
        self.free
    }

    fn open(&self, path: &Path, _pattern: Option<&str>) -> Result<FakeCursor, ScanError> {
        if self.deny.contains(path) {
            return Err(ScanError::AccessDenied(path.to_path_buf()));
        }
        let entries = match self.tree.get(path) {
            Some(entries) => entries.clone(),
            None => return Err(ScanError::NotFound(path.to_path_buf())),
        };
        self.counters.opens.set(self.counters.opens.get() + 1);
        Ok(FakeCursor {
            entries: entries.into_iter(),
            served: 0,
            fail_after: self.fail_after.get(path).copied(),
            path: path.to_path_buf(),
            counters: Rc::clone(&self.counters),
        })
    }

    fn advance(&self, cursor: &mut FakeCursor) -> Result<Option<RawEntry>, ScanError> {
        if let Some(limit) = cursor.fail_after {
            if cursor.served >= limit {
                return Err(ScanError::Enumeration {
                    path: cursor.path.clone(),
                    source: io::Error::other("injected native failure"),
                });
            }
        }
        cursor.served += 1;
        Ok(cursor.entries.next())
    }

    fn query(&self, path: &Path) -> Result<(TypeHint, Metadata), ScanError> {
        self.counters.queries.set(self.counters.queries.get() + 1);
        self.meta
            .get(path)
            .copied()
            .ok_or_else(|| ScanError::MetadataQuery {
                path: path.to_path_buf(),
                source: io::Error::other("no such fake entry"),
            })
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

fn raw(name: &str, hint: TypeHint) -> RawEntry {
    RawEntry {
        name: name.into(),
        type_hint: hint,
        metadata: Metadata::default(),
    }
}

fn markers() -> Vec<RawEntry> {
    vec![raw(".", TypeHint::Dir), raw("..", TypeHint::Dir)]
}

fn listing(entries: Vec<RawEntry>) -> Vec<RawEntry> {
    let mut all = markers();
    all.extend(entries);
    all
}

/// `/root/{a.txt, b.txt, sub/{c.txt}, empty/}`
fn fake_tree() -> FakeBackend {
    let mut backend = FakeBackend::default();
    backend.tree.insert(
        "/root".into(),
        listing(vec![
            raw("a.txt", TypeHint::File),
            raw("b.txt", TypeHint::File),
            raw("sub", TypeHint::Dir),
            raw("empty", TypeHint::Dir),
        ]),
    );
    backend
        .tree
        .insert("/root/sub".into(), listing(vec![raw("c.txt", TypeHint::File)]));
    backend.tree.insert("/root/empty".into(), listing(vec![]));
    backend
}

fn names(backend: FakeBackend, path: &str) -> Vec<String> {
    dirscan::scan(path)
        .backend(backend)
        .names()
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

fn walked_paths(walker: Walker<FakeBackend>) -> Vec<PathBuf> {
    walker.map(|r| r.unwrap().path).collect()
}

// ---------------------------------------------------------------------------
// Enumeration behavior
// ---------------------------------------------------------------------------

#[test]
fn dot_markers_never_surface() {
    let backend = fake_tree();
    let names = names(backend, "/root");
    assert_eq!(names, vec!["a.txt", "b.txt", "sub", "empty"]);
}

#[test]
fn software_pattern_fallback_filters() {
    // The fake reports no native filter support, so the glob runs in
    // software — behaviorally indistinguishable.
    let listed: Vec<String> = dirscan::scan("/root")
        .backend(fake_tree())
        .pattern("*.txt")
        .names()
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(listed, vec!["a.txt", "b.txt"]);
}

#[test]
fn enumeration_error_ends_the_sequence() {
    let mut backend = fake_tree();
    // Fail after the two markers plus two real entries.
    backend.fail_after.insert("/root".into(), 4);
    let counters = Rc::clone(&backend.counters);

    let results: Vec<_> = dirscan::scan("/root").backend(backend).names().unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok() && results[1].is_ok());
    assert!(matches!(results[2], Err(ScanError::Enumeration { .. })));
    assert_eq!(counters.closes.get(), 1, "cursor released on error");
}

// ---------------------------------------------------------------------------
// Metadata economy
// ---------------------------------------------------------------------------

#[test]
fn type_only_issues_zero_queries() {
    let backend = fake_tree();
    let counters = Rc::clone(&backend.counters);

    let walker = Walker::with_backend("/root", backend);
    assert_eq!(walked_paths(walker).len(), 3);
    assert_eq!(counters.queries.get(), 0, "walking must never stat");
}

#[test]
fn free_fields_satisfy_requests_without_queries() {
    let mut backend = fake_tree();
    backend.free = FieldSet::ALL;
    // Pretend the scan call supplied sizes, as Windows does.
    for entries in backend.tree.values_mut() {
        for e in entries.iter_mut() {
            e.metadata.size = Some(42);
        }
    }
    let counters = Rc::clone(&backend.counters);

    let entries: Vec<_> = dirscan::scan("/root")
        .backend(backend)
        .fields(FieldSet::SIZE)
        .entries()
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert!(entries.iter().all(|e| e.metadata.size == Some(42)));
    assert_eq!(counters.queries.get(), 0);
}

#[test]
fn missing_fields_cost_one_query_per_entry() {
    let mut backend = fake_tree();
    for name in ["a.txt", "b.txt", "sub", "empty"] {
        backend.meta.insert(
            PathBuf::from("/root").join(name),
            (
                TypeHint::File,
                Metadata {
                    size: Some(7),
                    ..Metadata::default()
                },
            ),
        );
    }
    let counters = Rc::clone(&backend.counters);

    let entries: Vec<_> = dirscan::scan("/root")
        .backend(backend)
        .fields(FieldSet::SIZE)
        .entries()
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.metadata.size == Some(7)));
    assert_eq!(counters.queries.get(), 4, "exactly one query per entry");
}

#[test]
fn failed_query_is_attached_to_its_entry() {
    let mut backend = fake_tree();
    // Only a.txt and sub/empty have metadata; b.txt's query will fail.
    for name in ["a.txt", "sub", "empty"] {
        backend
            .meta
            .insert(PathBuf::from("/root").join(name), (TypeHint::File, Metadata::default()));
    }

    let results: Vec<_> = dirscan::scan("/root")
        .backend(backend)
        .fields(FieldSet::SIZE)
        .entries()
        .unwrap()
        .collect();

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(
        matches!(&results[1], Err(ScanError::MetadataQuery { path, .. }) if path == Path::new("/root/b.txt"))
    );
    // The failure did not end the enumeration.
    assert!(results[2].is_ok() && results[3].is_ok());
}

// ---------------------------------------------------------------------------
// Unknown-hint fallback
// ---------------------------------------------------------------------------

#[test]
fn unknown_hint_resolved_with_a_single_query() {
    let mut backend = fake_tree();
    backend.tree.insert(
        "/root".into(),
        listing(vec![
            raw("a.txt", TypeHint::File),
            raw("mystery", TypeHint::Unknown),
        ]),
    );
    backend.tree.insert("/root/mystery".into(), listing(vec![]));
    backend
        .meta
        .insert("/root/mystery".into(), (TypeHint::Dir, Metadata::default()));
    let counters = Rc::clone(&backend.counters);

    let visited = walked_paths(Walker::with_backend("/root", backend));
    assert!(visited.contains(&PathBuf::from("/root/mystery")), "resolved as a directory");
    assert_eq!(counters.queries.get(), 1, "one query for the one unknown entry");
}

#[test]
fn unresolvable_unknown_is_listed_with_files() {
    let mut backend = fake_tree();
    backend.tree.insert(
        "/root".into(),
        listing(vec![raw("mystery", TypeHint::Unknown)]),
    );
    // No meta mapping: the fallback query fails.

    let records: Vec<_> = Walker::with_backend("/root", backend)
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].files, vec!["mystery"]);
}

// ---------------------------------------------------------------------------
// Error modes
// ---------------------------------------------------------------------------

fn denied_tree() -> FakeBackend {
    let mut backend = FakeBackend::default();
    backend.tree.insert(
        "/root".into(),
        listing(vec![
            raw("locked", TypeHint::Dir),
            raw("open", TypeHint::Dir),
        ]),
    );
    backend.tree.insert(
        "/root/locked".into(),
        listing(vec![raw("secret.txt", TypeHint::File)]),
    );
    backend.tree.insert("/root/open".into(), listing(vec![]));
    backend.deny.insert("/root/locked".into());
    backend
}

#[test]
fn ignore_mode_skips_only_the_denied_subtree() {
    let walker = Walker::with_backend("/root", denied_tree()).on_error(OnError::Ignore);
    let visited = walked_paths(walker);
    assert_eq!(visited, vec![PathBuf::from("/root"), PathBuf::from("/root/open")]);
}

#[test]
fn raise_mode_ends_the_walk_with_the_error() {
    let mut walker = Walker::with_backend("/root", denied_tree()).on_error(OnError::Raise);

    assert!(walker.next().unwrap().is_ok(), "root record first");
    assert!(matches!(
        walker.next(),
        Some(Err(ScanError::AccessDenied(p))) if p == Path::new("/root/locked")
    ));
    assert!(walker.next().is_none(), "nothing yielded past the failure");
}

#[test]
fn callback_mode_reports_and_continues() {
    let seen = Rc::new(Mutex::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let walker = Walker::with_backend("/root", denied_tree()).on_error(OnError::callback(
        move |err: &ScanError| {
            sink.lock().unwrap().push(err.path().unwrap().to_path_buf());
        },
    ));

    let visited = walked_paths(walker);
    assert_eq!(visited, vec![PathBuf::from("/root"), PathBuf::from("/root/open")]);
    assert_eq!(*seen.lock().unwrap(), vec![PathBuf::from("/root/locked")]);
}

#[test]
fn denied_root_errors_even_in_ignore_mode() {
    let mut backend = denied_tree();
    backend.deny.insert("/root".into());

    let mut walker = Walker::with_backend("/root", backend).on_error(OnError::Ignore);
    assert!(matches!(
        walker.next(),
        Some(Err(ScanError::AccessDenied(p))) if p == Path::new("/root")
    ));
    assert!(walker.next().is_none());
}

#[test]
fn postorder_over_the_fake_tree() {
    let visited = walked_paths(Walker::with_backend("/root", fake_tree()).top_down(false));
    assert_eq!(visited.last(), Some(&PathBuf::from("/root")), "root last");
    assert_eq!(visited.len(), 3);
}

// ---------------------------------------------------------------------------
// Handle lifecycle
// ---------------------------------------------------------------------------

#[test]
fn every_open_cursor_is_closed() {
    let backend = fake_tree();
    let counters = Rc::clone(&backend.counters);

    let visited = walked_paths(Walker::with_backend("/root", backend));
    assert_eq!(visited.len(), 3);
    assert_eq!(counters.opens.get(), 3);
    assert_eq!(counters.closes.get(), 3);
}

#[test]
fn abandoning_an_enumeration_releases_the_cursor() {
    let backend = fake_tree();
    let counters = Rc::clone(&backend.counters);

    {
        let mut lister = dirscan::scan("/root").backend(backend).names().unwrap();
        let _ = lister.next();
        // Early break: drop without exhausting.
    }

    assert_eq!(counters.opens.get(), 1);
    assert_eq!(counters.closes.get(), 1);
}
