use std::ops::BitOr;

/// A single directory entry produced by an [`Enumerator`](crate::Enumerator).
///
/// `name` is the entry's own name, never a joined path, and never `.` or
/// `..` — those are filtered out before an entry is surfaced. `metadata` is
/// a sparse record: the fields populated are exactly those the native
/// enumeration call supplied for free, plus any the caller explicitly asked
/// for via a [`MetadataRequest`]. This avoids a `stat()` syscall per entry
/// when nothing beyond the type hint is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The entry's name within its directory.
    pub name: String,

    /// What the enumeration call said this entry is.
    pub type_hint: TypeHint,

    /// Partially-populated metadata. See [`Metadata`].
    pub metadata: Metadata,
}

impl Entry {
    /// Whether the type hint says this is a directory.
    pub fn is_dir(&self) -> bool {
        self.type_hint == TypeHint::Dir
    }

    /// Whether the type hint says this is a regular file.
    pub fn is_file(&self) -> bool {
        self.type_hint == TypeHint::File
    }
}

/// The file/directory classification reported by the enumeration call.
///
/// `Unknown` appears only on platforms or filesystems where the native hint
/// is unreliable (e.g. `DT_UNKNOWN` on some network filesystems) and tells
/// the consumer to fall back to an explicit metadata query. Symbolic links
/// are reported with the link's own type — the enumeration layer never adds
/// a resolution step of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link (not followed).
    Symlink,

    /// Anything else (device files, pipes, sockets, etc.).
    Other,

    /// The platform could not say. Resolve with a metadata query.
    Unknown,
}

/// Sparse per-entry metadata.
///
/// Timestamps are seconds since the Unix epoch as `f64`, matching the
/// resolution the native calls provide. A `None` field was neither free on
/// this platform nor requested.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metadata {
    /// Size in bytes.
    pub size: Option<u64>,

    /// Last modification time.
    pub modified: Option<f64>,

    /// Last access time.
    pub accessed: Option<f64>,

    /// Creation time, where the platform records one.
    pub created: Option<f64>,
}

impl Metadata {
    /// Fill any unpopulated fields from `other`, keeping existing values.
    pub(crate) fn fill_from(&mut self, other: Metadata) {
        self.size = self.size.or(other.size);
        self.modified = self.modified.or(other.modified);
        self.accessed = self.accessed.or(other.accessed);
        self.created = self.created.or(other.created);
    }
}

/// A set of metadata field names.
///
/// Used both as the caller's request ("populate these") and as a backend
/// capability flag ("these come free with enumeration").
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet(u8);

impl FieldSet {
    /// The empty set.
    pub const NONE: FieldSet = FieldSet(0);
    /// File size.
    pub const SIZE: FieldSet = FieldSet(1 << 0);
    /// Modification time.
    pub const MODIFIED: FieldSet = FieldSet(1 << 1);
    /// Access time.
    pub const ACCESSED: FieldSet = FieldSet(1 << 2);
    /// Creation time.
    pub const CREATED: FieldSet = FieldSet(1 << 3);
    /// Every field.
    pub const ALL: FieldSet = FieldSet(0b1111);

    /// Whether every field in `other` is also in `self`.
    pub fn contains(self, other: FieldSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the set is empty.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FieldSet {
    type Output = FieldSet;

    fn bitor(self, rhs: FieldSet) -> FieldSet {
        FieldSet(self.0 | rhs.0)
    }
}

impl std::fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut set = f.debug_set();
        for (bit, name) in [
            (FieldSet::SIZE, "size"),
            (FieldSet::MODIFIED, "modified"),
            (FieldSet::ACCESSED, "accessed"),
            (FieldSet::CREATED, "created"),
        ] {
            if self.contains(bit) {
                set.entry(&name);
            }
        }
        set.finish()
    }
}

/// What metadata the caller wants populated on each entry.
///
/// Consulted once per directory, not per entry: the enumerator decides at
/// open time whether any supplemental per-entry query will be needed at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetadataRequest {
    /// Type hint only — the cheapest tier. Never triggers a supplemental
    /// query, on any platform. Free fields are still populated.
    #[default]
    TypeOnly,

    /// Populate the named fields. A supplemental per-entry query is issued
    /// only if some requested field is not already free on this platform.
    Fields(FieldSet),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fieldset_contains() {
        let set = FieldSet::SIZE | FieldSet::MODIFIED;
        assert!(set.contains(FieldSet::SIZE));
        assert!(set.contains(FieldSet::NONE));
        assert!(!set.contains(FieldSet::CREATED));
        assert!(FieldSet::ALL.contains(set));
        assert!(!FieldSet::NONE.contains(FieldSet::SIZE));
    }

    #[test]
    fn metadata_fill_keeps_existing() {
        let mut m = Metadata {
            size: Some(10),
            ..Metadata::default()
        };
        m.fill_from(Metadata {
            size: Some(99),
            modified: Some(1.5),
            ..Metadata::default()
        });
        assert_eq!(m.size, Some(10));
        assert_eq!(m.modified, Some(1.5));
        assert_eq!(m.accessed, None);
    }
}
