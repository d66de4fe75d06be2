use globset::{GlobBuilder, GlobMatcher};

use crate::error::ScanError;

/// Decides whether a directory entry's name passes the filter.
///
/// Implement this for custom filtering logic, or use a plain closure —
/// `Fn(&str) -> bool` implements `NameFilter` via the blanket impl. For the
/// common case of shell-glob patterns, use [`GlobFilter`] (or
/// [`ScanBuilder::pattern`](crate::ScanBuilder::pattern), which builds one).
///
/// Filtering is name-based and type-agnostic: a directory named `logs.txt`
/// passes a `*.txt` filter.
pub trait NameFilter {
    /// Returns `true` if an entry with this name should be yielded.
    fn is_match(&self, name: &str) -> bool;
}

impl<F: Fn(&str) -> bool> NameFilter for F {
    fn is_match(&self, name: &str) -> bool {
        self(name)
    }
}

/// Shell-glob name matching: `?` any one character, `*` any run of
/// characters, `[...]` character classes.
///
/// Case sensitivity follows platform convention — insensitive on Windows,
/// sensitive elsewhere.
#[derive(Debug, Clone)]
pub struct GlobFilter {
    matcher: GlobMatcher,
}

impl GlobFilter {
    /// Compile a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidPattern`] if the pattern does not compile
    /// (e.g. an unclosed character class).
    pub fn new(pattern: &str) -> Result<GlobFilter, ScanError> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .case_insensitive(cfg!(windows))
            .build()
            .map_err(|e| ScanError::InvalidPattern(e.to_string()))?;
        Ok(GlobFilter {
            matcher: glob.compile_matcher(),
        })
    }
}

impl NameFilter for GlobFilter {
    fn is_match(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }
}

/// Whether a glob pattern can be pushed into a native enumeration call.
///
/// Native wildcard matching (Win32 `FindFirstFileW`) understands only `*`
/// and `?`. Patterns using character classes or escapes must be matched in
/// software instead; the two strategies are indistinguishable to the caller.
pub(crate) fn native_compatible(pattern: &str) -> bool {
    !pattern.contains(['[', ']', '{', '}', '\\', '/'])
}
