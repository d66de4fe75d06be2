//! Unix backend: `opendir`/`readdir`/`closedir`.
//!
//! `readdir` supplies a `d_type` byte for free but no sizes or timestamps,
//! so the free-field set is empty and any requested field costs one `lstat`
//! per entry. Filesystems without `d_type` support report `DT_UNKNOWN`,
//! surfaced as [`TypeHint::Unknown`].

use std::ffi::{CStr, CString, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::backend::{Backend, RawEntry};
use crate::entry::{FieldSet, Metadata, TypeHint};
use crate::error::ScanError;

/// The real platform backend. Zero-sized; one instance serves any number
/// of enumerations.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsBackend;

/// An open `DIR` stream. Closed exactly once, on drop.
pub struct DirCursor {
    dir: *mut libc::DIR,
    path: PathBuf,
}

impl Drop for DirCursor {
    fn drop(&mut self) {
        // SAFETY: `dir` came from a successful opendir and is closed only here.
        unsafe {
            libc::closedir(self.dir);
        }
    }
}

impl Backend for OsBackend {
    type Cursor = DirCursor;

    fn free_fields(&self) -> FieldSet {
        FieldSet::NONE
    }

    fn open(&self, path: &Path, _pattern: Option<&str>) -> Result<DirCursor, ScanError> {
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            ScanError::Enumeration {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"),
            }
        })?;

        // SAFETY: c_path is a valid NUL-terminated string.
        let dir = unsafe { libc::opendir(c_path.as_ptr()) };
        if dir.is_null() {
            return Err(ScanError::from_open(path, io::Error::last_os_error()));
        }

        Ok(DirCursor {
            dir,
            path: path.to_path_buf(),
        })
    }

    fn advance(&self, cursor: &mut DirCursor) -> Result<Option<RawEntry>, ScanError> {
        clear_errno();

        // SAFETY: cursor.dir is open (cursors are never advanced after drop).
        let ent = unsafe { libc::readdir(cursor.dir) };
        if ent.is_null() {
            // NULL means either clean exhaustion or a native failure;
            // errno distinguishes the two.
            let err = io::Error::last_os_error();
            return match err.raw_os_error() {
                None | Some(0) => Ok(None),
                Some(_) => Err(ScanError::Enumeration {
                    path: cursor.path.clone(),
                    source: err,
                }),
            };
        }

        // SAFETY: a non-NULL dirent from readdir is valid until the next
        // call on this stream; both fields are copied out before returning.
        let (name, d_type) = unsafe {
            let name = CStr::from_ptr((*ent).d_name.as_ptr());
            (
                OsStr::from_bytes(name.to_bytes())
                    .to_string_lossy()
                    .into_owned(),
                (*ent).d_type,
            )
        };

        Ok(Some(RawEntry {
            name,
            type_hint: hint_from_dtype(d_type),
            metadata: Metadata::default(),
        }))
    }

    fn query(&self, path: &Path) -> Result<(TypeHint, Metadata), ScanError> {
        super::query_path(path)
    }
}

fn hint_from_dtype(d_type: u8) -> TypeHint {
    match d_type {
        libc::DT_DIR => TypeHint::Dir,
        libc::DT_REG => TypeHint::File,
        libc::DT_LNK => TypeHint::Symlink,
        libc::DT_UNKNOWN => TypeHint::Unknown,
        _ => TypeHint::Other,
    }
}

/// Reset errno so a NULL from `readdir` can be told apart from a real error.
fn clear_errno() {
    // SAFETY: writing 0 to the calling thread's errno location.
    unsafe {
        #[cfg(any(target_os = "linux", target_os = "android", target_os = "emscripten"))]
        {
            *libc::__errno_location() = 0;
        }
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "dragonfly"
        ))]
        {
            *libc::__error() = 0;
        }
        #[cfg(any(target_os = "netbsd", target_os = "openbsd"))]
        {
            *libc::__errno() = 0;
        }
    }
}
