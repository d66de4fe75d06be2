//! Windows backend: `FindFirstFileW`/`FindNextFileW`/`FindClose`.
//!
//! The find-data struct carries attributes, size, and all three timestamps
//! with every entry, so the whole field set is free and no request ever
//! triggers a supplemental query. The scan call also accepts `*`/`?`
//! wildcards natively, so simple patterns are pushed down instead of being
//! matched in software.

use std::ffi::OsString;
use std::io;
use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use windows_sys::Win32::Foundation::{
    GetLastError, ERROR_ACCESS_DENIED, ERROR_DIRECTORY, ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_FILES,
    ERROR_PATH_NOT_FOUND, FILETIME, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    FindClose, FindFirstFileW, FindNextFileW, FILE_ATTRIBUTE_DIRECTORY,
    FILE_ATTRIBUTE_REPARSE_POINT, WIN32_FIND_DATAW,
};

use crate::backend::{Backend, RawEntry};
use crate::entry::{FieldSet, Metadata, TypeHint};
use crate::error::ScanError;

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const SECONDS_BETWEEN_EPOCHS: f64 = 11_644_473_600.0;

/// The real platform backend. Zero-sized; one instance serves any number
/// of enumerations.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsBackend;

/// An open find handle, plus the first entry `FindFirstFileW` already
/// returned. Closed exactly once, on drop.
pub struct DirCursor {
    handle: HANDLE,
    first: Option<WIN32_FIND_DATAW>,
    path: PathBuf,
}

impl Drop for DirCursor {
    fn drop(&mut self) {
        if self.handle != INVALID_HANDLE_VALUE {
            // SAFETY: handle came from a successful FindFirstFileW and is
            // closed only here.
            unsafe {
                FindClose(self.handle);
            }
        }
    }
}

impl Backend for OsBackend {
    type Cursor = DirCursor;

    fn free_fields(&self) -> FieldSet {
        FieldSet::ALL
    }

    fn supports_native_filter(&self) -> bool {
        true
    }

    fn open(&self, path: &Path, pattern: Option<&str>) -> Result<DirCursor, ScanError> {
        // The search argument is "<dir>\<pattern>", "*" when unfiltered.
        let search = path.join(pattern.unwrap_or("*"));
        let wide: Vec<u16> = search
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let mut data: WIN32_FIND_DATAW = unsafe { std::mem::zeroed() };
        // SAFETY: wide is NUL-terminated; data is a valid out-pointer.
        let handle = unsafe { FindFirstFileW(wide.as_ptr(), &mut data) };

        if handle == INVALID_HANDLE_VALUE {
            let code = unsafe { GetLastError() };
            return match code {
                // An existing directory whose contents simply don't match
                // the pattern: an empty enumeration, not an error.
                ERROR_FILE_NOT_FOUND if pattern.is_some() => Ok(DirCursor {
                    handle: INVALID_HANDLE_VALUE,
                    first: None,
                    path: path.to_path_buf(),
                }),
                ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => {
                    Err(ScanError::NotFound(path.to_path_buf()))
                }
                ERROR_DIRECTORY => Err(ScanError::NotADirectory(path.to_path_buf())),
                ERROR_ACCESS_DENIED => Err(ScanError::AccessDenied(path.to_path_buf())),
                _ => Err(ScanError::Enumeration {
                    path: path.to_path_buf(),
                    source: io::Error::from_raw_os_error(code as i32),
                }),
            };
        }

        Ok(DirCursor {
            handle,
            first: Some(data),
            path: path.to_path_buf(),
        })
    }

    fn advance(&self, cursor: &mut DirCursor) -> Result<Option<RawEntry>, ScanError> {
        if cursor.handle == INVALID_HANDLE_VALUE {
            return Ok(None);
        }

        if let Some(data) = cursor.first.take() {
            return Ok(Some(raw_entry(&data)));
        }

        let mut data: WIN32_FIND_DATAW = unsafe { std::mem::zeroed() };
        // SAFETY: handle is open (cursors are never advanced after drop).
        let ok = unsafe { FindNextFileW(cursor.handle, &mut data) };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return if code == ERROR_NO_MORE_FILES {
                Ok(None)
            } else {
                Err(ScanError::Enumeration {
                    path: cursor.path.clone(),
                    source: io::Error::from_raw_os_error(code as i32),
                })
            };
        }

        Ok(Some(raw_entry(&data)))
    }

    fn query(&self, path: &Path) -> Result<(TypeHint, Metadata), ScanError> {
        super::query_path(path)
    }
}

fn raw_entry(data: &WIN32_FIND_DATAW) -> RawEntry {
    let len = data
        .cFileName
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(data.cFileName.len());
    let name = OsString::from_wide(&data.cFileName[..len])
        .to_string_lossy()
        .into_owned();

    let type_hint = if data.dwFileAttributes & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
        TypeHint::Symlink
    } else if data.dwFileAttributes & FILE_ATTRIBUTE_DIRECTORY != 0 {
        TypeHint::Dir
    } else {
        TypeHint::File
    };

    RawEntry {
        name,
        type_hint,
        metadata: Metadata {
            size: Some(((data.nFileSizeHigh as u64) << 32) | data.nFileSizeLow as u64),
            modified: Some(filetime_secs(&data.ftLastWriteTime)),
            accessed: Some(filetime_secs(&data.ftLastAccessTime)),
            created: Some(filetime_secs(&data.ftCreationTime)),
        },
    }
}

/// Convert a FILETIME (100ns ticks since 1601) to Unix-epoch seconds.
fn filetime_secs(ft: &FILETIME) -> f64 {
    let ticks = ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64;
    ticks as f64 / 10_000_000.0 - SECONDS_BETWEEN_EPOCHS
}
