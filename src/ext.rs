//! # Extension Traits
//!
//! Convenience methods for store backends.
//!
//! ## Overview
//!
//! [`FsExt`] provides commonly-needed utility methods that aren't part of
//! the core trait hierarchy. These are implemented as default methods with
//! blanket implementations, so any `Fs` backend gets them for free.
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`is_file`](FsExt::is_file) | Check if path is a file |
//! | [`is_dir`](FsExt::is_dir) | Check if path is a directory |
//! | [`file_size`](FsExt::file_size) | Content length from metadata |
//! | [`path_type`](FsExt::path_type) | `"file"`, `"directory"` or `"none"` |
//! | [`list`](FsExt::list) | Filtered child names of a directory |

use crate::{Fs, FsError, ListFilter};

/// Extension methods for any store backend.
///
/// # Example
///
/// ```rust
/// use vfstore::{FsDir, FsExt, FsWrite, ListFilter, TreeNodeStore};
///
/// let fs = TreeNodeStore::new();
/// fs.create_dir("/data").unwrap();
/// fs.write("/data/a.txt", "x").unwrap();
/// fs.create_dir("/data/sub").unwrap();
///
/// assert!(fs.is_dir("/data").unwrap());
/// assert_eq!(fs.path_type("/nowhere").unwrap(), "none");
/// assert_eq!(fs.list("/data", ListFilter::Files).unwrap(), vec!["a.txt"]);
/// ```
pub trait FsExt: Fs {
    /// Check if the path points to a file.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_file(&self, path: &str) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a directory.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_dir(&self, path: &str) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_dir()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get the content length of a file (`0` for directories).
    ///
    /// # Errors
    ///
    /// Returns `FsError::NotFound` if the path doesn't exist.
    fn file_size(&self, path: &str) -> Result<u64, FsError> {
        Ok(self.metadata(path)?.size)
    }

    /// `"file"`, `"directory"`, or `"none"` when nothing lives at `path`.
    fn path_type(&self, path: &str) -> Result<&'static str, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.file_type.as_str()),
            Err(FsError::NotFound { .. }) => Ok("none"),
            Err(e) => Err(e),
        }
    }

    /// Names of the direct children of `path` that pass `filter`, sorted.
    fn list(&self, path: &str, filter: ListFilter) -> Result<Vec<String>, FsError> {
        Ok(self
            .read_dir(path)?
            .filter(|entry| filter.accepts(entry.file_type))
            .map(|entry| entry.name)
            .collect())
    }
}

// Blanket implementation - any Fs backend gets FsExt for free
impl<B: Fs + ?Sized> FsExt for B {}
