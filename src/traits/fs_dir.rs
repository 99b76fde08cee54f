//! Directory operations for virtual file stores.

use crate::{DirEntry, FsError};

/// Directory operations for a virtual file store.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
pub trait FsDir: Send + Sync {
    /// List the direct children of a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotADirectory`] if the path is a file
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError>;

    /// Create a directory. Succeeds without changes if it already exists.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] for the root
    /// - [`FsError::NotFound`] if the parent does not exist
    /// - [`FsError::NotADirectory`] if the path or its parent is a file
    fn create_dir(&self, path: &str) -> Result<(), FsError>;

    /// Create a directory and every missing ancestor.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if a component exists as a file
    fn create_dir_all(&self, path: &str) -> Result<(), FsError>;

    /// Backend-defined directory size.
    ///
    /// The flat backend sums the content sizes of every descendant file; the
    /// tree backend counts direct children. For a file both return its
    /// content length.
    fn dir_size(&self, path: &str) -> Result<u64, FsError>;

    /// The path itself plus every descendant path, sorted.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn walk(&self, path: &str) -> Result<Vec<String>, FsError>;
}

/// Iterator over directory entries.
///
/// Entries are collected before the iterator is handed out, so holding one
/// never pins any backend lock.
#[derive(Debug)]
pub struct ReadDirIter(std::vec::IntoIter<DirEntry>);

impl ReadDirIter {
    /// Create from a pre-collected vector.
    pub fn from_vec(entries: Vec<DirEntry>) -> Self {
        Self(entries.into_iter())
    }

    /// Collect the remaining entries.
    pub fn collect_all(self) -> Vec<DirEntry> {
        self.0.collect()
    }
}

impl Iterator for ReadDirIter {
    type Item = DirEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}
