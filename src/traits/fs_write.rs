//! Write operations for virtual file stores.

use crate::FsError;

/// Write operations for a virtual file store.
///
/// Destination parents must exist unless the backend was configured with
/// `create_parents`, in which case missing intermediate directories are
/// created on the way.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: Send + Sync {
    /// Write a file (creates if missing, replaces content if present).
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] for the root
    /// - [`FsError::NotFound`] if the parent directory does not exist
    /// - [`FsError::NotADirectory`] if the parent is a file
    /// - [`FsError::NotAFile`] if the path is a directory
    fn write(&self, path: &str, content: &str) -> Result<(), FsError>;

    /// Append to an existing file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    fn append(&self, path: &str, content: &str) -> Result<(), FsError>;

    /// Create an empty file if missing, otherwise bump its modification time
    /// and its parent's.
    fn touch(&self, path: &str) -> Result<(), FsError>;

    /// Remove a file or a directory with everything below it.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] for the root
    /// - [`FsError::NotFound`] if the path does not exist
    fn remove(&self, path: &str) -> Result<(), FsError>;

    /// Rename a file or directory, optionally replacing the destination.
    ///
    /// With `overwrite`, an existing destination subtree is deleted first.
    /// Renaming a path onto itself succeeds without changes.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if either side is the root
    /// - [`FsError::SelfContainment`] if the destination is inside the source
    /// - [`FsError::NotFound`] if the source does not exist
    /// - [`FsError::AlreadyExists`] if the destination exists and `overwrite` is false
    fn rename(&self, from: &str, to: &str, overwrite: bool) -> Result<(), FsError>;

    /// Move a file or directory. Never replaces an existing destination.
    ///
    /// # Errors
    ///
    /// Same as [`rename`](Self::rename) with `overwrite = false`.
    fn move_to(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Deep-copy a file or directory; every copied node gets fresh timestamps.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if the source is the root
    /// - [`FsError::SelfContainment`] if the destination is inside the source
    /// - [`FsError::NotFound`] if the source does not exist
    /// - [`FsError::AlreadyExists`] if the destination exists
    fn copy(&self, from: &str, to: &str) -> Result<(), FsError>;
}
