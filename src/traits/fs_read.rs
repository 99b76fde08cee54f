//! Read operations for virtual file stores.

use crate::{FsError, Metadata};

/// Read operations for a virtual file store.
///
/// All methods use `&self` (interior mutability). Backends manage their own
/// synchronization. Paths are normalized by the backend before lookup.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: Send + Sync {
    /// Read a file's content.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    fn read_to_string(&self, path: &str) -> Result<String, FsError>;

    /// Check if a path exists.
    ///
    /// Only returns an error for unexpected failures (storage errors, unbound
    /// store).
    fn exists(&self, path: &str) -> Result<bool, FsError>;

    /// Get metadata for a path.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn metadata(&self, path: &str) -> Result<Metadata, FsError>;
}
