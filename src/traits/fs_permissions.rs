//! Permission management operations.

use crate::{ChmodDepth, FsError, Permissions};

/// Permission management operations.
///
/// Permission bits are informational: nothing in the store checks them.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsPermissions`.
pub trait FsPermissions: Send + Sync {
    /// Set permissions on a path and, for directories, on descendants up to
    /// `depth` levels down. Each touched node's modification time is bumped.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn set_permissions(&self, path: &str, perm: Permissions, depth: ChmodDepth)
    -> Result<(), FsError>;
}
