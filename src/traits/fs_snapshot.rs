//! Whole-store export, import and clearing.

use crate::{FsError, ImportReport};

/// Whole-store operations.
///
/// The export document is JSON text: an array of path records for the flat
/// backend, the nested root node for the tree backend. Pair with
/// [`codec::compact`](crate::codec::compact) to shrink it for transport.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsSnapshot`.
pub trait FsSnapshot: Send + Sync {
    /// Serialize the entire store, timestamps and permissions included.
    fn export_document(&self) -> Result<String, FsError>;

    /// Replace the store contents with a previously exported document.
    ///
    /// A document with the wrong overall shape is rejected with
    /// [`FsError::ImportValidation`] before anything changes.
    fn import_document(&self, document: &str) -> Result<ImportReport, FsError>;

    /// Replace the whole store with a fresh empty root directory.
    fn clear(&self) -> Result<(), FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_snapshot_is_object_safe() {
        fn _check(_: &dyn FsSnapshot) {}
    }
}
