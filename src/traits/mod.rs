//! # Store Traits
//!
//! The capability traits both backends implement.
//!
//! ## Trait Layers
//!
//! ```text
//! Core:      FsRead + FsWrite + FsDir = Fs
//!                                      ↓
//! Full:      Fs + FsPermissions + FsSnapshot = FsFull
//! ```
//!
//! | Composite | Component Traits | Use Case |
//! |-----------|------------------|----------|
//! | [`Fs`] | [`FsRead`], [`FsWrite`], [`FsDir`] | Path-addressed reads, writes, listings |
//! | [`FsFull`] | + [`FsPermissions`], [`FsSnapshot`] | chmod, export/import, clear |
//!
//! ## Blanket Implementations
//!
//! Composite traits are blanket-implemented: implement the components and
//! the composite comes for free.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Ordering between
//! callers is not the backend's job; wrap a backend in an
//! [`OperationQueue`](crate::OperationQueue) to get a total order.
//!
//! ## Object Safety
//!
//! All traits are object-safe:
//!
//! ```rust
//! use vfstore::Fs;
//!
//! fn process(fs: &dyn Fs) {
//!     let _ = fs.read_to_string("/file.txt");
//! }
//! ```

mod fs_dir;
mod fs_permissions;
mod fs_read;
mod fs_snapshot;
mod fs_write;

pub use fs_dir::{FsDir, ReadDirIter};
pub use fs_permissions::FsPermissions;
pub use fs_read::FsRead;
pub use fs_snapshot::FsSnapshot;
pub use fs_write::FsWrite;

/// Basic store: reads, writes and directory operations.
///
/// Automatically implemented for any type that implements all three
/// component traits.
///
/// # Example
///
/// ```rust
/// use vfstore::{Fs, FsError, FsRead, FsWrite, TreeNodeStore};
///
/// fn backup_file<B: Fs>(fs: &B, src: &str, dst: &str) -> Result<(), FsError> {
///     let data = fs.read_to_string(src)?;
///     fs.create_dir_all(&vfstore::path::dirname(dst))?;
///     fs.write(dst, &data)
/// }
///
/// let fs = TreeNodeStore::new();
/// fs.write("/notes.txt", "hello").unwrap();
/// backup_file(&fs, "/notes.txt", "/backup/notes.txt").unwrap();
/// assert_eq!(fs.read_to_string("/backup/notes.txt").unwrap(), "hello");
/// ```
pub trait Fs: FsRead + FsWrite + FsDir {}

impl<T: FsRead + FsWrite + FsDir> Fs for T {}

/// Full store: [`Fs`] plus permissions and whole-store snapshots.
pub trait FsFull: Fs + FsPermissions + FsSnapshot {}

impl<T: Fs + FsPermissions + FsSnapshot> FsFull for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composites_are_object_safe() {
        fn _fs(_: &dyn Fs) {}
        fn _full(_: &dyn FsFull) {}
    }

    #[test]
    fn backends_implement_full() {
        fn assert_full<T: FsFull>() {}
        assert_full::<crate::TreeNodeStore>();
        assert_full::<crate::FlatRecordStore>();
    }
}
