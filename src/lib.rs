//! # vfstore
//!
//! A path-addressed **virtual file store**: files and directories that live
//! entirely outside the host filesystem, behind one set of capability traits
//! with two interchangeable backends.
//!
//! ---
//!
//! ## Quick Start
//!
//! Code written against [`Fs`] works with either backend:
//!
//! ```rust
//! use vfstore::{Fs, FsError, TreeNodeStore};
//!
//! fn archive<B: Fs>(fs: &B) -> Result<(), FsError> {
//!     fs.create_dir_all("/archive/2024")?;
//!     fs.write("/archive/2024/notes.txt", "hello")?;
//!     fs.rename("/archive/2024", "/archive/latest", false)?;
//!     assert_eq!(fs.read_to_string("/archive/latest/notes.txt")?, "hello");
//!     Ok(())
//! }
//!
//! archive(&TreeNodeStore::new()).unwrap();
//! ```
//!
//! The durable backend needs a namespace bound first:
//!
//! ```rust
//! use vfstore::{FlatRecordStore, FsDir, StoreConfig};
//!
//! let fs = FlatRecordStore::new(StoreConfig::temporary());
//! fs.load("scratch").unwrap();
//! fs.create_dir("/docs").unwrap();
//! assert_eq!(fs.walk("/").unwrap(), vec!["/", "/docs"]);
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Fs`] | Reads, writes and directory operations |
//! | [`FsFull`] | Adds permissions, export/import and clear |
//! | [`FlatRecordStore`] | Durable backend: one `sled` tree keyed by full path |
//! | [`TreeNodeStore`] | In-memory backend: nested directory nodes |
//! | [`OperationQueue`] | Runs operations one at a time in submission order |
//! | [`Session`] | Never-failing host surface with a last-error slot |
//! | [`FsError`] | Error type with path and operation context |
//!
//! ---
//!
//! ## Path Model
//!
//! Every path argument is normalized before use (see [`path::normalize`]):
//! leading `/` enforced, `.` and empty segments dropped, `..` resolved
//! without climbing above the root, trailing `/` removed. The root `/` always
//! exists, is always a directory, and can never be deleted, renamed, moved,
//! copied or overwritten.
//!
//! ---
//!
//! ## Recursive Operations
//!
//! Delete, move, rename, copy and recursive chmod first collect the full set
//! of affected paths and only then mutate (see [`planner`]). On the flat
//! backend the mutation phase is a single `sled` transaction, so a failure
//! leaves the namespace untouched.
//!
//! ---
//!
//! ## Error Handling
//!
//! All trait operations return `Result<T, FsError>`:
//!
//! ```rust
//! use vfstore::{ErrorKind, FsRead, FsWrite, TreeNodeStore};
//!
//! let fs = TreeNodeStore::new();
//! let err = fs.remove("/").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidPath);
//!
//! let err = fs.read_to_string("/missing.txt").unwrap_err();
//! assert_eq!(err.to_string(), "not found: /missing.txt");
//! ```
//!
//! [`Session`] turns failures into defaults (`false`, `""`, `"[]"`) and
//! keeps the message for [`Session::last_error`].
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. For a total order over
//! operations submitted from many threads, put the backend behind an
//! [`OperationQueue`] (a [`Session`] always does).

mod backend;
pub mod codec;
mod config;
mod error;
mod ext;
mod layer;
pub mod node;
pub mod path;
pub mod planner;
mod queue;
mod report;
mod session;
mod traits;
mod types;

// Public re-exports - error types
pub use error::{ErrorKind, FsError};

// Public re-exports - core types
pub use types::{
    ChmodDepth, DirEntry, FileType, ImportReport, ListFilter, Metadata, Permissions, Timestamp,
};

// Public re-exports - core traits
pub use traits::{Fs, FsDir, FsRead, FsWrite, ReadDirIter};

// Public re-exports - extended traits
pub use traits::{FsFull, FsPermissions, FsSnapshot};

// Public re-exports - backends
pub use backend::{FlatRecordStore, TreeNodeStore};

// Public re-exports - infrastructure
pub use config::StoreConfig;
pub use ext::FsExt;
pub use layer::{Layer, LayerExt};
pub use queue::{OperationQueue, Pending};
pub use report::ErrorReporter;
pub use session::{Session, SessionLayer};
