//! Error types for the virtual file store.

/// Coarse classification of a [`FsError`].
///
/// Several `FsError` variants can share one kind (for example both
/// [`FsError::NotAFile`] and [`FsError::NotADirectory`] are
/// [`ErrorKind::WrongKind`]). Callers that only care about the class of
/// failure should match on this instead of the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The store has no namespace bound yet.
    NotInitialized,
    /// Attempted root mutation or malformed path argument.
    InvalidPath,
    /// Path has no node.
    NotFound,
    /// File/directory mismatch for the requested operation.
    WrongKind,
    /// Destination collision without an overwrite flag.
    AlreadyExists,
    /// Destination lies inside its own source.
    SelfContainment,
    /// The storage engine reported an error or aborted.
    TransactionFailure,
    /// Malformed export document or compacted text.
    ImportValidationFailure,
    /// Unparseable mode or depth argument.
    InvalidArgument,
    /// The operation did not run to completion inside the serializer.
    Internal,
}

/// File store error type with contextual variants.
///
/// All variants carry the path and/or operation that failed where that is
/// meaningful. Uses `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use vfstore::{ErrorKind, FsError};
///
/// let err = FsError::NotFound { path: "/missing".into() };
/// assert_eq!(err.to_string(), "not found: /missing");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// No namespace is bound to the store.
    #[error("store not initialized: load a namespace first")]
    NotInitialized,

    /// The path cannot be used for this operation.
    #[error("{operation}: invalid path: {path} ({reason})")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// The operation that rejected it.
        operation: &'static str,
        /// Why the path was rejected.
        reason: &'static str,
    },

    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// Expected a file but found a directory.
    #[error("not a file: {path}")]
    NotAFile {
        /// The path that is not a file.
        path: String,
    },

    /// Expected a directory but found a file.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: String,
    },

    /// Path already exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Destination is inside the source subtree (or the reverse when the
    /// destination would be replaced).
    #[error("{operation}: cannot place {from} inside itself at {to}")]
    SelfContainment {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// A storage transaction failed or was aborted by the engine.
    #[error("{operation}: transaction failed: {details}")]
    Transaction {
        /// The operation whose transaction failed.
        operation: &'static str,
        /// Engine-provided details.
        details: String,
    },

    /// The storage engine could not be opened or scanned.
    #[error("storage error: {0}")]
    Storage(String),

    /// An export document was rejected before touching the live store.
    #[error("import rejected: {0}")]
    ImportValidation(String),

    /// Compacted text could not be expanded.
    #[error("compaction codec: {0}")]
    Compaction(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// An argument could not be parsed.
    #[error("{operation}: invalid argument: {details}")]
    InvalidArgument {
        /// The operation that received the argument.
        operation: &'static str,
        /// What was wrong with it.
        details: String,
    },

    /// The serialized operation did not complete (worker gone or job panicked).
    #[error("operation aborted: {0}")]
    Internal(String),
}

impl FsError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotInitialized => ErrorKind::NotInitialized,
            FsError::InvalidPath { .. } => ErrorKind::InvalidPath,
            FsError::NotFound { .. } => ErrorKind::NotFound,
            FsError::NotAFile { .. } | FsError::NotADirectory { .. } => ErrorKind::WrongKind,
            FsError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            FsError::SelfContainment { .. } => ErrorKind::SelfContainment,
            FsError::Transaction { .. } | FsError::Storage(_) => ErrorKind::TransactionFailure,
            FsError::ImportValidation(_)
            | FsError::Compaction(_)
            | FsError::Serialization(_)
            | FsError::Deserialization(_) => ErrorKind::ImportValidationFailure,
            FsError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            FsError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(path: &str) -> Self {
        FsError::NotFound { path: path.to_string() }
    }

    pub(crate) fn root(operation: &'static str) -> Self {
        FsError::InvalidPath {
            path: "/".to_string(),
            operation,
            reason: "the root directory cannot be modified",
        }
    }
}

impl From<sled::Error> for FsError {
    fn from(error: sled::Error) -> Self {
        FsError::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for FsError {
    fn from(error: serde_json::Error) -> Self {
        FsError::Deserialization(error.to_string())
    }
}
