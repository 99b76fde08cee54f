//! Transaction coordinator for the flat backend.
//!
//! Every flat operation is one call to [`Coordinator::read`] or
//! [`Coordinator::write`]. A write closure that fails aborts the whole sled
//! transaction, so nothing from it commits. sled may re-run the closure on
//! conflict; the caller sees exactly one result.

use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};

use crate::node::Record;
use crate::{FsError, path};

/// Result type inside a write transaction.
pub(crate) type TxResult<T> = ConflictableTransactionResult<T, FsError>;

/// Abort the enclosing transaction with `error`.
pub(crate) fn abort<T>(error: FsError) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(error))
}

/// Scoped access to one namespace tree.
pub(crate) struct Coordinator<'a> {
    tree: &'a sled::Tree,
    flush_on_commit: bool,
}

impl<'a> Coordinator<'a> {
    pub(crate) fn new(tree: &'a sled::Tree, flush_on_commit: bool) -> Self {
        Self {
            tree,
            flush_on_commit,
        }
    }

    /// Run a lookup or scan.
    pub(crate) fn read<T>(
        &self,
        scope: &'static str,
        f: impl FnOnce(&Reader<'_>) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        tracing::debug!(scope, "read");
        f(&Reader { tree: self.tree })
    }

    /// Run `f` as one atomic read-write transaction.
    pub(crate) fn write<T, F>(&self, scope: &'static str, f: F) -> Result<T, FsError>
    where
        F: Fn(&Txn<'_>) -> TxResult<T>,
    {
        tracing::debug!(scope, "write transaction");
        let outcome = self.tree.transaction(|tx| f(&Txn { tx }));
        match outcome {
            Ok(value) => {
                if self.flush_on_commit {
                    self.tree.flush().map_err(|e| FsError::Transaction {
                        operation: scope,
                        details: format!("flush after commit: {e}"),
                    })?;
                }
                Ok(value)
            }
            Err(TransactionError::Abort(error)) => {
                tracing::debug!(scope, %error, "transaction aborted");
                Err(error)
            }
            Err(TransactionError::Storage(error)) => Err(FsError::Transaction {
                operation: scope,
                details: error.to_string(),
            }),
        }
    }
}

/// Read-only view used for lookups and the collect phase.
pub(crate) struct Reader<'a> {
    tree: &'a sled::Tree,
}

impl Reader<'_> {
    pub(crate) fn get(&self, path: &str) -> Result<Option<Record>, FsError> {
        match self.tree.get(path.as_bytes())? {
            Some(bytes) => Record::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn require(&self, path: &str) -> Result<Record, FsError> {
        self.get(path)?.ok_or_else(|| FsError::not_found(path))
    }

    /// Every record strictly below `dir`, in key order.
    pub(crate) fn descendants(&self, dir: &str) -> Result<Vec<Record>, FsError> {
        let prefix = path::descendant_prefix(dir);
        let mut out = Vec::new();
        for entry in self.tree.scan_prefix(prefix.as_bytes()) {
            let (key, value) = entry?;
            if key.as_ref() != dir.as_bytes() {
                out.push(Record::decode(&value)?);
            }
        }
        Ok(out)
    }

    /// Keys of every record strictly below `dir`.
    pub(crate) fn descendant_paths(&self, dir: &str) -> Result<Vec<String>, FsError> {
        let prefix = path::descendant_prefix(dir);
        let mut out = Vec::new();
        for entry in self.tree.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            if key.as_ref() != dir.as_bytes() {
                out.push(String::from_utf8_lossy(&key).into_owned());
            }
        }
        Ok(out)
    }

    /// Every record in the namespace, root first.
    pub(crate) fn all(&self) -> Result<Vec<Record>, FsError> {
        let mut out = Vec::new();
        for entry in self.tree.iter() {
            let (_, value) = entry?;
            out.push(Record::decode(&value)?);
        }
        Ok(out)
    }
}

/// Handle passed to write-transaction closures.
pub(crate) struct Txn<'a> {
    tx: &'a TransactionalTree,
}

impl Txn<'_> {
    pub(crate) fn get(&self, path: &str) -> TxResult<Option<Record>> {
        match self.tx.get(path.as_bytes())? {
            Some(bytes) => match Record::decode(&bytes) {
                Ok(record) => Ok(Some(record)),
                Err(e) => abort(e),
            },
            None => Ok(None),
        }
    }

    pub(crate) fn require(&self, path: &str) -> TxResult<Record> {
        match self.get(path)? {
            Some(record) => Ok(record),
            None => abort(FsError::not_found(path)),
        }
    }

    pub(crate) fn put(&self, record: &Record) -> TxResult<()> {
        let bytes = match record.encode() {
            Ok(bytes) => bytes,
            Err(e) => return abort(e),
        };
        self.tx.insert(record.path.as_bytes(), bytes)?;
        Ok(())
    }

    pub(crate) fn delete(&self, path: &str) -> TxResult<()> {
        self.tx.remove(path.as_bytes())?;
        Ok(())
    }

    /// Bump the modification time of `path` if it exists.
    pub(crate) fn touch(&self, path: &str) -> TxResult<()> {
        if let Some(mut record) = self.get(path)? {
            record.header.touch();
            self.put(&record)?;
        }
        Ok(())
    }

    /// Make sure the parent of `path` exists as a directory.
    ///
    /// With `create`, missing ancestors are inserted top-down.
    pub(crate) fn ensure_parent(&self, path: &str, create: bool) -> TxResult<()> {
        let Some(parent) = path::parent(path) else {
            return Ok(());
        };
        match self.get(parent)? {
            Some(record) if record.is_dir() => Ok(()),
            Some(_) => abort(FsError::NotADirectory {
                path: parent.to_string(),
            }),
            None if create => self.ensure_dir_chain(parent),
            None => abort(FsError::not_found(parent)),
        }
    }

    /// Insert every missing directory from the root down to `dir`.
    pub(crate) fn ensure_dir_chain(&self, dir: &str) -> TxResult<()> {
        let mut current = String::new();
        for segment in path::segments(dir) {
            current.push('/');
            current.push_str(segment);
            match self.get(&current)? {
                Some(record) if record.is_dir() => {}
                Some(_) => {
                    return abort(FsError::NotADirectory {
                        path: current.clone(),
                    });
                }
                None => {
                    self.put(&Record::directory(current.clone()))?;
                    if let Some(parent) = path::parent(&current) {
                        self.touch(parent)?;
                    }
                }
            }
        }
        Ok(())
    }
}
