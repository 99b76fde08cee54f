//! Durable flat-record backend.
//!
//! One sled tree per namespace, keyed by normalized path. Directory
//! membership is implied by key prefixes, so every directory-scoped
//! operation collects the affected keys with a prefix scan first and then
//! mutates them inside a single transaction.

use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};

use super::txn::{Coordinator, Reader, TxResult, Txn, abort};
use crate::node::{Record, RecordBody, RecordDoc};
use crate::planner::{self, SubtreePlan};
use crate::{
    ChmodDepth, DirEntry, FsDir, FsError, FsPermissions, FsRead, FsSnapshot, FsWrite,
    ImportReport, Metadata, Permissions, ReadDirIter, StoreConfig, Timestamp, path,
};

const RECORDS_TREE: &str = "records";

/// Persisted, path-keyed store on top of [`sled`].
///
/// Starts unbound: every operation fails with [`FsError::NotInitialized`]
/// until [`load`](Self::load) binds a namespace.
///
/// ```rust
/// use vfstore::{FlatRecordStore, FsDir, FsRead, FsWrite, StoreConfig};
///
/// let store = FlatRecordStore::new(StoreConfig::temporary());
/// assert!(store.exists("/").is_err());
///
/// store.load("scratch").unwrap();
/// store.create_dir("/docs").unwrap();
/// store.write("/docs/a.txt", "hello").unwrap();
/// assert_eq!(store.dir_size("/docs").unwrap(), 5);
/// ```
///
/// # Concurrency
///
/// Reads run concurrently. Mutating operations hold an internal writer
/// lock across both the collect scan and the transaction, so a direct
/// caller on many threads never sees a scan go stale before its commit.
/// Submission order across threads still needs an
/// [`OperationQueue`](crate::OperationQueue).
pub struct FlatRecordStore {
    config: StoreConfig,
    state: RwLock<Option<Bound>>,
    writer: Mutex<()>,
}

struct Bound {
    namespace: String,
    // Keeps the database open for as long as the namespace is bound.
    _db: sled::Db,
    records: sled::Tree,
}

impl FlatRecordStore {
    /// An unbound store using `config`.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            state: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    /// Bind `namespace`, opening its database and ensuring the root record.
    ///
    /// Loading while already bound switches to the new namespace. The name
    /// must be a single path component: no separators, `.` or `..`.
    pub fn load(&self, namespace: &str) -> Result<(), FsError> {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            return Err(FsError::InvalidPath {
                path: namespace.to_string(),
                operation: "load",
                reason: "namespace name is empty",
            });
        }
        if !path::is_segment(namespace) {
            return Err(FsError::InvalidPath {
                path: namespace.to_string(),
                operation: "load",
                reason: "namespace must be a single path component",
            });
        }

        // sled holds a lock on an open database directory.
        let mut state = self.state.write();
        state.take();

        let db = if self.config.temporary {
            sled::Config::new().temporary(true).open()?
        } else {
            let dir = self.config.namespace_dir(namespace);
            std::fs::create_dir_all(&dir).map_err(|e| FsError::Storage(e.to_string()))?;
            sled::open(&dir)?
        };
        let records = db.open_tree(RECORDS_TREE)?;

        Coordinator::new(&records, self.config.flush_on_commit).write("load", |tx| {
            if tx.get(path::ROOT)?.is_none() {
                tx.put(&Record::directory(path::ROOT))?;
            }
            Ok(())
        })?;

        tracing::info!(namespace, temporary = self.config.temporary, "namespace bound");
        *state = Some(Bound {
            namespace: namespace.to_string(),
            _db: db,
            records,
        });
        Ok(())
    }

    /// The bound namespace, if any.
    pub fn namespace(&self) -> Option<String> {
        self.state.read().as_ref().map(|b| b.namespace.clone())
    }

    /// Whether a namespace is bound.
    pub fn is_ready(&self) -> bool {
        self.state.read().is_some()
    }

    /// Wipe the bound namespace and unbind it.
    pub fn reset(&self) -> Result<(), FsError> {
        let mut state = self.state.write();
        let Some(bound) = state.take() else {
            return Err(FsError::NotInitialized);
        };
        bound.records.clear()?;
        bound.records.flush()?;
        tracing::info!(namespace = %bound.namespace, "namespace reset");
        Ok(())
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn with_bound<T>(
        &self,
        f: impl FnOnce(&Coordinator<'_>) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let state = self.state.read();
        let bound = state.as_ref().ok_or(FsError::NotInitialized)?;
        f(&Coordinator::new(&bound.records, self.config.flush_on_commit))
    }

    /// Like `with_bound`, holding the writer lock for the whole call.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&Coordinator<'_>) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let _writer = self.writer.lock();
        self.with_bound(f)
    }

    fn create_parents(&self) -> bool {
        self.config.create_parents
    }

    fn relocate(
        &self,
        from: &str,
        to: &str,
        overwrite: bool,
        operation: &'static str,
    ) -> Result<(), FsError> {
        let Some(plan) = planner::plan_relocation(from, to, overwrite, operation)? else {
            let same = path::normalize(from);
            return self.with_bound(|c| c.read(operation, |r| r.require(&same).map(|_| ())));
        };
        let create = self.create_parents();

        self.mutate(|c| {
            let (source, replaced) = c.read(operation, |r| {
                r.require(&plan.from)?;
                let source = collect(r, &plan.from)?;
                let replaced = match r.get(&plan.to)? {
                    Some(_) if !overwrite => {
                        return Err(FsError::AlreadyExists {
                            path: plan.to.clone(),
                            operation,
                        });
                    }
                    Some(_) => Some(collect(r, &plan.to)?),
                    None => None,
                };
                Ok((source, replaced))
            })?;
            let moves = source.relocated(&plan.to);

            c.write(operation, |tx| {
                if let Some(replaced) = &replaced {
                    for old in &replaced.paths {
                        tx.delete(old)?;
                    }
                }
                tx.ensure_parent(&plan.to, create)?;
                for (old, new) in &moves {
                    let mut record = tx.require(old)?;
                    tx.delete(old)?;
                    record.path = new.clone();
                    if *old == plan.from {
                        record.header.touch();
                    }
                    tx.put(&record)?;
                }
                touch_parent(tx, &plan.from)?;
                touch_parent(tx, &plan.to)
            })?;
            tracing::debug!(
                operation,
                from = %plan.from,
                to = %plan.to,
                entries = moves.len(),
                "relocated"
            );
            Ok(())
        })
    }
}

impl std::fmt::Debug for FlatRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatRecordStore")
            .field("namespace", &self.namespace())
            .field("config", &self.config)
            .finish()
    }
}

/// Collect phase: the target plus every key below it.
fn collect(reader: &Reader<'_>, target: &str) -> Result<SubtreePlan, FsError> {
    Ok(SubtreePlan::collect(target, reader.descendant_paths(target)?))
}

fn touch_parent(tx: &Txn<'_>, path: &str) -> TxResult<()> {
    match path::parent(path) {
        Some(parent) => tx.touch(parent),
        None => Ok(()),
    }
}

impl FsRead for FlatRecordStore {
    fn read_to_string(&self, path: &str) -> Result<String, FsError> {
        let path = path::normalize(path);
        self.with_bound(|c| {
            c.read("read", |r| match r.require(&path)?.body {
                RecordBody::File { content } => Ok(content),
                RecordBody::Directory => Err(FsError::NotAFile { path: path.clone() }),
            })
        })
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        let path = path::normalize(path);
        self.with_bound(|c| c.read("exists", |r| Ok(r.get(&path)?.is_some())))
    }

    fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
        let path = path::normalize(path);
        self.with_bound(|c| c.read("metadata", |r| Ok(r.require(&path)?.metadata())))
    }
}

impl FsWrite for FlatRecordStore {
    fn write(&self, path: &str, content: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        if path::is_root(&path) {
            return Err(FsError::root("write"));
        }
        let create = self.create_parents();
        self.mutate(|c| {
            c.write("write", |tx| match tx.get(&path)? {
                Some(Record {
                    body: RecordBody::Directory,
                    ..
                }) => abort(FsError::NotAFile { path: path.clone() }),
                Some(mut record) => {
                    record.body = RecordBody::File {
                        content: content.to_string(),
                    };
                    record.header.touch();
                    tx.put(&record)
                }
                None => {
                    tx.ensure_parent(&path, create)?;
                    tx.put(&Record::file(path.clone(), content))?;
                    touch_parent(tx, &path)
                }
            })
        })
    }

    fn append(&self, path: &str, content: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        self.mutate(|c| {
            c.write("append", |tx| {
                let mut record = tx.require(&path)?;
                match &mut record.body {
                    RecordBody::File { content: existing } => existing.push_str(content),
                    RecordBody::Directory => {
                        return abort(FsError::NotAFile { path: path.clone() });
                    }
                }
                record.header.touch();
                tx.put(&record)
            })
        })
    }

    fn touch(&self, path: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        let create = self.create_parents();
        self.mutate(|c| {
            c.write("touch", |tx| {
                match tx.get(&path)? {
                    Some(mut record) => {
                        record.header.touch();
                        tx.put(&record)?;
                    }
                    None => {
                        tx.ensure_parent(&path, create)?;
                        tx.put(&Record::file(path.clone(), ""))?;
                    }
                }
                touch_parent(tx, &path)
            })
        })
    }

    fn remove(&self, path: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        if path::is_root(&path) {
            return Err(FsError::root("remove"));
        }
        self.mutate(|c| {
            let plan = c.read("remove", |r| {
                r.require(&path)?;
                collect(r, &path)
            })?;
            c.write("remove", |tx| {
                for entry in &plan.paths {
                    tx.delete(entry)?;
                }
                touch_parent(tx, &path)
            })?;
            tracing::debug!(path = %path, entries = plan.len(), "removed");
            Ok(())
        })
    }

    fn rename(&self, from: &str, to: &str, overwrite: bool) -> Result<(), FsError> {
        self.relocate(from, to, overwrite, "rename")
    }

    fn move_to(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.relocate(from, to, false, "move")
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        let plan = planner::plan_copy(from, to)?;
        let create = self.create_parents();
        self.mutate(|c| {
            let source = c.read("copy", |r| {
                r.require(&plan.from)?;
                if r.get(&plan.to)?.is_some() {
                    return Err(FsError::AlreadyExists {
                        path: plan.to.clone(),
                        operation: "copy",
                    });
                }
                collect(r, &plan.from)
            })?;
            let pairs = source.relocated(&plan.to);
            let now = Timestamp::now();

            c.write("copy", |tx| {
                tx.ensure_parent(&plan.to, create)?;
                for (old, new) in &pairs {
                    let mut record = tx.require(old)?;
                    record.path = new.clone();
                    record.header.created = now;
                    record.header.modified = now;
                    tx.put(&record)?;
                }
                touch_parent(tx, &plan.to)
            })?;
            tracing::debug!(from = %plan.from, to = %plan.to, entries = pairs.len(), "copied");
            Ok(())
        })
    }
}

impl FsDir for FlatRecordStore {
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
        let path = path::normalize(path);
        self.with_bound(|c| {
            c.read("list", |r| {
                if !r.require(&path)?.is_dir() {
                    return Err(FsError::NotADirectory { path: path.clone() });
                }
                let mut entries: Vec<DirEntry> = r
                    .descendants(&path)?
                    .into_iter()
                    .filter_map(|record| {
                        let name = path::direct_child_name(&record.path, &path)?.to_string();
                        Some(DirEntry {
                            name,
                            file_type: record.file_type(),
                            size: record.size(),
                            path: record.path,
                        })
                    })
                    .collect();
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(ReadDirIter::from_vec(entries))
            })
        })
    }

    fn create_dir(&self, path: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        if path::is_root(&path) {
            return Err(FsError::root("create_dir"));
        }
        let create = self.create_parents();
        self.mutate(|c| {
            c.write("create_dir", |tx| match tx.get(&path)? {
                Some(record) if record.is_dir() => Ok(()),
                Some(_) => abort(FsError::NotADirectory { path: path.clone() }),
                None => {
                    tx.ensure_parent(&path, create)?;
                    tx.put(&Record::directory(path.clone()))?;
                    touch_parent(tx, &path)
                }
            })
        })
    }

    fn create_dir_all(&self, path: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        self.mutate(|c| c.write("create_dir_all", |tx| tx.ensure_dir_chain(&path)))
    }

    /// Sum of the content sizes of every file below `path`.
    fn dir_size(&self, path: &str) -> Result<u64, FsError> {
        let path = path::normalize(path);
        self.with_bound(|c| {
            c.read("dir_size", |r| {
                let target = r.require(&path)?;
                if !target.is_dir() {
                    return Ok(target.size());
                }
                Ok(r.descendants(&path)?.iter().map(Record::size).sum())
            })
        })
    }

    fn walk(&self, path: &str) -> Result<Vec<String>, FsError> {
        let path = path::normalize(path);
        self.with_bound(|c| {
            c.read("walk", |r| {
                r.require(&path)?;
                Ok(collect(r, &path)?.paths)
            })
        })
    }
}

impl FsPermissions for FlatRecordStore {
    fn set_permissions(
        &self,
        path: &str,
        perm: Permissions,
        depth: ChmodDepth,
    ) -> Result<(), FsError> {
        let path = path::normalize(path);
        self.mutate(|c| {
            let plan = c.read("chmod", |r| {
                r.require(&path)?;
                collect(r, &path)
            })?;
            let targets = plan.within_depth(depth);
            c.write("chmod", |tx| {
                for target in &targets {
                    let mut record = tx.require(target)?;
                    record.header.permissions = perm;
                    record.header.touch();
                    tx.put(&record)?;
                }
                Ok(())
            })?;
            tracing::debug!(path = %path, mode = %perm, entries = targets.len(), "permissions set");
            Ok(())
        })
    }
}

impl FsSnapshot for FlatRecordStore {
    fn export_document(&self) -> Result<String, FsError> {
        self.with_bound(|c| {
            let records = c.read("export", |r| r.all())?;
            let docs: Vec<RecordDoc> = records.iter().map(RecordDoc::from).collect();
            serde_json::to_string(&docs).map_err(|e| FsError::Serialization(e.to_string()))
        })
    }

    /// Malformed records are skipped and counted. The survivors replace the
    /// namespace contents in one transaction.
    fn import_document(&self, document: &str) -> Result<ImportReport, FsError> {
        let value: serde_json::Value = serde_json::from_str(document)
            .map_err(|e| FsError::ImportValidation(format!("not a JSON document: {e}")))?;
        let serde_json::Value::Array(items) = value else {
            return Err(FsError::ImportValidation(
                "expected an array of path records".into(),
            ));
        };

        let (accepted, skipped) = accept_records(items);
        let report = ImportReport {
            applied: accepted.len(),
            skipped,
        };

        self.mutate(|c| {
            let existing = c.read("import", |r| {
                let mut paths = r.descendant_paths(path::ROOT)?;
                paths.push(path::ROOT.to_string());
                Ok(paths)
            })?;
            c.write("import", |tx| {
                for old in &existing {
                    tx.delete(old)?;
                }
                if !accepted.contains_key(path::ROOT) {
                    tx.put(&Record::directory(path::ROOT))?;
                }
                for record in accepted.values() {
                    tx.put(record)?;
                }
                Ok(())
            })
        })?;
        tracing::info!(applied = report.applied, skipped = report.skipped, "flat import");
        Ok(report)
    }

    fn clear(&self) -> Result<(), FsError> {
        self.mutate(|c| {
            let existing = c.read("clear", |r| r.descendant_paths(path::ROOT))?;
            c.write("clear", |tx| {
                for old in &existing {
                    tx.delete(old)?;
                }
                tx.put(&Record::directory(path::ROOT))
            })?;
            tracing::info!(removed = existing.len(), "store cleared");
            Ok(())
        })
    }
}

/// Decode each item, dropping the ones that are malformed, duplicated, or
/// whose parent is not an accepted directory.
fn accept_records(items: Vec<serde_json::Value>) -> (BTreeMap<String, Record>, usize) {
    let mut decoded = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RecordDoc>(item)
            .map_err(FsError::from)
            .and_then(Record::try_from)
        {
            Ok(record) => decoded.push(record),
            Err(error) => {
                tracing::warn!(index, %error, "skipping import record");
                skipped += 1;
            }
        }
    }

    // Parents sort before their children.
    decoded.sort_by(|a, b| a.path.cmp(&b.path));
    let mut accepted: BTreeMap<String, Record> = BTreeMap::new();
    for record in decoded {
        let parent_ok = match path::parent(&record.path) {
            None => true,
            Some(parent) if path::is_root(parent) => true,
            Some(parent) => accepted.get(parent).is_some_and(Record::is_dir),
        };
        if !parent_ok || accepted.contains_key(&record.path) {
            tracing::warn!(path = %record.path, "skipping orphaned or duplicate import record");
            skipped += 1;
            continue;
        }
        accepted.insert(record.path.clone(), record);
    }
    (accepted, skipped)
}
