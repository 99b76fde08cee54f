//! In-memory tree backend.
//!
//! The store owns one root [`Node`]; directories own their children. Every
//! operation validates first and edits the tree second, all under one write
//! lock, so a rejected operation never leaves a half-applied edit.

use parking_lot::RwLock;

use crate::node::{Node, NodeBody, NodeDoc, NodeKind};
use crate::planner;
use crate::{
    ChmodDepth, DirEntry, FsDir, FsError, FsPermissions, FsRead, FsSnapshot, FsWrite,
    ImportReport, Metadata, Permissions, ReadDirIter, StoreConfig, Timestamp, path,
};

/// Owned, nested, in-memory store.
///
/// Ready as soon as it is constructed. [`clear`](FsSnapshot::clear) and
/// [`import_document`](FsSnapshot::import_document) swap the whole root.
///
/// ```rust
/// use vfstore::{FsDir, FsRead, FsWrite, TreeNodeStore};
///
/// let fs = TreeNodeStore::new();
/// fs.create_dir("/a").unwrap();
/// fs.write("/a/b.txt", "hi").unwrap();
/// assert_eq!(fs.read_to_string("/a/b.txt").unwrap(), "hi");
/// assert_eq!(fs.dir_size("/a").unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct TreeNodeStore {
    root: RwLock<Node>,
    create_parents: bool,
}

impl Default for TreeNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeNodeStore {
    /// An empty store holding only the root directory.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::directory()),
            create_parents: false,
        }
    }

    /// An empty store honoring `config.create_parents`.
    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            root: RwLock::new(Node::directory()),
            create_parents: config.create_parents,
        }
    }

    fn relocate(
        &self,
        from: &str,
        to: &str,
        overwrite: bool,
        operation: &'static str,
    ) -> Result<(), FsError> {
        let mut root = self.root.write();
        let Some(plan) = planner::plan_relocation(from, to, overwrite, operation)? else {
            let same = path::normalize(from);
            return lookup(&root, &same)
                .map(|_| ())
                .ok_or_else(|| FsError::not_found(&same));
        };

        if lookup(&root, &plan.from).is_none() {
            return Err(FsError::not_found(&plan.from));
        }
        if lookup(&root, &plan.to).is_some() && !overwrite {
            return Err(FsError::AlreadyExists {
                path: plan.to.clone(),
                operation,
            });
        }
        check_parent(&root, &plan.to, self.create_parents)?;

        if overwrite {
            match detach(&mut root, &plan.to) {
                Ok(_) | Err(FsError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        let mut node = detach(&mut root, &plan.from)?;
        node.header.touch();
        attach(&mut root, &plan.to, node, self.create_parents)?;
        tracing::debug!(operation, from = %plan.from, to = %plan.to, "relocated");
        Ok(())
    }
}

// ============================================================================
// Tree walking
// ============================================================================

fn lookup<'a>(root: &'a Node, path: &str) -> Option<&'a Node> {
    let mut current = root;
    for segment in path::segments(path) {
        current = current.children()?.get(segment)?;
    }
    Some(current)
}

fn lookup_mut<'a>(root: &'a mut Node, path: &str) -> Option<&'a mut Node> {
    let mut current = root;
    for segment in path::segments(path) {
        current = current.children_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Walk to the directory at `dir`, creating missing directories if asked.
fn resolve_dir_mut<'a>(
    root: &'a mut Node,
    dir: &str,
    create: bool,
) -> Result<&'a mut Node, FsError> {
    let mut current = root;
    let mut walked = String::new();
    for segment in path::segments(dir) {
        let parent_path = if walked.is_empty() {
            path::ROOT.to_string()
        } else {
            walked.clone()
        };
        walked.push('/');
        walked.push_str(segment);

        let Some(children) = current.children() else {
            return Err(FsError::NotADirectory { path: parent_path });
        };
        if !children.contains_key(segment) {
            if !create {
                return Err(FsError::not_found(&walked));
            }
            current.header.touch();
        }
        let Some(children) = current.children_mut() else {
            return Err(FsError::NotADirectory { path: parent_path });
        };
        current = children
            .entry(segment.to_string())
            .or_insert_with(Node::directory);
    }
    if current.children().is_none() {
        return Err(FsError::NotADirectory {
            path: path::normalize(dir),
        });
    }
    Ok(current)
}

/// Check, without editing, that the parent of `path` is (or could be made)
/// a directory.
fn check_parent(root: &Node, path: &str, create: bool) -> Result<(), FsError> {
    let Some(parent) = path::parent(path) else {
        return Ok(());
    };
    let mut current = root;
    let mut walked = String::new();
    for segment in path::segments(parent) {
        walked.push('/');
        walked.push_str(segment);
        let Some(children) = current.children() else {
            return Err(FsError::NotADirectory {
                path: path::dirname(&walked),
            });
        };
        match children.get(segment) {
            Some(child) => current = child,
            None if create => return Ok(()),
            None => return Err(FsError::not_found(&walked)),
        }
    }
    match current.body {
        NodeBody::Directory { .. } => Ok(()),
        NodeBody::File { .. } => Err(FsError::NotADirectory {
            path: parent.to_string(),
        }),
    }
}

/// Remove the node at `path` from its parent and return it.
fn detach(root: &mut Node, path: &str) -> Result<Node, FsError> {
    let (Some(parent_path), Some(name)) = (path::parent(path), path::file_name(path)) else {
        return Err(FsError::root("remove"));
    };
    let parent = lookup_mut(root, parent_path).ok_or_else(|| FsError::not_found(path))?;
    let removed = parent
        .children_mut()
        .and_then(|children| children.remove(name))
        .ok_or_else(|| FsError::not_found(path))?;
    parent.header.touch();
    Ok(removed)
}

/// Insert `node` at `path`, which must be free.
fn attach(root: &mut Node, path: &str, node: Node, create: bool) -> Result<(), FsError> {
    let (Some(parent_path), Some(name)) = (path::parent(path), path::file_name(path)) else {
        return Err(FsError::root("attach"));
    };
    let parent = resolve_dir_mut(root, parent_path, create)?;
    if let Some(children) = parent.children_mut() {
        children.insert(name.to_string(), node);
    }
    parent.header.touch();
    Ok(())
}

/// Collect phase for chmod: every path within `depth` below `path`.
fn collect_within(node: &Node, path: &str, depth: ChmodDepth, out: &mut Vec<String>) {
    out.push(path.to_string());
    let (Some(children), Some(next)) = (node.children(), depth.descend()) else {
        return;
    };
    for (name, child) in children {
        collect_within(child, &path::join(path, name), next, out);
    }
}

impl FsRead for TreeNodeStore {
    fn read_to_string(&self, path: &str) -> Result<String, FsError> {
        let path = path::normalize(path);
        let root = self.root.read();
        match &lookup(&root, &path).ok_or_else(|| FsError::not_found(&path))?.body {
            NodeBody::File { content } => Ok(content.clone()),
            NodeBody::Directory { .. } => Err(FsError::NotAFile { path }),
        }
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        let path = path::normalize(path);
        Ok(lookup(&self.root.read(), &path).is_some())
    }

    fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
        let path = path::normalize(path);
        lookup(&self.root.read(), &path)
            .map(Node::metadata)
            .ok_or_else(|| FsError::not_found(&path))
    }
}

impl FsWrite for TreeNodeStore {
    fn write(&self, path: &str, content: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        if path::is_root(&path) {
            return Err(FsError::root("write"));
        }
        let mut root = self.root.write();
        match lookup_mut(&mut root, &path) {
            Some(node) => match &mut node.body {
                NodeBody::File { content: existing } => {
                    *existing = content.to_string();
                    node.header.touch();
                    Ok(())
                }
                NodeBody::Directory { .. } => Err(FsError::NotAFile { path }),
            },
            None => attach(&mut root, &path, Node::file(content), self.create_parents),
        }
    }

    fn append(&self, path: &str, content: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        let mut root = self.root.write();
        let node = lookup_mut(&mut root, &path).ok_or_else(|| FsError::not_found(&path))?;
        match &mut node.body {
            NodeBody::File { content: existing } => existing.push_str(content),
            NodeBody::Directory { .. } => return Err(FsError::NotAFile { path }),
        }
        node.header.touch();
        Ok(())
    }

    fn touch(&self, path: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        let mut root = self.root.write();
        match lookup_mut(&mut root, &path) {
            Some(node) => {
                node.header.touch();
                if let Some(parent) = path::parent(&path).and_then(|p| lookup_mut(&mut root, p)) {
                    parent.header.touch();
                }
                Ok(())
            }
            None => attach(&mut root, &path, Node::file(""), self.create_parents),
        }
    }

    fn remove(&self, path: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        if path::is_root(&path) {
            return Err(FsError::root("remove"));
        }
        detach(&mut self.root.write(), &path)?;
        tracing::debug!(path = %path, "removed");
        Ok(())
    }

    fn rename(&self, from: &str, to: &str, overwrite: bool) -> Result<(), FsError> {
        self.relocate(from, to, overwrite, "rename")
    }

    fn move_to(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.relocate(from, to, false, "move")
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        let plan = planner::plan_copy(from, to)?;
        let mut root = self.root.write();
        let clone = lookup(&root, &plan.from)
            .ok_or_else(|| FsError::not_found(&plan.from))?
            .clone_fresh(Timestamp::now());
        if lookup(&root, &plan.to).is_some() {
            return Err(FsError::AlreadyExists {
                path: plan.to,
                operation: "copy",
            });
        }
        attach(&mut root, &plan.to, clone, self.create_parents)?;
        tracing::debug!(from = %plan.from, to = %plan.to, "copied");
        Ok(())
    }
}

impl FsDir for TreeNodeStore {
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
        let path = path::normalize(path);
        let root = self.root.read();
        let node = lookup(&root, &path).ok_or_else(|| FsError::not_found(&path))?;
        let children = node
            .children()
            .ok_or_else(|| FsError::NotADirectory { path: path.clone() })?;
        let entries = children
            .iter()
            .map(|(name, child)| DirEntry {
                name: name.clone(),
                path: path::join(&path, name),
                file_type: child.file_type(),
                size: child.size(),
            })
            .collect();
        Ok(ReadDirIter::from_vec(entries))
    }

    fn create_dir(&self, path: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        if path::is_root(&path) {
            return Err(FsError::root("create_dir"));
        }
        let mut root = self.root.write();
        match lookup(&root, &path) {
            Some(node) if node.children().is_some() => Ok(()),
            Some(_) => Err(FsError::NotADirectory { path }),
            None => attach(&mut root, &path, Node::directory(), self.create_parents),
        }
    }

    fn create_dir_all(&self, path: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        resolve_dir_mut(&mut self.root.write(), &path, true).map(|_| ())
    }

    /// Number of direct children; a file reports its content length.
    fn dir_size(&self, path: &str) -> Result<u64, FsError> {
        let path = path::normalize(path);
        let root = self.root.read();
        let node = lookup(&root, &path).ok_or_else(|| FsError::not_found(&path))?;
        Ok(match node.children() {
            Some(children) => children.len() as u64,
            None => node.size(),
        })
    }

    fn walk(&self, path: &str) -> Result<Vec<String>, FsError> {
        let path = path::normalize(path);
        let root = self.root.read();
        let node = lookup(&root, &path).ok_or_else(|| FsError::not_found(&path))?;
        let mut out = Vec::new();
        collect_within(node, &path, ChmodDepth::Unlimited, &mut out);
        out.sort();
        Ok(out)
    }
}

impl FsPermissions for TreeNodeStore {
    fn set_permissions(
        &self,
        path: &str,
        perm: Permissions,
        depth: ChmodDepth,
    ) -> Result<(), FsError> {
        let path = path::normalize(path);
        let mut root = self.root.write();

        let mut targets = Vec::new();
        let node = lookup(&root, &path).ok_or_else(|| FsError::not_found(&path))?;
        collect_within(node, &path, depth, &mut targets);

        for target in &targets {
            if let Some(node) = lookup_mut(&mut root, target) {
                node.header.permissions = perm;
                node.header.touch();
            }
        }
        tracing::debug!(path = %path, mode = %perm, entries = targets.len(), "permissions set");
        Ok(())
    }
}

impl FsSnapshot for TreeNodeStore {
    fn export_document(&self) -> Result<String, FsError> {
        let doc = NodeDoc::from(&*self.root.read());
        serde_json::to_string(&doc).map_err(|e| FsError::Serialization(e.to_string()))
    }

    /// The whole document is validated before the root is swapped.
    fn import_document(&self, document: &str) -> Result<ImportReport, FsError> {
        let doc: NodeDoc = serde_json::from_str(document)
            .map_err(|e| FsError::ImportValidation(format!("not a node document: {e}")))?;
        if doc.kind != NodeKind::Directory {
            return Err(FsError::ImportValidation(
                "root node must be a directory".into(),
            ));
        }
        let root = Node::try_from(doc)?;
        let mut count = Vec::new();
        collect_within(&root, path::ROOT, ChmodDepth::Unlimited, &mut count);

        *self.root.write() = root;
        let report = ImportReport {
            applied: count.len(),
            skipped: 0,
        };
        tracing::info!(applied = report.applied, "tree import");
        Ok(report)
    }

    fn clear(&self) -> Result<(), FsError> {
        *self.root.write() = Node::directory();
        tracing::info!("store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn lookup_stops_at_files() {
        let fs = TreeNodeStore::new();
        fs.write("/f", "x").unwrap();
        assert!(!fs.exists("/f/child").unwrap());
        let err = fs.write("/f/child", "y").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongKind);
    }

    #[test]
    fn create_parents_builds_intermediates() {
        let config = StoreConfig {
            create_parents: true,
            ..StoreConfig::temporary()
        };
        let fs = TreeNodeStore::with_config(&config);
        fs.write("/x/y/z.txt", "deep").unwrap();
        assert!(fs.metadata("/x/y").unwrap().is_dir());
        fs.copy("/x", "/q/r/x").unwrap();
        assert_eq!(fs.read_to_string("/q/r/x/y/z.txt").unwrap(), "deep");
    }

    #[test]
    fn implicit_directories_touch_their_parent() {
        let fs = TreeNodeStore::new();
        let before = fs.metadata("/").unwrap().modified;
        std::thread::sleep(std::time::Duration::from_millis(5));
        fs.create_dir_all("/x/y").unwrap();
        assert!(fs.metadata("/").unwrap().modified > before);
        let x = fs.metadata("/x").unwrap();
        assert!(x.modified >= x.created);
    }

    #[test]
    fn overwrite_onto_free_destination_moves_source() {
        let fs = TreeNodeStore::new();
        fs.create_dir("/a").unwrap();
        fs.write("/a/f", "x").unwrap();
        fs.rename("/a", "/b", true).unwrap();
        assert!(!fs.exists("/a").unwrap());
        assert_eq!(fs.read_to_string("/b/f").unwrap(), "x");
    }

    #[test]
    fn missing_parent_without_create_parents() {
        let fs = TreeNodeStore::new();
        let err = fs.write("/x/y.txt", "v").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn rename_with_overwrite_replaces_destination() {
        let fs = TreeNodeStore::new();
        fs.create_dir("/a").unwrap();
        fs.write("/a/keep", "a").unwrap();
        fs.create_dir("/b").unwrap();
        fs.write("/b/old", "b").unwrap();
        fs.rename("/a", "/b", true).unwrap();
        assert!(!fs.exists("/a").unwrap());
        assert!(!fs.exists("/b/old").unwrap());
        assert_eq!(fs.read_to_string("/b/keep").unwrap(), "a");
    }

    #[test]
    fn failed_move_does_not_detach_source() {
        let fs = TreeNodeStore::new();
        fs.write("/f", "x").unwrap();
        fs.write("/g", "file, not a directory").unwrap();
        let err = fs.move_to("/f", "/g/f").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongKind);
        assert_eq!(fs.read_to_string("/f").unwrap(), "x");
    }

    #[test]
    fn dir_size_counts_children() {
        let fs = TreeNodeStore::new();
        fs.create_dir("/d").unwrap();
        fs.write("/d/a", "12345").unwrap();
        fs.create_dir("/d/sub").unwrap();
        fs.write("/d/sub/b", "x").unwrap();
        assert_eq!(fs.dir_size("/d").unwrap(), 2);
        assert_eq!(fs.dir_size("/d/a").unwrap(), 5);
    }

    #[test]
    fn import_rejects_file_root() {
        let fs = TreeNodeStore::new();
        fs.write("/keep", "x").unwrap();
        let err = fs
            .import_document(r#"{"kind":"file","content":"x"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImportValidationFailure);
        assert!(fs.exists("/keep").unwrap());
    }

    #[test]
    fn import_preserves_timestamps() {
        let fs = TreeNodeStore::new();
        let doc = r#"{"kind":"directory","permissions":493,"createdAt":5,"modifiedAt":6,
            "children":{"a.txt":{"kind":"file","content":"hi","permissions":384,"createdAt":7,"modifiedAt":8}}}"#;
        let report = fs.import_document(doc).unwrap();
        assert_eq!(report.applied, 2);
        let meta = fs.metadata("/a.txt").unwrap();
        assert_eq!(meta.created, Timestamp(7));
        assert_eq!(meta.permissions.mode(), 0o600);
    }
}
