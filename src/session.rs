//! # Host Call Surface
//!
//! [`Session`] is what an embedding host calls. Every call goes through the
//! store's [`OperationQueue`], and no call ever returns an error: failures
//! are recorded in the [`ErrorReporter`] and turned into a benign default.
//!
//! | Result | Shape | Default on failure |
//! |--------|-------|--------------------|
//! | commands and predicates | `bool` | `false` |
//! | content, size, time, property queries | `String` (numbers as decimal text) | `""` |
//! | listings | JSON array text | `"[]"` |
//!
//! ```rust
//! use vfstore::{ErrorReporter, Session, TreeNodeStore};
//!
//! let session = Session::with_reporter(TreeNodeStore::new(), ErrorReporter::new());
//! assert!(session.create_directory("/a"));
//! assert!(session.write_file("/a/b.txt", "hi"));
//! assert_eq!(session.read_file("/a/b.txt"), "hi");
//! assert_eq!(session.list("/", "all"), r#"["a"]"#);
//!
//! assert_eq!(session.read_file("/a"), "");
//! assert_eq!(session.last_error(), "read: not a file: /a");
//! assert_eq!(session.last_error(), "");
//! ```

use crate::layer::Layer;
use crate::{
    ChmodDepth, ErrorReporter, FlatRecordStore, FsError, FsExt, FsFull, ListFilter,
    OperationQueue, Permissions, codec, path,
};

/// Serialized, never-failing front end over a backend.
pub struct Session<B: FsFull + 'static> {
    queue: OperationQueue<B>,
    reporter: ErrorReporter,
}

impl<B: FsFull + 'static> Session<B> {
    /// Wrap `backend`, reporting into the process-wide slot.
    pub fn new(backend: B) -> Self {
        Self::with_reporter(backend, ErrorReporter::global().clone())
    }

    /// Wrap `backend`, reporting into `reporter`.
    pub fn with_reporter(backend: B, reporter: ErrorReporter) -> Self {
        Self {
            queue: OperationQueue::new(backend),
            reporter,
        }
    }

    /// The queue every call goes through.
    pub fn queue(&self) -> &OperationQueue<B> {
        &self.queue
    }

    /// The reporter failures are recorded in.
    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Most recent failure message, cleared on read. Empty if none.
    pub fn last_error(&self) -> String {
        self.reporter.take()
    }

    fn call<R, F>(&self, scope: &'static str, default: R, f: F) -> R
    where
        R: Send + 'static,
        F: FnOnce(&B) -> Result<R, FsError> + Send + 'static,
    {
        match self.queue.run(f) {
            Ok(value) => value,
            Err(error) => {
                self.reporter.record(scope, &error);
                default
            }
        }
    }

    fn command<F>(&self, scope: &'static str, f: F) -> bool
    where
        F: FnOnce(&B) -> Result<(), FsError> + Send + 'static,
    {
        self.call(scope, false, move |fs| f(fs).map(|()| true))
    }

    fn text<F>(&self, scope: &'static str, f: F) -> String
    where
        F: FnOnce(&B) -> Result<String, FsError> + Send + 'static,
    {
        self.call(scope, String::new(), f)
    }

    fn json_list<F>(&self, scope: &'static str, f: F) -> String
    where
        F: FnOnce(&B) -> Result<Vec<String>, FsError> + Send + 'static,
    {
        self.call(scope, "[]".to_string(), move |fs| {
            let items = f(fs)?;
            serde_json::to_string(&items).map_err(|e| FsError::Serialization(e.to_string()))
        })
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Create a directory.
    pub fn create_directory(&self, path: &str) -> bool {
        let path = path.to_string();
        self.command("create_dir", move |fs| fs.create_dir(&path))
    }

    /// Create or overwrite a file.
    pub fn write_file(&self, path: &str, content: &str) -> bool {
        let (path, content) = (path.to_string(), content.to_string());
        self.command("write", move |fs| fs.write(&path, &content))
    }

    /// Append to an existing file.
    pub fn append_file(&self, path: &str, content: &str) -> bool {
        let (path, content) = (path.to_string(), content.to_string());
        self.command("append", move |fs| fs.append(&path, &content))
    }

    /// Create an empty file or bump its modification time.
    pub fn touch(&self, path: &str) -> bool {
        let path = path.to_string();
        self.command("touch", move |fs| fs.touch(&path))
    }

    /// Delete a file or a whole directory subtree.
    pub fn delete(&self, path: &str) -> bool {
        let path = path.to_string();
        self.command("delete", move |fs| fs.remove(&path))
    }

    /// Rename, optionally replacing the destination.
    pub fn rename(&self, from: &str, to: &str, overwrite: bool) -> bool {
        let (from, to) = (from.to_string(), to.to_string());
        self.command("rename", move |fs| fs.rename(&from, &to, overwrite))
    }

    /// Move without ever replacing the destination.
    pub fn move_item(&self, from: &str, to: &str) -> bool {
        let (from, to) = (from.to_string(), to.to_string());
        self.command("move", move |fs| fs.move_to(&from, &to))
    }

    /// Deep copy with fresh timestamps.
    pub fn copy(&self, from: &str, to: &str) -> bool {
        let (from, to) = (from.to_string(), to.to_string());
        self.command("copy", move |fs| fs.copy(&from, &to))
    }

    /// Set permissions from octal text, descending `depth` levels (empty or
    /// negative means no limit).
    pub fn chmod(&self, path: &str, mode: &str, depth: &str) -> bool {
        let parsed = Permissions::parse_octal(mode)
            .and_then(|perm| depth.parse::<ChmodDepth>().map(|d| (perm, d)));
        let (perm, depth) = match parsed {
            Ok(parsed) => parsed,
            Err(error) => {
                self.reporter.record("chmod", &error);
                return false;
            }
        };
        let path = path.to_string();
        self.command("chmod", move |fs| fs.set_permissions(&path, perm, depth))
    }

    /// Replace the store with a fresh empty root.
    pub fn clear(&self) -> bool {
        self.command("clear", |fs| fs.clear())
    }

    /// Replace the store with an exported document, optionally compacted.
    pub fn import(&self, document: &str, compacted: bool) -> bool {
        let document = document.to_string();
        self.command("import", move |fs| {
            let text = if compacted {
                codec::expand(&document)?
            } else {
                document
            };
            fs.import_document(&text).map(|_| ())
        })
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// Whether anything lives at `path`.
    pub fn exists(&self, path: &str) -> bool {
        let path = path.to_string();
        self.call("exists", false, move |fs| fs.exists(&path))
    }

    /// Whether `path` is a file.
    pub fn is_file(&self, path: &str) -> bool {
        let path = path.to_string();
        self.call("is_file", false, move |fs| fs.is_file(&path))
    }

    /// Whether `path` is a directory.
    pub fn is_directory(&self, path: &str) -> bool {
        let path = path.to_string();
        self.call("is_directory", false, move |fs| fs.is_dir(&path))
    }

    // ------------------------------------------------------------------
    // Text queries
    // ------------------------------------------------------------------

    /// File content.
    pub fn read_file(&self, path: &str) -> String {
        let path = path.to_string();
        self.text("read", move |fs| fs.read_to_string(&path))
    }

    /// File content length (`0` for a directory).
    pub fn file_size(&self, path: &str) -> String {
        let path = path.to_string();
        self.text("size", move |fs| fs.file_size(&path).map(|n| n.to_string()))
    }

    /// Backend-defined directory size.
    pub fn directory_size(&self, path: &str) -> String {
        let path = path.to_string();
        self.text("dir_size", move |fs| fs.dir_size(&path).map(|n| n.to_string()))
    }

    /// Creation time in milliseconds.
    pub fn created_at(&self, path: &str) -> String {
        let path = path.to_string();
        self.text("created_at", move |fs| {
            fs.metadata(&path).map(|m| m.created.to_string())
        })
    }

    /// Modification time in milliseconds.
    pub fn modified_at(&self, path: &str) -> String {
        let path = path.to_string();
        self.text("modified_at", move |fs| {
            fs.metadata(&path).map(|m| m.modified.to_string())
        })
    }

    /// `"file"`, `"directory"` or `"none"`.
    pub fn path_type(&self, path: &str) -> String {
        let path = path.to_string();
        self.text("path_type", move |fs| fs.path_type(&path).map(str::to_string))
    }

    /// One named attribute: `path`, `isDirectory`, `size`, `createdAt`,
    /// `modifiedAt` or `permissions`.
    pub fn property(&self, name: &str, path: &str) -> String {
        let (name, path) = (name.trim().to_string(), path::normalize(path));
        self.text("property", move |fs| {
            let meta = fs.metadata(&path)?;
            match name.as_str() {
                "path" => Ok(path),
                "isDirectory" => Ok(meta.is_dir().to_string()),
                "size" => Ok(meta.size.to_string()),
                "createdAt" => Ok(meta.created.to_string()),
                "modifiedAt" => Ok(meta.modified.to_string()),
                "permissions" => Ok(meta.permissions.to_string()),
                other => Err(FsError::InvalidArgument {
                    operation: "property",
                    details: format!("unknown property '{other}'"),
                }),
            }
        })
    }

    /// The whole store as a document, optionally compacted.
    pub fn export(&self, compacted: bool) -> String {
        self.text("export", move |fs| {
            let document = fs.export_document()?;
            if compacted {
                codec::compact(&document)
            } else {
                Ok(document)
            }
        })
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    /// Child names of `path` as a JSON array; `filter` is `all`, `files` or
    /// `directories`.
    pub fn list(&self, path: &str, filter: &str) -> String {
        let filter = match filter.parse::<ListFilter>() {
            Ok(filter) => filter,
            Err(error) => {
                self.reporter.record("list", &error);
                return "[]".to_string();
            }
        };
        let path = path.to_string();
        self.json_list("list", move |fs| fs.list(&path, filter))
    }

    /// Every path in the store as a JSON array.
    pub fn all_paths(&self) -> String {
        self.json_list("all_paths", |fs| fs.walk(path::ROOT))
    }

    // ------------------------------------------------------------------
    // Pure path helpers
    // ------------------------------------------------------------------

    /// Join and normalize two fragments.
    pub fn join(&self, base: &str, child: &str) -> String {
        path::join(base, child)
    }

    /// Last path segment.
    pub fn basename(&self, path: &str) -> String {
        path::basename(path)
    }

    /// Parent directory.
    pub fn dirname(&self, path: &str) -> String {
        path::dirname(path)
    }

    /// Extension including the dot, or empty.
    pub fn extension(&self, path: &str) -> String {
        path::extension(path)
    }
}

impl Session<FlatRecordStore> {
    /// Bind a namespace on the flat backend.
    pub fn load(&self, namespace: &str) -> bool {
        let namespace = namespace.to_string();
        self.command("load", move |fs| fs.load(&namespace))
    }

    /// Wipe and unbind the current namespace.
    pub fn reset(&self) -> bool {
        self.command("reset", |fs| fs.reset())
    }

    /// The bound namespace, or empty.
    pub fn namespace(&self) -> String {
        self.call("namespace", String::new(), |fs| {
            Ok(fs.namespace().unwrap_or_default())
        })
    }

    /// Whether a namespace is bound.
    pub fn is_ready(&self) -> bool {
        self.call("is_ready", false, |fs| Ok(fs.is_ready()))
    }
}

/// Builds a [`Session`] around any backend.
///
/// ```rust
/// use vfstore::{ErrorReporter, LayerExt, SessionLayer, TreeNodeStore};
///
/// let session = TreeNodeStore::new().layer(SessionLayer::new(ErrorReporter::new()));
/// assert!(session.touch("/hello"));
/// assert_eq!(session.path_type("/hello"), "file");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionLayer {
    reporter: ErrorReporter,
}

impl SessionLayer {
    /// A layer whose sessions report into `reporter`.
    pub fn new(reporter: ErrorReporter) -> Self {
        Self { reporter }
    }

    /// A layer whose sessions report into the process-wide slot.
    pub fn global() -> Self {
        Self::new(ErrorReporter::global().clone())
    }
}

impl<B: FsFull + 'static> Layer<B> for SessionLayer {
    type Backend = Session<B>;

    fn layer(self, backend: B) -> Self::Backend {
        Session::with_reporter(backend, self.reporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StoreConfig, TreeNodeStore};

    fn session() -> Session<TreeNodeStore> {
        Session::with_reporter(TreeNodeStore::new(), ErrorReporter::new())
    }

    #[test]
    fn failures_become_defaults() {
        let s = session();
        assert!(!s.delete("/"));
        assert!(s.last_error().starts_with("delete: remove: invalid path"));
        assert_eq!(s.file_size("/missing"), "");
        assert_eq!(s.list("/missing", "all"), "[]");
        assert_eq!(s.last_error(), "list: not found: /missing");
        assert!(!s.exists("/missing"));
        assert_eq!(s.last_error(), "");
    }

    #[test]
    fn properties() {
        let s = session();
        assert!(s.write_file("/f.txt", "abc"));
        assert!(s.chmod("/f.txt", "600", "0"));
        assert_eq!(s.property("path", "f.txt"), "/f.txt");
        assert_eq!(s.property("isDirectory", "/f.txt"), "false");
        assert_eq!(s.property("size", "/f.txt"), "3");
        assert_eq!(s.property("permissions", "/f.txt"), "600");
        assert_eq!(s.property("colour", "/f.txt"), "");
        assert!(s.last_error().contains("unknown property 'colour'"));
    }

    #[test]
    fn bad_chmod_arguments_are_reported() {
        let s = session();
        assert!(s.create_directory("/d"));
        assert!(!s.chmod("/d", "rwx", ""));
        assert!(s.last_error().starts_with("chmod: chmod: invalid argument"));
        assert!(!s.chmod("/d", "755", "deep"));
        assert!(!s.last_error().is_empty());
    }

    #[test]
    fn unknown_list_filter_is_reported() {
        let s = session();
        assert_eq!(s.list("/", "links"), "[]");
        assert!(s.last_error().contains("unknown listing filter"));
    }

    #[test]
    fn compacted_export_round_trip() {
        let s = session();
        assert!(s.create_directory("/a"));
        assert!(s.write_file("/a/b.txt", "payload"));
        let packed = s.export(true);
        assert!(!packed.is_empty());

        let other = session();
        assert!(other.import(&packed, true));
        assert_eq!(other.read_file("/a/b.txt"), "payload");
        assert!(!other.import("%%%", true));
        assert!(other.last_error().starts_with("import: compaction codec"));
    }

    #[test]
    fn flat_lifecycle() {
        let s = Session::with_reporter(
            FlatRecordStore::new(StoreConfig::temporary()),
            ErrorReporter::new(),
        );
        assert!(!s.is_ready());
        assert!(!s.write_file("/x", "y"));
        assert!(s.last_error().contains("not initialized"));
        assert!(s.load("alpha"));
        assert_eq!(s.namespace(), "alpha");
        assert!(s.write_file("/x", "y"));
        assert_eq!(s.all_paths(), r#"["/","/x"]"#);
        assert!(s.reset());
        assert_eq!(s.namespace(), "");
    }

    #[test]
    fn path_helpers() {
        let s = session();
        assert_eq!(s.join("/a", "b/../c"), "/a/c");
        assert_eq!(s.basename("/a/c.txt"), "c.txt");
        assert_eq!(s.dirname("/a/c.txt"), "/a");
        assert_eq!(s.extension("/a/c.txt"), ".txt");
    }
}
