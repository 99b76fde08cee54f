//! # Node and Record Model
//!
//! Entity definitions shared by both backends.
//!
//! A file or directory is a tagged variant over one common [`NodeHeader`]:
//!
//! | Backend | Entity | Body |
//! |---------|--------|------|
//! | tree | [`Node`] | [`NodeBody::File`] / [`NodeBody::Directory`] (owns children) |
//! | flat | [`Record`] | [`RecordBody::File`] / [`RecordBody::Directory`] (children implied by path prefix) |
//!
//! Neither representation can express a directory with content or a file
//! with children. The document structs ([`RecordDoc`], [`NodeDoc`]) carry the
//! portable JSON shapes and are validated into the typed model before any
//! store is touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FileType, FsError, Metadata, Permissions, Timestamp};

/// Attributes every node carries regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    /// Informational permission bits.
    pub permissions: Permissions,
    /// Creation time.
    pub created: Timestamp,
    /// Last mutation of the node or, for directories, of their membership.
    pub modified: Timestamp,
}

impl NodeHeader {
    /// Fresh header stamped with the current time.
    pub fn fresh(permissions: Permissions) -> Self {
        let now = Timestamp::now();
        Self {
            permissions,
            created: now,
            modified: now,
        }
    }

    /// Bump the modification time.
    pub fn touch(&mut self) {
        self.modified = Timestamp::now();
    }
}

// ============================================================================
// Tree backend
// ============================================================================

/// Kind-specific part of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    /// A file and its content.
    File {
        /// Text payload.
        content: String,
    },
    /// A directory and its uniquely-named children.
    Directory {
        /// Children keyed by name.
        children: BTreeMap<String, Node>,
    },
}

/// A node in the in-memory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Shared attributes.
    pub header: NodeHeader,
    /// File content or directory children.
    pub body: NodeBody,
}

impl Node {
    /// New empty directory.
    pub fn directory() -> Self {
        Self {
            header: NodeHeader::fresh(Permissions::default_dir()),
            body: NodeBody::Directory {
                children: BTreeMap::new(),
            },
        }
    }

    /// New file with `content`.
    pub fn file(content: impl Into<String>) -> Self {
        Self {
            header: NodeHeader::fresh(Permissions::default_file()),
            body: NodeBody::File {
                content: content.into(),
            },
        }
    }

    /// Kind of this node.
    pub fn file_type(&self) -> FileType {
        match self.body {
            NodeBody::File { .. } => FileType::File,
            NodeBody::Directory { .. } => FileType::Directory,
        }
    }

    /// Children map, if this is a directory.
    pub fn children(&self) -> Option<&BTreeMap<String, Node>> {
        match &self.body {
            NodeBody::Directory { children } => Some(children),
            NodeBody::File { .. } => None,
        }
    }

    /// Mutable children map, if this is a directory.
    pub fn children_mut(&mut self) -> Option<&mut BTreeMap<String, Node>> {
        match &mut self.body {
            NodeBody::Directory { children } => Some(children),
            NodeBody::File { .. } => None,
        }
    }

    /// Byte length of a file's content, `0` for directories.
    pub fn size(&self) -> u64 {
        match &self.body {
            NodeBody::File { content } => content.len() as u64,
            NodeBody::Directory { .. } => 0,
        }
    }

    /// Metadata snapshot.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            file_type: self.file_type(),
            size: self.size(),
            permissions: self.header.permissions,
            created: self.header.created,
            modified: self.header.modified,
        }
    }

    /// Deep copy with every timestamp reset to `now`.
    ///
    /// Children are built before their parent so the copy never aliases the
    /// source.
    pub fn clone_fresh(&self, now: Timestamp) -> Node {
        let body = match &self.body {
            NodeBody::File { content } => NodeBody::File {
                content: content.clone(),
            },
            NodeBody::Directory { children } => NodeBody::Directory {
                children: children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.clone_fresh(now)))
                    .collect(),
            },
        };
        Node {
            header: NodeHeader {
                permissions: self.header.permissions,
                created: now,
                modified: now,
            },
            body,
        }
    }
}

/// Document kind tag for tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Directory node.
    Directory,
    /// File node.
    File,
}

/// Portable JSON shape of a tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDoc {
    /// `"directory"` or `"file"`.
    pub kind: NodeKind,
    /// Children (directories only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, NodeDoc>>,
    /// Content (files only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Permission bits.
    #[serde(default = "default_doc_permissions")]
    pub permissions: u32,
    /// Creation time in milliseconds.
    #[serde(default)]
    pub created_at: u64,
    /// Modification time in milliseconds.
    #[serde(default)]
    pub modified_at: u64,
}

fn default_doc_permissions() -> u32 {
    Permissions::default_file().mode()
}

impl From<&Node> for NodeDoc {
    fn from(node: &Node) -> Self {
        let (kind, children, content) = match &node.body {
            NodeBody::File { content } => (NodeKind::File, None, Some(content.clone())),
            NodeBody::Directory { children } => (
                NodeKind::Directory,
                Some(
                    children
                        .iter()
                        .map(|(name, child)| (name.clone(), NodeDoc::from(child)))
                        .collect(),
                ),
                None,
            ),
        };
        NodeDoc {
            kind,
            children,
            content,
            permissions: node.header.permissions.mode(),
            created_at: node.header.created.millis(),
            modified_at: node.header.modified.millis(),
        }
    }
}

impl TryFrom<NodeDoc> for Node {
    type Error = FsError;

    /// Validate the whole subtree; the first malformed node rejects it.
    fn try_from(doc: NodeDoc) -> Result<Self, Self::Error> {
        let header = NodeHeader {
            permissions: Permissions::from_mode(doc.permissions),
            created: Timestamp(doc.created_at),
            modified: Timestamp(doc.modified_at),
        };
        let body = match doc.kind {
            NodeKind::File => {
                if doc.children.is_some() {
                    return Err(FsError::ImportValidation(
                        "file node carries children".into(),
                    ));
                }
                NodeBody::File {
                    content: doc.content.unwrap_or_default(),
                }
            }
            NodeKind::Directory => {
                let Some(children) = doc.children else {
                    return Err(FsError::ImportValidation(
                        "directory node has no children mapping".into(),
                    ));
                };
                let mut out = BTreeMap::new();
                for (name, child) in children {
                    if !crate::path::is_segment(&name) {
                        return Err(FsError::ImportValidation(format!(
                            "invalid child name '{name}'"
                        )));
                    }
                    out.insert(name, Node::try_from(child)?);
                }
                NodeBody::Directory { children: out }
            }
        };
        Ok(Node { header, body })
    }
}

// ============================================================================
// Flat backend
// ============================================================================

/// Kind-specific part of a flat record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
    /// A file and its content.
    File {
        /// Text payload.
        content: String,
    },
    /// A directory; membership is implied by path prefixes.
    Directory,
}

/// One row of the flat store, keyed by its normalized path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Normalized absolute path.
    pub path: String,
    /// Shared attributes.
    pub header: NodeHeader,
    /// File content or directory marker.
    pub body: RecordBody,
}

impl Record {
    /// New directory record.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            header: NodeHeader::fresh(Permissions::default_dir()),
            body: RecordBody::Directory,
        }
    }

    /// New file record.
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            header: NodeHeader::fresh(Permissions::default_file()),
            body: RecordBody::File {
                content: content.into(),
            },
        }
    }

    /// Kind of this record.
    pub fn file_type(&self) -> FileType {
        match self.body {
            RecordBody::File { .. } => FileType::File,
            RecordBody::Directory => FileType::Directory,
        }
    }

    /// Whether this record is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self.body, RecordBody::Directory)
    }

    /// Byte length of a file's content, `0` for directories.
    pub fn size(&self) -> u64 {
        match &self.body {
            RecordBody::File { content } => content.len() as u64,
            RecordBody::Directory => 0,
        }
    }

    /// Metadata snapshot.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            file_type: self.file_type(),
            size: self.size(),
            permissions: self.header.permissions,
            created: self.header.created,
            modified: self.header.modified,
        }
    }

    /// Encode to the stored/exported JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, FsError> {
        serde_json::to_vec(&RecordDoc::from(self)).map_err(|e| FsError::Serialization(e.to_string()))
    }

    /// Decode stored JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, FsError> {
        let doc: RecordDoc = serde_json::from_slice(bytes)?;
        Record::try_from(doc)
    }
}

/// Permission bits as stored in a flat record (`{"mode": 420}`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecordPermissions {
    /// Raw mode bits.
    pub mode: u32,
}

/// Portable JSON shape of a flat record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDoc {
    /// Absolute path.
    pub path: String,
    /// Directory marker.
    pub is_directory: bool,
    /// File content; `null` for directories.
    #[serde(default)]
    pub content: Option<String>,
    /// Content byte length.
    #[serde(default)]
    pub size: u64,
    /// Creation time in milliseconds.
    #[serde(default)]
    pub created_at: u64,
    /// Modification time in milliseconds.
    #[serde(default)]
    pub modified_at: u64,
    /// Optional permission object; other shapes fall back to defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<serde_json::Value>,
}

impl From<&Record> for RecordDoc {
    fn from(record: &Record) -> Self {
        let content = match &record.body {
            RecordBody::File { content } => Some(content.clone()),
            RecordBody::Directory => None,
        };
        RecordDoc {
            path: record.path.clone(),
            is_directory: record.is_dir(),
            content,
            size: record.size(),
            created_at: record.header.created.millis(),
            modified_at: record.header.modified.millis(),
            permissions: serde_json::to_value(RecordPermissions {
                mode: record.header.permissions.mode(),
            })
            .ok(),
        }
    }
}

impl TryFrom<RecordDoc> for Record {
    type Error = FsError;

    fn try_from(doc: RecordDoc) -> Result<Self, Self::Error> {
        if doc.path.trim().is_empty() {
            return Err(FsError::ImportValidation("record has an empty path".into()));
        }
        let path = crate::path::normalize(&doc.path);
        let body = if doc.is_directory {
            if doc.content.is_some() {
                return Err(FsError::ImportValidation(format!(
                    "directory record {path} carries content"
                )));
            }
            RecordBody::Directory
        } else {
            RecordBody::File {
                content: doc.content.unwrap_or_default(),
            }
        };
        if path == crate::path::ROOT && !matches!(body, RecordBody::Directory) {
            return Err(FsError::ImportValidation("root record must be a directory".into()));
        }
        let default_mode = match body {
            RecordBody::Directory => Permissions::default_dir(),
            RecordBody::File { .. } => Permissions::default_file(),
        };
        let permissions = match &doc.permissions {
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .map(|m| Permissions::from_mode(m as u32))
                .unwrap_or(default_mode),
            Some(value) => serde_json::from_value::<RecordPermissions>(value.clone())
                .map(|p| Permissions::from_mode(p.mode))
                .unwrap_or(default_mode),
            None => default_mode,
        };
        Ok(Record {
            path,
            header: NodeHeader {
                permissions,
                created: Timestamp(doc.created_at),
                modified: Timestamp(doc.modified_at),
            },
            body,
        })
    }
}
