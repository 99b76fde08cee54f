//! Core types shared by both backends.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::FsError;

/// Type of a store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Regular file holding text content.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Lowercase name used by the text surface (`"file"` / `"directory"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::File => "file",
            FileType::Directory => "directory",
        }
    }
}

/// Milliseconds since the Unix epoch.
///
/// [`Timestamp::now`] never goes backwards within one process, even if the
/// wall clock does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

impl Timestamp {
    /// Current time, clamped so successive calls are non-decreasing.
    pub fn now() -> Self {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let prev = LAST_TIMESTAMP.fetch_max(wall, Ordering::SeqCst);
        Timestamp(prev.max(wall))
    }

    /// Raw millisecond value.
    #[inline]
    pub const fn millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata for a store entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Type of the entry.
    pub file_type: FileType,
    /// Content length in bytes for files, `0` for directories.
    pub size: u64,
    /// Stored (never enforced) permissions.
    pub permissions: Permissions,
    /// Creation time.
    pub created: Timestamp,
    /// Last modification time.
    pub modified: Timestamp,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            file_type: FileType::File,
            size: 0,
            permissions: Permissions::default_file(),
            created: Timestamp::default(),
            modified: Timestamp::default(),
        }
    }
}

/// A directory entry returned from `read_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Name of the entry (last path segment).
    pub name: String,
    /// Full normalized path to the entry.
    pub path: String,
    /// Type of the entry.
    pub file_type: FileType,
    /// Content length in bytes (`0` for directories).
    pub size: u64,
}

/// Unix-style permission bits. Stored and reported, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Default permissions for a new file (0o644 = rw-r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o644)
    }

    /// Default permissions for a new directory (0o755 = rwxr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o755)
    }

    /// Parse an octal mode string such as `"755"` or `"0o644"`.
    pub fn parse_octal(text: &str) -> Result<Self, FsError> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
        u32::from_str_radix(digits, 8)
            .map(Self::from_mode)
            .map_err(|_| FsError::InvalidArgument {
                operation: "chmod",
                details: format!("invalid permission mode '{trimmed}'"),
            })
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.0)
    }
}

/// Which direct children a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    /// Files and directories.
    #[default]
    All,
    /// Files only.
    Files,
    /// Directories only.
    Directories,
}

impl ListFilter {
    /// Whether an entry of `file_type` passes this filter.
    pub fn accepts(&self, file_type: FileType) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Files => file_type == FileType::File,
            ListFilter::Directories => file_type == FileType::Directory,
        }
    }
}

impl FromStr for ListFilter {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" | "both" => Ok(ListFilter::All),
            "files" => Ok(ListFilter::Files),
            "directories" => Ok(ListFilter::Directories),
            other => Err(FsError::InvalidArgument {
                operation: "list",
                details: format!("unknown listing filter '{other}'"),
            }),
        }
    }
}

/// How far a permission change descends below its target.
///
/// `Limited(0)` touches only the target; `Limited(n)` also touches
/// descendants up to `n` levels down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChmodDepth {
    /// Stop after this many levels below the target.
    Limited(u32),
    /// Recurse through the whole subtree.
    #[default]
    Unlimited,
}

impl ChmodDepth {
    /// Whether a node `level` segments below the target is included.
    pub fn reaches(&self, level: usize) -> bool {
        match self {
            ChmodDepth::Unlimited => true,
            ChmodDepth::Limited(n) => level <= *n as usize,
        }
    }

    /// Depth budget for the children of a node with this depth.
    pub fn descend(&self) -> Option<ChmodDepth> {
        match self {
            ChmodDepth::Unlimited => Some(ChmodDepth::Unlimited),
            ChmodDepth::Limited(0) => None,
            ChmodDepth::Limited(n) => Some(ChmodDepth::Limited(n - 1)),
        }
    }
}

impl FromStr for ChmodDepth {
    type Err = FsError;

    /// Empty text or any negative number means unlimited.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(ChmodDepth::Unlimited);
        }
        match trimmed.parse::<i64>() {
            Ok(n) if n < 0 => Ok(ChmodDepth::Unlimited),
            Ok(n) => Ok(ChmodDepth::Limited(u32::try_from(n).unwrap_or(u32::MAX))),
            Err(_) => Err(FsError::InvalidArgument {
                operation: "chmod",
                details: format!("invalid depth '{trimmed}'"),
            }),
        }
    }
}

/// Outcome of importing an export document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    /// Records or nodes written to the store.
    pub applied: usize,
    /// Malformed records that were skipped.
    pub skipped: usize,
}
