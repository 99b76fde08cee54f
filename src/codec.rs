//! Reversible compaction for export documents.
//!
//! `compact` deflates the text with zlib and wraps the bytes in standard
//! base64, so the result is plain ASCII that survives any text transport.
//! `expand` is its exact inverse. Empty input maps to empty output in both
//! directions.
//!
//! ```rust
//! use vfstore::codec::{compact, expand};
//!
//! let doc = r#"[{"path":"/","isDirectory":true}]"#;
//! let packed = compact(doc).unwrap();
//! assert_eq!(expand(&packed).unwrap(), doc);
//! assert!(expand("not base64 at all!").is_err());
//! ```

use std::io::{Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::FsError;

/// Compress `text` into base64-wrapped zlib.
pub fn compact(text: &str) -> Result<String, FsError> {
    if text.is_empty() {
        return Ok(String::new());
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| FsError::Compaction(e.to_string()))?;
    let bytes = encoder
        .finish()
        .map_err(|e| FsError::Compaction(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

/// Invert [`compact`].
///
/// # Errors
///
/// [`FsError::Compaction`] if the text is not base64, not a zlib stream, or
/// does not inflate to UTF-8.
pub fn expand(text: &str) -> Result<String, FsError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let bytes = STANDARD
        .decode(trimmed)
        .map_err(|e| FsError::Compaction(format!("invalid base64: {e}")))?;
    let mut out = String::new();
    ZlibDecoder::new(bytes.as_slice())
        .read_to_string(&mut out)
        .map_err(|e| FsError::Compaction(format!("invalid compressed stream: {e}")))?;
    Ok(out)
}
