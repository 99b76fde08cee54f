//! # Virtual Paths
//!
//! Canonicalization and pure helpers for store paths.
//!
//! Every path that enters the store goes through [`normalize`] first, so two
//! spellings of the same location always compare equal as strings:
//!
//! ```rust
//! use vfstore::path::normalize;
//!
//! assert_eq!(normalize("/a//b/../c/"), "/a/c");
//! assert_eq!(normalize(r"docs\notes\.\todo.txt"), "/docs/notes/todo.txt");
//! assert_eq!(normalize("../../x"), "/x");
//! assert_eq!(normalize("   "), "/");
//! ```
//!
//! Paths are case-sensitive and always use `/`. There is no notion of a
//! relative path inside the store; a missing leading separator is implied.

/// The root path.
pub const ROOT: &str = "/";

/// Canonicalize an arbitrary string into an absolute store path.
///
/// Backslashes become `/`, repeated separators collapse, `.` segments drop
/// out, and `..` pops the previous segment (popping past the root is a
/// no-op). Empty or whitespace-only input is the root.
pub fn normalize(path: &str) -> String {
    if path.trim().is_empty() {
        return ROOT.to_string();
    }

    let cleaned = path.replace('\\', "/");
    let mut resolved: Vec<&str> = Vec::new();
    for part in cleaned.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                resolved.pop();
            }
            segment => resolved.push(segment),
        }
    }

    let mut out = String::with_capacity(cleaned.len() + 1);
    for segment in &resolved {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Whether `name` is usable as one path segment: non-blank and unchanged
/// by normalization (no separators, no `.` or `..`).
pub fn is_segment(name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    let rooted = format!("/{name}");
    normalize(&rooted) == rooted
}

/// Whether `path` is the root.
#[inline]
pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Segments of a normalized path; empty for the root.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Prefix shared by every strict descendant of `dir`.
///
/// The trailing separator keeps `/ab` from matching under `/a`.
pub fn descendant_prefix(dir: &str) -> String {
    if is_root(dir) {
        ROOT.to_string()
    } else {
        format!("{dir}/")
    }
}

/// Whether `path` is a strict descendant of `dir` (both normalized).
pub fn is_descendant(path: &str, dir: &str) -> bool {
    path != dir && path.starts_with(&descendant_prefix(dir))
}

/// Number of segments `path` sits below `dir`, if it is `dir` or inside it.
pub fn depth_below(path: &str, dir: &str) -> Option<usize> {
    if path == dir {
        return Some(0);
    }
    let rest = path.strip_prefix(&descendant_prefix(dir))?;
    Some(segments(rest).count())
}

/// Name of a direct child of `dir`, if `path` is one.
pub fn direct_child_name<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    if path == dir {
        return None;
    }
    let rest = path.strip_prefix(&descendant_prefix(dir))?;
    (!rest.is_empty() && !rest.contains('/')).then_some(rest)
}

/// Parent of a normalized path; `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => Some(ROOT),
    }
}

/// Last segment of a normalized path; `None` for the root.
pub fn file_name(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    path.rsplit('/').next()
}

/// Substitute the `from` prefix of `path` with `to`.
///
/// `path` must be `from` itself or one of its descendants.
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    let suffix = path.strip_prefix(from).unwrap_or("");
    if is_root(to) {
        normalize(suffix)
    } else {
        format!("{to}{suffix}")
    }
}

/// Join two path fragments and normalize the result.
pub fn join(base: &str, child: &str) -> String {
    normalize(&format!("{base}/{child}"))
}

/// Last segment of `path`, or `/` for the root.
pub fn basename(path: &str) -> String {
    let normalized = normalize(path);
    file_name(&normalized).unwrap_or(ROOT).to_string()
}

/// Parent directory of `path`, or `/` for the root.
pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    parent(&normalized).unwrap_or(ROOT).to_string()
}

/// Extension of the last segment including the dot (`".txt"`).
///
/// Dotfiles such as `.profile` have no extension.
pub fn extension(path: &str) -> String {
    let name = basename(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_examples() {
        assert_eq!(normalize("/a//b/../c/"), "/a/c");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("../../x"), "/x");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("a/./b"), "/a/b");
        assert_eq!(normalize("\\a\\b\\"), "/a/b");
        assert_eq!(normalize("/a/b/../../.."), "/");
    }

    #[test]
    fn single_segments() {
        assert!(is_segment("notes.txt"));
        assert!(is_segment(".profile"));
        for bad in ["", "  ", ".", "..", "a/b", r"a\b", "a/../b"] {
            assert!(!is_segment(bad), "{bad:?}");
        }
    }

    #[test]
    fn descendant_boundary() {
        assert!(is_descendant("/a/b", "/a"));
        assert!(!is_descendant("/ab", "/a"));
        assert!(!is_descendant("/a", "/a"));
        assert!(is_descendant("/a", "/"));
        assert!(!is_descendant("/", "/"));
    }

    #[test]
    fn depth_and_children() {
        assert_eq!(depth_below("/a", "/a"), Some(0));
        assert_eq!(depth_below("/a/b/c", "/a"), Some(2));
        assert_eq!(depth_below("/ab", "/a"), None);
        assert_eq!(direct_child_name("/a/b", "/a"), Some("b"));
        assert_eq!(direct_child_name("/a/b/c", "/a"), None);
        assert_eq!(direct_child_name("/x", "/"), Some("x"));
    }

    #[test]
    fn parent_and_name() {
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/a"), Some("/"));
        assert_eq!(parent("/a/b"), Some("/a"));
        assert_eq!(file_name("/a/b.txt"), Some("b.txt"));
        assert_eq!(file_name("/"), None);
    }

    #[test]
    fn rebase_prefix() {
        assert_eq!(rebase("/a/b/c", "/a", "/z"), "/z/b/c");
        assert_eq!(rebase("/a", "/a", "/z/y"), "/z/y");
    }

    #[test]
    fn helpers() {
        assert_eq!(join("/", ""), "/");
        assert_eq!(join("/docs/", "/a.txt"), "/docs/a.txt");
        assert_eq!(basename("/path/to/file.txt"), "file.txt");
        assert_eq!(basename("/"), "/");
        assert_eq!(dirname("/path/to/file.txt"), "/path/to");
        assert_eq!(dirname("/file"), "/");
        assert_eq!(extension("/path/to/file.tar.gz"), ".gz");
        assert_eq!(extension("/home/.profile"), "");
        assert_eq!(extension("/README"), "");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(input in "[a-z./\\\\ ]{0,24}") {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.starts_with('/'));
            prop_assert!(once == "/" || !once.ends_with('/'));
        }
    }
}
