//! # Recursive Operation Planner
//!
//! Directory-scoped operations (delete, move, rename, copy, chmod, listing,
//! directory size) run in two phases:
//!
//! 1. **Collect**: enumerate the target plus every descendant. Nothing is
//!    mutated while the enumeration runs.
//! 2. **Mutate**: apply the operation to the collected entries in one unit
//!    (one transaction on the flat backend, one pass on the tree backend).
//!
//! This module owns the backend-independent half: argument validation for
//! relocations and the collected [`SubtreePlan`].

use crate::path;
use crate::{ChmodDepth, FsError};

/// A validated relocation of one subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Normalized source.
    pub from: String,
    /// Normalized destination.
    pub to: String,
}

/// Validate a move or rename.
///
/// Returns `Ok(None)` when source and destination are the same path (the
/// operation is a no-op once the source is known to exist). Existence checks
/// are left to the backend.
pub fn plan_relocation(
    from: &str,
    to: &str,
    overwrite: bool,
    operation: &'static str,
) -> Result<Option<Relocation>, FsError> {
    let from = path::normalize(from);
    let to = path::normalize(to);

    if path::is_root(&from) || path::is_root(&to) {
        return Err(FsError::root(operation));
    }
    if from == to {
        return Ok(None);
    }
    if path::is_descendant(&to, &from) {
        return Err(FsError::SelfContainment { from, to, operation });
    }
    // Replacing an ancestor of the source would delete the source with it.
    if overwrite && path::is_descendant(&from, &to) {
        return Err(FsError::SelfContainment { from, to, operation });
    }
    Ok(Some(Relocation { from, to }))
}

/// Validate a copy. The destination must be a fresh path outside the source.
pub fn plan_copy(from: &str, to: &str) -> Result<Relocation, FsError> {
    let from = path::normalize(from);
    let to = path::normalize(to);

    if path::is_root(&from) || path::is_root(&to) {
        return Err(FsError::root("copy"));
    }
    if from == to {
        return Err(FsError::AlreadyExists {
            path: to,
            operation: "copy",
        });
    }
    if path::is_descendant(&to, &from) {
        return Err(FsError::SelfContainment {
            from,
            to,
            operation: "copy",
        });
    }
    Ok(Relocation { from, to })
}

/// The collected target of a directory-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreePlan {
    /// The target path.
    pub target: String,
    /// Target first, then every descendant in sorted order.
    pub paths: Vec<String>,
}

impl SubtreePlan {
    /// Keep `target` and the candidates that are strict descendants of it.
    ///
    /// Candidates that merely share a textual prefix (`/ab` under `/a`) are
    /// dropped.
    pub fn collect<I, S>(target: &str, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut descendants: Vec<String> = candidates
            .into_iter()
            .filter(|c| path::is_descendant(c.as_ref(), target))
            .map(|c| c.as_ref().to_string())
            .collect();
        descendants.sort();
        descendants.dedup();

        let mut paths = Vec::with_capacity(descendants.len() + 1);
        paths.push(target.to_string());
        paths.extend(descendants);
        Self {
            target: target.to_string(),
            paths,
        }
    }

    /// Number of collected entries, target included.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always `false`: the target itself is part of the plan.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// `(old, new)` pairs with the target prefix swapped for `to`.
    pub fn relocated(&self, to: &str) -> Vec<(String, String)> {
        self.paths
            .iter()
            .map(|p| (p.clone(), path::rebase(p, &self.target, to)))
            .collect()
    }

    /// Collected paths no deeper than `depth` below the target.
    pub fn within_depth(&self, depth: ChmodDepth) -> Vec<&str> {
        self.paths
            .iter()
            .filter(|p| {
                path::depth_below(p, &self.target)
                    .map(|level| depth.reaches(level))
                    .unwrap_or(false)
            })
            .map(String::as_str)
            .collect()
    }

    /// Names of the target's direct children, in sorted order.
    pub fn direct_children(&self) -> Vec<&str> {
        self.paths
            .iter()
            .filter_map(|p| path::direct_child_name(p, &self.target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn relocation_rejects_root_either_side() {
        let err = plan_relocation("/", "/x", false, "move").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        let err = plan_relocation("/x", "", false, "rename").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn relocation_into_own_subtree_is_rejected() {
        let err = plan_relocation("/a", "/a/sub", false, "move").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SelfContainment);
    }

    #[test]
    fn overwriting_an_ancestor_is_rejected() {
        assert!(plan_relocation("/a/b", "/a", false, "rename").unwrap().is_some());
        let err = plan_relocation("/a/b", "/a", true, "rename").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SelfContainment);
    }

    #[test]
    fn same_path_is_a_no_op() {
        assert_eq!(plan_relocation("/a/", "a", true, "rename").unwrap(), None);
    }

    #[test]
    fn sibling_with_shared_prefix_is_not_contained() {
        let plan = plan_relocation("/a", "/ab", false, "move").unwrap().unwrap();
        assert_eq!(plan.to, "/ab");
    }

    #[test]
    fn copy_validation() {
        assert_eq!(
            plan_copy("/a", "/a").unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            plan_copy("/a", "/a/b").unwrap_err().kind(),
            ErrorKind::SelfContainment
        );
        assert_eq!(plan_copy("/", "/b").unwrap_err().kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn collect_respects_separator_boundary() {
        let plan = SubtreePlan::collect("/a", ["/a/c/d.txt", "/ab", "/a/b.txt", "/a/c", "/"]);
        assert_eq!(plan.paths, vec!["/a", "/a/b.txt", "/a/c", "/a/c/d.txt"]);
        assert_eq!(plan.direct_children(), vec!["b.txt", "c"]);
    }

    #[test]
    fn relocated_pairs_swap_prefix() {
        let plan = SubtreePlan::collect("/a", ["/a/b", "/a/b/c"]);
        assert_eq!(
            plan.relocated("/z"),
            vec![
                ("/a".to_string(), "/z".to_string()),
                ("/a/b".to_string(), "/z/b".to_string()),
                ("/a/b/c".to_string(), "/z/b/c".to_string()),
            ]
        );
    }

    #[test]
    fn depth_filter() {
        let plan = SubtreePlan::collect("/a", ["/a/b", "/a/b/c", "/a/d"]);
        assert_eq!(plan.within_depth(ChmodDepth::Limited(0)), vec!["/a"]);
        assert_eq!(
            plan.within_depth(ChmodDepth::Limited(1)),
            vec!["/a", "/a/b", "/a/d"]
        );
        assert_eq!(plan.within_depth(ChmodDepth::Unlimited).len(), 4);
    }
}
