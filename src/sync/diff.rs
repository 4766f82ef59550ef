//! Structural diff between the snapshot and candidate trees.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::error::ProtoSyncResult;
use crate::fs::walk_relative_files;

/// Unified diff of two directory trees plus the paths an application of it
/// would delete.
#[derive(Debug, Clone, Default)]
pub struct TreeDiff {
    pub patch: String,
    pub deleted: Vec<PathBuf>,
}

impl TreeDiff {
    pub fn is_empty(&self) -> bool {
        self.patch.trim().is_empty()
    }
}

/// Diff `old_root` (snapshot) against `new_root` (candidate).
///
/// Headers use `a/`/`b/` prefixes and `/dev/null` for creations and
/// deletions, so the result applies with `patch -p1` at the tree root.
pub fn diff_trees(old_root: &Path, new_root: &Path) -> ProtoSyncResult<TreeDiff> {
    let old_files: BTreeSet<PathBuf> = walk_relative_files(old_root)?.into_iter().collect();
    let new_files: BTreeSet<PathBuf> = walk_relative_files(new_root)?.into_iter().collect();

    let mut patch = String::new();
    let mut deleted = Vec::new();

    for rel in old_files.union(&new_files) {
        let in_old = old_files.contains(rel);
        let in_new = new_files.contains(rel);
        let old_text = if in_old {
            fs::read_to_string(old_root.join(rel))?
        } else {
            String::new()
        };
        let new_text = if in_new {
            fs::read_to_string(new_root.join(rel))?
        } else {
            String::new()
        };
        if in_old && in_new && old_text == new_text {
            continue;
        }
        if !in_new {
            deleted.push(rel.clone());
        }

        let old_header = if in_old {
            format!("a/{}", rel.display())
        } else {
            "/dev/null".to_string()
        };
        let new_header = if in_new {
            format!("b/{}", rel.display())
        } else {
            "/dev/null".to_string()
        };
        let file_diff = TextDiff::from_lines(&old_text, &new_text);
        patch.push_str(
            &file_diff
                .unified_diff()
                .context_radius(3)
                .header(&old_header, &new_header)
                .to_string(),
        );
    }

    Ok(TreeDiff { patch, deleted })
}
