//! Filesystem helpers shared by the sync engine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Create `dir` and any missing parents, idempotently.
///
/// Directories are created with mode `0o755` on Unix.
#[cfg(unix)]
pub fn create_dir_all(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
pub fn create_dir_all(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Collect every file under `root` as a path relative to `root`, sorted.
///
/// A missing `root` yields an empty list.
pub fn walk_relative_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if root.is_dir() {
        walk_recursive(root, root, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn walk_recursive(root: &Path, current: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_recursive(root, &path, files)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            files.push(rel.to_path_buf());
        }
    }
    Ok(())
}

/// Copy the tree at `src` into `dst`, skipping files matched by `exclude`.
///
/// `exclude` receives paths relative to `src`.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &dyn Fn(&Path) -> bool) -> io::Result<()> {
    for rel in walk_relative_files(src)? {
        if exclude(&rel) {
            continue;
        }
        let to = dst.join(&rel);
        if let Some(parent) = to.parent() {
            create_dir_all(parent)?;
        }
        fs::copy(src.join(&rel), &to)?;
    }
    Ok(())
}
