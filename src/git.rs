//! Version-control collaborator.
//!
//! The engine needs three queries: files modified since the last merged
//! upstream revision, working-tree dirtiness, and patch application. They
//! run through the `CommandRunner` port so tests can substitute fakes.

use std::path::Path;

use crate::error::{ProtoSyncError, ProtoSyncResult};
use crate::tools::{CommandRunner, ToolOutput};

/// Version-control queries used by the reconciliation engine.
pub trait Vcs: Send + Sync {
    /// Files under `dir` with the extension `suffix` modified since the
    /// last merged upstream revision.
    fn modified_files(&self, dir: &str, suffix: &str) -> ProtoSyncResult<Vec<String>>;

    /// Porcelain status for `path`; empty when the working tree is clean.
    fn status(&self, path: &Path) -> ProtoSyncResult<String>;

    /// Apply a unified diff to the tree rooted at `root`.
    fn apply_patch(&self, root: &Path, diff: &str) -> ProtoSyncResult<()>;
}

/// Git-backed implementation driving `git` and `patch` subprocesses.
pub struct GitVcs<'a> {
    runner: &'a dyn CommandRunner,
    upstream: String,
}

impl<'a> GitVcs<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self::with_upstream(runner, "origin/main")
    }

    pub fn with_upstream(runner: &'a dyn CommandRunner, upstream: impl Into<String>) -> Self {
        Self {
            runner,
            upstream: upstream.into(),
        }
    }

    fn expect_success(context: &str, out: ToolOutput) -> ProtoSyncResult<ToolOutput> {
        if out.success() {
            Ok(out)
        } else {
            Err(ProtoSyncError::Git {
                context: context.to_string(),
                status: out.status,
                stderr: out.stderr,
            })
        }
    }
}

impl Vcs for GitVcs<'_> {
    fn modified_files(&self, dir: &str, suffix: &str) -> ProtoSyncResult<Vec<String>> {
        let base = self
            .runner
            .run("git", &["merge-base", "HEAD", &self.upstream], None, None)?;
        // Exit status 1 means there is nothing to compare against; treat it
        // as an empty modification set.
        if base.status == 1 {
            return Ok(Vec::new());
        }
        let base = Self::expect_success("git merge-base", base)?;
        let base_rev = base.stdout.trim().to_string();

        let diff = self.runner.run(
            "git",
            &["diff", "--name-only", &base_rev, "--", dir],
            None,
            None,
        )?;
        if diff.status == 1 {
            return Ok(Vec::new());
        }
        let diff = Self::expect_success("git diff --name-only", diff)?;
        Ok(diff
            .stdout
            .lines()
            .filter(|line| line.ends_with(suffix))
            .map(str::to_string)
            .collect())
    }

    fn status(&self, path: &Path) -> ProtoSyncResult<String> {
        let path = path.to_string_lossy();
        let out = self
            .runner
            .run("git", &["status", "--porcelain", path.as_ref()], None, None)?;
        Ok(Self::expect_success("git status --porcelain", out)?.stdout)
    }

    fn apply_patch(&self, root: &Path, diff: &str) -> ProtoSyncResult<()> {
        let out = self
            .runner
            .run("patch", &["-p1"], Some(diff.as_bytes()), Some(root))?;
        if !out.success() {
            return Err(ProtoSyncError::Git {
                context: "patch -p1".to_string(),
                status: out.status,
                stderr: out.stderr,
            });
        }
        Ok(())
    }
}
