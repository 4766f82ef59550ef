//! Reconciliation engine.
//!
//! Builds a full candidate tree in an isolated workspace, snapshots the
//! authoritative tree, diffs the two, and either reports the delta (check
//! mode) or applies it as a patch (fix mode) behind explicit confirmation
//! for destructive changes.

pub mod diff;
pub mod gate;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::build_file::regenerate_build_files;
use crate::config::ImportMap;
use crate::error::{ProtoSyncError, ProtoSyncResult};
use crate::fs::{copy_tree, create_dir_all};
use crate::git::Vcs;
use crate::package::abs_destination_path;
use crate::pipeline::{sync_proto_file, ACTIVE_SUFFIX, SHADOW_INTERNAL_SUFFIX, SHADOW_SUFFIX};
use crate::tools::{ArtifactStore, ProtoTools};

pub use diff::{diff_trees, TreeDiff};
pub use gate::should_sync;

/// Hand-maintained support files exempt from generation.
const MANUAL_SUPPORT_FILES: [&str; 3] = [
    "envoy/annotations/resource.proto",
    "envoy/annotations/deprecation.proto",
    "envoy/annotations/BUILD",
];

/// Top-level subtrees of the authoritative root that participate in
/// reconciliation.
const SNAPSHOT_SUBTREES: [&str; 2] = ["pb", "envoy"];

/// This tool's own sources; a change there invalidates every cached output.
const TOOL_SOURCE_DIR: &str = "tools";
const TOOL_SOURCE_SUFFIX: &str = ".rs";

const DEFINITION_SUFFIX: &str = ".proto";

/// Reconciliation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report the delta and exit non-zero if one exists.
    Check,
    /// Apply the delta to the authoritative tree.
    Fix,
}

/// Options for one reconciliation run over a single tree root.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mode: Mode,
    /// Authoritative tree root.
    pub root: PathBuf,
    /// Build labels whose artifacts are reconciled.
    pub labels: Vec<String>,
    /// Operate on the shadow (next-major-version) generation track.
    pub shadow: bool,
    /// Bypass the change-detection gate entirely.
    pub force: bool,
}

/// Terminal states of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Candidate and authoritative trees already match.
    Clean,
    /// Check mode found a delta; it was printed for manual application.
    DiffReported,
    /// Fix mode applied the delta to the authoritative tree.
    Applied,
}

/// Interactive confirmation port for the destructive steps of fix mode.
pub trait Prompt: Send + Sync {
    fn confirm(&self, message: &str) -> ProtoSyncResult<bool>;
}

/// Terminal-backed prompt; declines automatically when stdin is not a TTY.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> ProtoSyncResult<bool> {
        use is_terminal::IsTerminal;
        if !std::io::stdin().is_terminal() {
            return Ok(false);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(confirmed)
    }
}

/// Orchestrates one reconciliation run.
pub struct Reconciler<'a> {
    pub import_map: &'a ImportMap,
    pub tools: &'a dyn ProtoTools,
    pub store: &'a dyn ArtifactStore,
    pub vcs: &'a dyn Vcs,
    pub prompt: &'a dyn Prompt,
}

impl Reconciler<'_> {
    pub fn run(&self, opts: &SyncOptions) -> ProtoSyncResult<Outcome> {
        let api_modified = self
            .vcs
            .modified_files(&opts.root.to_string_lossy(), DEFINITION_SUFFIX)?;
        let tools_modified = self.vcs.modified_files(TOOL_SOURCE_DIR, TOOL_SOURCE_SUFFIX)?;

        let workspace = tempfile::tempdir()?;
        let snapshot_root = workspace.path().join("a");
        let candidate_root = workspace.path().join("b");

        // Select candidate artifacts and group them by destination.
        let shadow_suffix = if opts.shadow {
            SHADOW_INTERNAL_SUFFIX
        } else {
            SHADOW_SUFFIX
        };
        let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for label in &opts.labels {
            for suffix in [ACTIVE_SUFFIX, shadow_suffix] {
                let artifact = self.store.output_artifact(label, suffix);
                // Empty artifacts are published placeholders.
                let present = fs::metadata(&artifact)
                    .map(|meta| meta.len() > 0)
                    .unwrap_or(false);
                if !present {
                    continue;
                }
                let (abs_dst, rel_dst) = abs_destination_path(&candidate_root, &artifact)?;
                if should_sync(
                    &artifact.to_string_lossy(),
                    &api_modified,
                    &tools_modified,
                    opts.force,
                ) {
                    groups.entry(abs_dst).or_default().push(artifact);
                } else {
                    println!("skipping sync of {}", artifact.display());
                    fs::copy(opts.root.join(&rel_dst), &abs_dst)?;
                }
            }
        }

        // Pretty-print or merge each destination; units are independent and
        // each writes only its own file.
        let package_targets: Vec<String> = groups
            .par_iter()
            .map(|(dst, srcs)| sync_proto_file(dst, srcs, self.tools))
            .collect::<ProtoSyncResult<_>>()?;
        if !package_targets.is_empty() {
            println!("synced {} definition files", package_targets.len());
        }

        regenerate_build_files(&candidate_root, self.import_map)?;

        // Snapshot the authoritative tree, minus generated docs.
        create_dir_all(&snapshot_root)?;
        for sub in SNAPSHOT_SUBTREES {
            let from = opts.root.join(sub);
            if !from.is_dir() {
                continue;
            }
            copy_tree(&from, &snapshot_root.join(sub), &|rel| {
                rel.extension().map(|e| e == "md").unwrap_or(false)
            })?;
        }

        // Hand-maintained support files are always current.
        for rel in MANUAL_SUPPORT_FILES {
            let src = opts.root.join(rel);
            if !src.is_file() {
                continue;
            }
            let dst = candidate_root.join(rel);
            if let Some(parent) = dst.parent() {
                create_dir_all(parent)?;
            }
            fs::copy(&src, &dst)?;
        }

        let tree_diff = diff_trees(&snapshot_root, &candidate_root)?;
        if tree_diff.is_empty() {
            return Ok(Outcome::Clean);
        }

        match opts.mode {
            Mode::Check => {
                eprintln!("apply the following patch to '{}':", opts.root.display());
                eprintln!("{}", tree_diff.patch);
                Ok(Outcome::DiffReported)
            }
            Mode::Fix => self.apply(opts, &tree_diff),
        }
    }

    fn apply(&self, opts: &SyncOptions, tree_diff: &TreeDiff) -> ProtoSyncResult<Outcome> {
        let status = self.vcs.status(&opts.root)?;
        if !status.trim().is_empty() {
            println!(
                "working tree under {} is dirty:\n{status}",
                opts.root.display()
            );
            println!("applying the patch may overwrite or delete the files above with no backup");
            if !self.prompt.confirm("Continue?")? {
                return Err(ProtoSyncError::Aborted);
            }
        }
        if !tree_diff.deleted.is_empty() {
            println!("the following files will be deleted:");
            for path in &tree_diff.deleted {
                println!("  {}", path.display());
            }
            if !self.prompt.confirm("Delete files?")? {
                return Err(ProtoSyncError::Aborted);
            }
        }
        self.vcs.apply_patch(&opts.root, &tree_diff.patch)?;
        Ok(Outcome::Applied)
    }
}
