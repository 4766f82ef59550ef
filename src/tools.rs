//! Ports for the external collaborators: subprocess execution, the
//! pretty-printer / merge tool pair, and the build cache artifact store.
//!
//! Each port is narrow so tests can substitute fakes without touching the
//! host system.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{ProtoSyncError, ProtoSyncResult};

/// Captured output of a finished subprocess.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Narrow subprocess port.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
        cwd: Option<&Path>,
    ) -> ProtoSyncResult<ToolOutput>;
}

/// Runs commands on the host system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
        cwd: Option<&Path>,
    ) -> ProtoSyncResult<ToolOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn()?;
        if let Some(bytes) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(bytes)?;
            }
        }
        let output = child.wait_with_output()?;

        Ok(ToolOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// The pretty-printer / merge tool pair produced by the upstream build.
///
/// Both tools either write their destination atomically or fail; a non-zero
/// exit is fatal and never retried.
pub trait ProtoTools: Send + Sync {
    /// Pretty-print the descriptor at `src` to `dst`.
    fn pretty_print(&self, src: &Path, dst: &Path) -> ProtoSyncResult<()>;

    /// Merge an active descriptor with a shadow candidate into `dst`.
    fn merge(&self, active: &Path, shadow: &Path, dst: &Path) -> ProtoSyncResult<()>;
}

/// Locations of the protoxform binaries in the build output tree.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub protoprint: PathBuf,
    pub merge: PathBuf,
    pub type_db: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            protoprint: PathBuf::from("bazel-bin/tools/protoxform/protoprint"),
            merge: PathBuf::from("bazel-bin/tools/protoxform/merge_active_shadow"),
            type_db: PathBuf::from(
                "bazel-bin/tools/protoxform/protoprint.runfiles/envoy/tools/type_whisperer/api_type_db.pb_text",
            ),
        }
    }
}

/// `ProtoTools` implementation shelling out through a `CommandRunner`.
pub struct ProtoxformTools<'a> {
    runner: &'a dyn CommandRunner,
    paths: ToolPaths,
}

impl<'a> ProtoxformTools<'a> {
    pub fn new(runner: &'a dyn CommandRunner, paths: ToolPaths) -> Self {
        Self { runner, paths }
    }

    fn run_tool(&self, tool: &Path, args: &[&str]) -> ProtoSyncResult<()> {
        let program = tool.to_string_lossy();
        let out = self.runner.run(program.as_ref(), args, None, None)?;
        if !out.success() {
            return Err(ProtoSyncError::ExternalTool {
                tool: program.into_owned(),
                status: out.status,
                stderr: out.stderr,
            });
        }
        Ok(())
    }
}

impl ProtoTools for ProtoxformTools<'_> {
    fn pretty_print(&self, src: &Path, dst: &Path) -> ProtoSyncResult<()> {
        println!("pretty-print {}", dst.display());
        let src = src.to_string_lossy();
        let dst = dst.to_string_lossy();
        let type_db = self.paths.type_db.to_string_lossy();
        self.run_tool(
            &self.paths.protoprint,
            &[src.as_ref(), dst.as_ref(), type_db.as_ref()],
        )
    }

    fn merge(&self, active: &Path, shadow: &Path, dst: &Path) -> ProtoSyncResult<()> {
        println!("merge-active-shadow {}", dst.display());
        let active = active.to_string_lossy();
        let shadow = shadow.to_string_lossy();
        let dst = dst.to_string_lossy();
        self.run_tool(
            &self.paths.merge,
            &[active.as_ref(), shadow.as_ref(), dst.as_ref()],
        )
    }
}

/// Resolves build labels to cache-resident artifact paths.
pub trait ArtifactStore: Send + Sync {
    /// Path of the output artifact for `label` with the given suffix.
    ///
    /// The artifact may not exist; callers must stat before use.
    fn output_artifact(&self, label: &str, suffix: &str) -> PathBuf;
}

/// Artifact store rooted at the Bazel bin directory.
#[derive(Debug, Clone)]
pub struct BazelBinStore {
    bin_root: PathBuf,
}

impl BazelBinStore {
    pub fn new(bin_root: impl Into<PathBuf>) -> Self {
        Self {
            bin_root: bin_root.into(),
        }
    }
}

impl Default for BazelBinStore {
    fn default() -> Self {
        Self::new("bazel-bin")
    }
}

impl ArtifactStore for BazelBinStore {
    fn output_artifact(&self, label: &str, suffix: &str) -> PathBuf {
        // "@envoy_api//envoy/admin/v3:certs" -> "envoy/admin/v3/certs"
        let label = label.split_once("//").map_or(label, |(_, rest)| rest);
        let rel = label.replace(':', "/");
        self.bin_root.join(format!("{rel}{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bazel_bin_store_maps_labels_to_cache_paths() {
        let store = BazelBinStore::default();
        assert_eq!(
            store.output_artifact(
                "@envoy_api//envoy/admin/v3:certs.proto",
                ".active_or_frozen.proto"
            ),
            PathBuf::from("bazel-bin/envoy/admin/v3/certs.proto.active_or_frozen.proto")
        );
        assert_eq!(
            store.output_artifact(
                "//envoy/admin/v3:certs.proto",
                ".next_major_version_candidate.proto"
            ),
            PathBuf::from("bazel-bin/envoy/admin/v3/certs.proto.next_major_version_candidate.proto")
        );
    }

    #[test]
    fn system_runner_reports_exit_status() {
        let runner = SystemRunner;
        let ok = runner.run("true", &[], None, None).unwrap();
        assert!(ok.success());

        let bad = runner.run("false", &[], None, None).unwrap();
        assert_eq!(bad.status, 1);
    }

    #[test]
    fn system_runner_pipes_stdin() {
        let runner = SystemRunner;
        let out = runner.run("cat", &[], Some(b"hello\n"), None).unwrap();
        assert_eq!(out.stdout, "hello\n");
    }
}
