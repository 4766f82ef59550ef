//! Common test utilities for protosync integration tests.
//!
//! Provides fake collaborator ports and a fixture builder that lays out an
//! artifact cache plus an authoritative tree in temp directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use protosync::error::ProtoSyncResult;
use protosync::git::Vcs;
use protosync::sync::Prompt;
use protosync::tools::ProtoTools;

/// A recorded tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Print { src: PathBuf, dst: PathBuf },
    Merge { active: PathBuf, shadow: PathBuf },
}

/// Fake protoxform pair: pretty-printing copies the source through and
/// merging copies the active source, so candidate content stays parseable.
#[derive(Default)]
pub struct FakeTools {
    pub calls: Mutex<Vec<ToolCall>>,
}

impl ProtoTools for FakeTools {
    fn pretty_print(&self, src: &Path, dst: &Path) -> ProtoSyncResult<()> {
        self.calls.lock().unwrap().push(ToolCall::Print {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
        });
        fs::copy(src, dst)?;
        Ok(())
    }

    fn merge(&self, active: &Path, shadow: &Path, dst: &Path) -> ProtoSyncResult<()> {
        self.calls.lock().unwrap().push(ToolCall::Merge {
            active: active.to_path_buf(),
            shadow: shadow.to_path_buf(),
        });
        fs::copy(active, dst)?;
        Ok(())
    }
}

/// Fake version control with canned answers and recorded patches.
#[derive(Default)]
pub struct FakeVcs {
    pub proto_modified: Vec<String>,
    pub tools_modified: Vec<String>,
    pub dirty_status: String,
    pub applied: Mutex<Vec<(PathBuf, String)>>,
}

impl Vcs for FakeVcs {
    fn modified_files(&self, _dir: &str, suffix: &str) -> ProtoSyncResult<Vec<String>> {
        if suffix == ".proto" {
            Ok(self.proto_modified.clone())
        } else {
            Ok(self.tools_modified.clone())
        }
    }

    fn status(&self, _path: &Path) -> ProtoSyncResult<String> {
        Ok(self.dirty_status.clone())
    }

    fn apply_patch(&self, root: &Path, diff: &str) -> ProtoSyncResult<()> {
        self.applied
            .lock()
            .unwrap()
            .push((root.to_path_buf(), diff.to_string()));
        Ok(())
    }
}

/// Prompt with a fixed answer, recording every question asked.
pub struct FakePrompt {
    pub answer: bool,
    pub asked: Mutex<Vec<String>>,
}

impl FakePrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompt for FakePrompt {
    fn confirm(&self, message: &str) -> ProtoSyncResult<bool> {
        self.asked.lock().unwrap().push(message.to_string());
        Ok(self.answer)
    }
}

/// Write `content` at `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Descriptor artifact content: a package declaration plus pretty-printed
/// body lines, enough for every extraction pattern in the tool.
pub fn definition_file(package: &str, body: &str) -> String {
    format!("package: \"{package}\"\n{body}")
}
