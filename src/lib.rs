//! protosync - proto descriptor reconciliation tool
//!
//! protosync takes the pretty-printable descriptor artifacts produced by
//! the upstream transform pipeline, reconciles them with the
//! hand-maintained API tree, and regenerates the per-directory BUILD
//! descriptors that accompany them.

pub mod build_file;
pub mod config;
pub mod deps;
pub mod error;
pub mod fs;
pub mod git;
pub mod package;
pub mod pipeline;
pub mod sync;
pub mod tools;

// Re-exports for convenience
pub use build_file::{build_file_contents, build_order_key, regenerate_build_files};
pub use config::ImportMap;
pub use deps::{has_services, import_deps, previous_message_type_deps};
pub use error::{ProtoSyncError, ProtoSyncResult};
pub use git::{GitVcs, Vcs};
pub use package::{abs_destination_path, destination_path, package_directory};
pub use pipeline::sync_proto_file;
pub use sync::{
    diff_trees, should_sync, Mode, Outcome, Prompt, Reconciler, SyncOptions, TerminalPrompt,
    TreeDiff,
};
pub use tools::{
    ArtifactStore, BazelBinStore, CommandRunner, ProtoTools, ProtoxformTools, SystemRunner,
    ToolOutput, ToolPaths,
};
