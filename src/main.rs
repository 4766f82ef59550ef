//! protosync CLI - proto descriptor reconciliation tool
//!
//! Usage: protosync [--mode <check|fix>] [labels...]
//!
//! Reconciles the active API tree and then the shadow (next major version)
//! tree against the generated descriptor artifacts.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use protosync::config::ImportMap;
use protosync::git::GitVcs;
use protosync::sync::{Mode, Outcome, Reconciler, SyncOptions, TerminalPrompt};
use protosync::tools::{BazelBinStore, ProtoxformTools, SystemRunner, ToolPaths};
use protosync::ProtoSyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliMode {
    /// Report the delta and exit non-zero if one exists
    Check,
    /// Apply the delta to the authoritative tree
    Fix,
}

/// protosync - reconcile generated proto descriptors with the API tree
#[derive(Parser, Debug)]
#[command(name = "protosync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Report (check) or apply (fix) the computed delta
    #[arg(long, value_enum, default_value = "check")]
    mode: CliMode,

    /// Authoritative API tree root
    #[arg(long, default_value = "./api")]
    api_root: PathBuf,

    /// Shadow (next major version) tree root
    #[arg(long, default_value = "./generated_api_shadow")]
    shadow_root: PathBuf,

    /// External import mapping table (TOML); compiled-in defaults when omitted
    #[arg(long)]
    import_map: Option<PathBuf>,

    /// Build labels whose artifacts should be reconciled
    labels: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let import_map = match &cli.import_map {
        Some(path) => ImportMap::load(path)?,
        None => ImportMap::default(),
    };

    let runner = SystemRunner;
    let tools = ProtoxformTools::new(&runner, ToolPaths::default());
    let store = BazelBinStore::default();
    let vcs = GitVcs::new(&runner);
    let prompt = TerminalPrompt;

    let reconciler = Reconciler {
        import_map: &import_map,
        tools: &tools,
        store: &store,
        vcs: &vcs,
        prompt: &prompt,
    };

    let mode = match cli.mode {
        CliMode::Check => Mode::Check,
        CliMode::Fix => Mode::Fix,
    };
    let force = std::env::var("FORCE_PROTO_FORMAT")
        .map(|v| v == "yes")
        .unwrap_or(false);

    let mut reported = false;
    for (root, shadow) in [(cli.api_root, false), (cli.shadow_root, true)] {
        let opts = SyncOptions {
            mode,
            root,
            labels: cli.labels.clone(),
            shadow,
            force,
        };
        match reconciler.run(&opts) {
            Ok(Outcome::DiffReported) => reported = true,
            Ok(_) => {}
            Err(ProtoSyncError::Aborted) => {
                eprintln!("aborted");
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        }
    }

    if reported {
        std::process::exit(1);
    }
    Ok(())
}
