//! Artifact pipeline: produce one destination file from its candidate
//! sources.
//!
//! A destination normally has a single source and is pretty-printed
//! directly. On the shadow generation track a destination can have an
//! active descriptor plus a next-major-version candidate; the pair is
//! merged before printing.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ProtoSyncResult;
use crate::package::destination_path;
use crate::tools::ProtoTools;

/// Suffix of the descriptor for the current (possibly hand-frozen) version.
pub const ACTIVE_SUFFIX: &str = ".active_or_frozen.proto";

/// Suffix of the internal shadow candidate for the next major version.
pub const SHADOW_INTERNAL_SUFFIX: &str = ".next_major_version_candidate.envoy_internal.proto";

/// Suffix of the public candidate for the next major version.
pub const SHADOW_SUFFIX: &str = ".next_major_version_candidate.proto";

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.to_string_lossy().ends_with(suffix)
}

fn package_target(rel_dst: &Path) -> String {
    let dir = rel_dst.parent().unwrap_or_else(|| Path::new(""));
    format!("//{}:pkg", dir.display())
}

/// Produce `dst` from its candidate sources and return the owning package
/// target for dependency bookkeeping.
pub fn sync_proto_file(
    dst: &Path,
    srcs: &[PathBuf],
    tools: &dyn ProtoTools,
) -> ProtoSyncResult<String> {
    assert!(
        !srcs.is_empty(),
        "destination {} has no candidate sources",
        dst.display()
    );

    let src = if let [only] = srcs {
        tools.pretty_print(only, dst)?;
        only
    } else {
        // Only an active descriptor plus a next-major-version candidate is
        // expected here.
        let active = srcs
            .iter()
            .find(|s| has_suffix(s, ACTIVE_SUFFIX))
            .unwrap_or(&srcs[0]);
        let shadow = srcs.iter().find(|s| has_suffix(s, SHADOW_INTERNAL_SUFFIX));
        if let Some(shadow) = shadow {
            let merged = NamedTempFile::new()?;
            tools.merge(active, shadow, merged.path())?;
            tools.pretty_print(merged.path(), dst)?;
        } else {
            tools.pretty_print(active, dst)?;
        }
        active
    };

    let rel_dst = destination_path(src)?;
    Ok(package_target(&rel_dst))
}
