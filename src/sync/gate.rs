//! Change-detection gate.
//!
//! Reconciliation does not run under the build system, so it cannot rely
//! on its change tracking. The gate skips reprocessing when nothing that
//! could affect a candidate has moved since the last merged upstream
//! revision. Skipping must never change the result; when in doubt the
//! gate says resync.

/// Should the candidate artifact at `path` be reprocessed?
///
/// Tool-source changes invalidate every output. Otherwise a candidate is
/// stale only when a modified definition file's basename occurs in its
/// path; the basename test stays conservative across package moves
/// between major versions.
pub fn should_sync(
    path: &str,
    api_modified: &[String],
    tools_modified: &[String],
    force: bool,
) -> bool {
    if force {
        return true;
    }
    if !tools_modified.is_empty() {
        return true;
    }
    api_modified.iter().any(|modified| {
        let basename = modified.rsplit('/').next().unwrap_or(modified);
        path.contains(basename)
    })
}
