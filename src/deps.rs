//! Dependency extraction from definition files.
//!
//! Imports, previous-version message references, and service declarations
//! are matched with targeted line patterns. This is a deliberate scope
//! limit: the narrow fields needed here do not justify a proto grammar.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ImportMap;
use crate::error::{ProtoSyncError, ProtoSyncResult};
use crate::package::package_directory;

/// Import prefixes provided implicitly by the base packaging rule.
///
/// Imports under these prefixes never become explicit dependencies.
pub const BUILD_SYSTEM_IMPORT_PREFIXES: [&str; 4] = [
    "google/api/annotations.proto",
    "google/protobuf/",
    "google/rpc/status.proto",
    "validate/validate.proto",
];

const ANNOTATIONS_PREFIX: &str = "udpa/annotations/";
const ANNOTATIONS_TARGET: &str = "@com_github_cncf_udpa//udpa/annotations:pkg";
const CORE_PREFIX: &str = "udpa/core/v1/";
const CORE_TARGET: &str = "@com_github_cncf_udpa//udpa/core/v1:pkg";
const LOCAL_PREFIX: &str = "envoy/";

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^import "(.*)";"#).unwrap());
static SERVICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^service \w+ \{").unwrap());
static PREVIOUS_MESSAGE_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"previous_message_type\s+=\s+"([^"]*)";"#).unwrap());

/// Resolve the build-graph dependencies implied by the imports of the
/// definition file at `path`.
///
/// The returned list may contain duplicates; callers deduplicate.
pub fn import_deps(path: &Path, import_map: &ImportMap) -> ProtoSyncResult<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    let file_dir = path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .to_string_lossy()
        .into_owned();

    let mut deps = Vec::new();
    for line in contents.lines() {
        let Some(caps) = IMPORT_RE.captures(line) else {
            continue;
        };
        let import_path = &caps[1];
        if BUILD_SYSTEM_IMPORT_PREFIXES
            .iter()
            .any(|prefix| import_path.starts_with(prefix))
        {
            continue;
        }
        if import_path.starts_with(ANNOTATIONS_PREFIX) {
            deps.push(ANNOTATIONS_TARGET.to_string());
            continue;
        }
        if import_path.starts_with(CORE_PREFIX) {
            deps.push(CORE_TARGET.to_string());
            continue;
        }
        if let Some(target) = import_map.lookup(import_path) {
            deps.push(target.to_string());
            continue;
        }
        if import_path.starts_with(LOCAL_PREFIX) {
            let import_dir = import_path.rsplit_once('/').map_or("", |(dir, _)| dir);
            // Package-internal imports carry no dependency edge. The suffix
            // comparison is intentional; see DESIGN.md.
            if file_dir.ends_with(import_dir) {
                continue;
            }
            deps.push(format!("//{import_dir}:pkg"));
            continue;
        }
        return Err(ProtoSyncError::UnknownImport {
            import: import_path.to_string(),
            file: path.to_path_buf(),
        });
    }
    Ok(deps)
}

/// Dependencies on the compiled units of previous message versions.
///
/// Earlier descriptors stay linked so reflection-based upgrades can resolve
/// the old types.
pub fn previous_message_type_deps(path: &Path) -> ProtoSyncResult<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(PREVIOUS_MESSAGE_TYPE_RE
        .captures_iter(&contents)
        .map(|caps| format!("//{}:pkg", package_directory(&caps[1])))
        .collect())
}

/// Does the definition file declare any gRPC services?
pub fn has_services(path: &Path) -> ProtoSyncResult<bool> {
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().any(|line| SERVICE_RE.is_match(line)))
}
