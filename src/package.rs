//! Package declaration handling and destination path mapping.
//!
//! Every generated descriptor declares exactly one package; the package
//! name decides where the formatted definition file lives in the tree.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ProtoSyncError, ProtoSyncResult};

static PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^package: "([^"]*)""#).unwrap());

/// Map a package name (or fully qualified message name) to a directory path.
///
/// Only dot-separated segments beginning with a lowercase letter correspond
/// to directories; capitalized message-name segments are dropped.
pub fn package_directory(package: &str) -> String {
    package
        .split('.')
        .filter(|s| s.chars().next().map(char::is_lowercase).unwrap_or(false))
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive the tree-relative destination path of `src` from its package
/// declaration.
///
/// Exactly one declaration is required; zero or more is malformed input.
pub fn destination_path(src: &Path) -> ProtoSyncResult<PathBuf> {
    let contents = fs::read_to_string(src)?;
    let packages: Vec<&str> = PACKAGE_RE
        .captures_iter(&contents)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if packages.len() != 1 {
        return Err(ProtoSyncError::MalformedInput {
            file: src.to_path_buf(),
            found: packages.len(),
        });
    }
    let stem = src
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or("unknown");
    Ok(PathBuf::from(package_directory(packages[0])).join(format!("{stem}.proto")))
}

/// Absolute and tree-relative destination for `src` under `dst_root`.
///
/// Missing parent directories are created idempotently.
pub fn abs_destination_path(
    dst_root: &Path,
    src: &Path,
) -> ProtoSyncResult<(PathBuf, PathBuf)> {
    let rel = destination_path(src)?;
    let dst = dst_root.join(&rel);
    if let Some(parent) = dst.parent() {
        crate::fs::create_dir_all(parent)?;
    }
    Ok((dst, rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn package_directory_keeps_lowercase_segments() {
        assert_eq!(package_directory("envoy.admin.v3"), "envoy/admin/v3");
        assert_eq!(
            package_directory("envoy.admin.v2alpha.CertificateDetails"),
            "envoy/admin/v2alpha"
        );
        assert_eq!(package_directory(""), "");
    }

    #[test]
    fn package_directory_drops_digit_segments() {
        // A segment must begin with a lowercase letter, not merely be
        // non-capitalized.
        assert_eq!(package_directory("envoy.3types.v3"), "envoy/v3");
    }

    #[test]
    fn destination_path_uses_package_and_stem() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("certs.active_or_frozen.proto");
        fs::write(&src, "name: \"x\"\npackage: \"envoy.admin.v3\"\n").unwrap();

        let dst = destination_path(&src).unwrap();
        assert_eq!(dst, PathBuf::from("envoy/admin/v3/certs.proto"));
    }

    #[test]
    fn destination_path_rejects_missing_package() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("certs.proto");
        fs::write(&src, "syntax: \"proto3\"\n").unwrap();

        let err = destination_path(&src).unwrap_err();
        assert!(matches!(
            err,
            ProtoSyncError::MalformedInput { found: 0, .. }
        ));
    }

    #[test]
    fn destination_path_rejects_duplicate_packages() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("certs.proto");
        fs::write(
            &src,
            "package: \"envoy.admin.v3\"\npackage: \"envoy.admin.v4\"\n",
        )
        .unwrap();

        let err = destination_path(&src).unwrap_err();
        assert!(matches!(
            err,
            ProtoSyncError::MalformedInput { found: 2, .. }
        ));
    }

    #[test]
    fn abs_destination_path_creates_parents() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("certs.active_or_frozen.proto");
        fs::write(&src, "package: \"envoy.admin.v3\"\n").unwrap();

        let dst_root = dir.path().join("out");
        let (abs, rel) = abs_destination_path(&dst_root, &src).unwrap();
        assert_eq!(rel, PathBuf::from("envoy/admin/v3/certs.proto"));
        assert_eq!(abs, dst_root.join("envoy/admin/v3/certs.proto"));
        assert!(abs.parent().unwrap().is_dir());
    }
}
