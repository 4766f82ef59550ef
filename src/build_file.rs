//! Canonical BUILD descriptor synthesis.
//!
//! Every directory of definition files carries one generated descriptor
//! listing the union of its dependency targets and whether any file
//! declares services. Descriptors are regenerated wholesale; the output is
//! byte-deterministic so the downstream diff stays meaningful.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::config::ImportMap;
use crate::deps::{has_services, import_deps, previous_message_type_deps};
use crate::error::ProtoSyncResult;

const BUILD_HEADER: &str = r#"# DO NOT EDIT. This file is generated by protosync.

load("@envoy_api//bazel:api_build_system.bzl", "api_proto_package")

licenses(["notice"])  # Apache 2

"#;

/// Sort key reproducing buildifier's target ordering: `:` sorts ahead of
/// every path character.
pub fn build_order_key(target: &str) -> String {
    target.replace(':', "!")
}

/// Compute the canonical BUILD contents for a directory of definition files.
pub fn build_file_contents(
    dir: &Path,
    files: &[String],
    import_map: &ImportMap,
) -> ProtoSyncResult<String> {
    let mut deps: BTreeSet<String> = BTreeSet::new();
    let mut services = false;
    for name in files {
        let path = dir.join(name);
        deps.extend(import_deps(&path, import_map)?);
        deps.extend(previous_message_type_deps(&path)?);
        services = services || has_services(&path)?;
    }

    let mut fields = Vec::new();
    if services {
        fields.push("    has_services = True,".to_string());
    }
    if !deps.is_empty() {
        let mut sorted: Vec<&str> = deps.iter().map(String::as_str).collect();
        sorted.sort_by_key(|target| build_order_key(target));
        let formatted = if sorted.len() == 1 {
            format!("\"{}\"", sorted[0])
        } else {
            let lines: Vec<String> = sorted
                .iter()
                .map(|target| format!("        \"{target}\","))
                .collect();
            format!("\n{}\n    ", lines.join("\n"))
        };
        fields.push(format!("    deps = [{formatted}],"));
    }

    let formatted_fields = if fields.is_empty() {
        String::new()
    } else {
        format!("\n{}\n", fields.join("\n"))
    };
    Ok(format!("{BUILD_HEADER}api_proto_package({formatted_fields})\n"))
}

/// Regenerate the BUILD descriptor of every directory under `root` that
/// directly contains definition files.
pub fn regenerate_build_files(root: &Path, import_map: &ImportMap) -> ProtoSyncResult<()> {
    if !root.is_dir() {
        return Ok(());
    }
    regenerate_recursive(root, import_map)
}

fn regenerate_recursive(dir: &Path, import_map: &ImportMap) -> ProtoSyncResult<()> {
    let mut protos = Vec::new();
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".proto") {
                protos.push(name.to_string());
            }
        }
    }
    protos.sort();
    subdirs.sort();

    if !protos.is_empty() {
        let contents = build_file_contents(dir, &protos, import_map)?;
        fs::write(dir.join("BUILD"), contents)?;
    }
    for sub in subdirs {
        regenerate_recursive(&sub, import_map)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_proto(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn empty_field_set_collapses_the_call() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("envoy/admin/v3");
        write_proto(&pkg, "certs.proto", "import \"google/protobuf/any.proto\";\n");

        let contents =
            build_file_contents(&pkg, &["certs.proto".to_string()], &ImportMap::default())
                .unwrap();
        assert!(contents.ends_with("api_proto_package()\n"));
        assert!(contents.starts_with("# DO NOT EDIT."));
    }

    #[test]
    fn single_dependency_is_inlined() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("envoy/admin/v3");
        write_proto(
            &pkg,
            "certs.proto",
            "import \"envoy/type/v3/percent.proto\";\n",
        );

        let contents =
            build_file_contents(&pkg, &["certs.proto".to_string()], &ImportMap::default())
                .unwrap();
        assert!(contents.contains("    deps = [\"//envoy/type/v3:pkg\"],\n"));
    }

    #[test]
    fn colon_sorts_ahead_of_path_separators() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("envoy/admin/v3");
        write_proto(
            &pkg,
            "certs.proto",
            "import \"envoy/type/matcher/string.proto\";\n\
             import \"envoy/type/percent.proto\";\n",
        );
        write_proto(
            &pkg,
            "clusters.proto",
            "import \"envoy/type/percent.proto\";\n",
        );

        let contents = build_file_contents(
            &pkg,
            &["certs.proto".to_string(), "clusters.proto".to_string()],
            &ImportMap::default(),
        )
        .unwrap();

        // Duplicate target collapsed; plain byte order would put
        // `//envoy/type/matcher:pkg` first because `:` > `/`.
        let matcher = contents.find("//envoy/type/matcher:pkg").unwrap();
        let parent = contents.find("//envoy/type:pkg").unwrap();
        assert!(parent < matcher);
        assert_eq!(contents.matches("//envoy/type:pkg").count(), 1);
    }

    #[test]
    fn service_flag_is_a_disjunction_across_files() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("envoy/service/auth/v3");
        write_proto(&pkg, "attrs.proto", "message Attrs {\n}\n");
        write_proto(&pkg, "auth.proto", "service Authorization {\n}\n");

        let contents = build_file_contents(
            &pkg,
            &["attrs.proto".to_string(), "auth.proto".to_string()],
            &ImportMap::default(),
        )
        .unwrap();
        assert!(contents.contains("    has_services = True,\n"));
    }

    #[test]
    fn regeneration_is_idempotent() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("envoy/admin/v3");
        write_proto(
            &pkg,
            "certs.proto",
            "import \"envoy/type/v3/percent.proto\";\nservice CertService {\n}\n",
        );

        let map = ImportMap::default();
        regenerate_build_files(dir.path(), &map).unwrap();
        let first = fs::read_to_string(pkg.join("BUILD")).unwrap();
        regenerate_build_files(dir.path(), &map).unwrap();
        let second = fs::read_to_string(pkg.join("BUILD")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn directories_without_protos_get_no_descriptor() {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("notes.txt"), "hi").unwrap();

        regenerate_build_files(dir.path(), &ImportMap::default()).unwrap();
        assert!(!docs.join("BUILD").exists());
        assert!(!dir.path().join("BUILD").exists());
    }
}
