//! External import mapping table
//!
//! Imports of definition files vendored from other repositories cannot be
//! derived from the import path alone, so they are kept in an explicit
//! path-to-target table. The table is loaded once at startup and passed
//! into the import resolver; nothing reads it as ambient state.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ProtoSyncError, ProtoSyncResult};

/// Maps external import paths to their build-graph targets.
///
/// Loaded from a TOML side file with an `[imports]` table, or built from
/// the compiled-in defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportMap {
    #[serde(default)]
    imports: BTreeMap<String, String>,
}

impl Default for ImportMap {
    fn default() -> Self {
        Self {
            imports: builtin_imports(),
        }
    }
}

impl ImportMap {
    /// Load the mapping table from a TOML side file, replacing the defaults.
    pub fn load(path: &Path) -> ProtoSyncResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| ProtoSyncError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ProtoSyncError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Target mapped to `import_path`, if any.
    pub fn lookup(&self, import_path: &str) -> Option<&str> {
        self.imports.get(import_path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }
}

impl FromIterator<(String, String)> for ImportMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            imports: iter.into_iter().collect(),
        }
    }
}

fn builtin_imports() -> BTreeMap<String, String> {
    [
        (
            "google/api/expr/v1alpha1/checked.proto",
            "@com_google_googleapis//google/api/expr/v1alpha1:checked_proto",
        ),
        (
            "google/api/expr/v1alpha1/syntax.proto",
            "@com_google_googleapis//google/api/expr/v1alpha1:syntax_proto",
        ),
        ("metrics.proto", "@prometheus_metrics_model//:client_model"),
        (
            "opencensus/proto/trace/v1/trace.proto",
            "@opencensus_proto//opencensus/proto/trace/v1:trace_proto",
        ),
        (
            "opencensus/proto/trace/v1/trace_config.proto",
            "@opencensus_proto//opencensus/proto/trace/v1:trace_config_proto",
        ),
    ]
    .into_iter()
    .map(|(path, target)| (path.to_string(), target.to_string()))
    .collect()
}
