//! Error types for protosync
//!
//! Uses `thiserror` for library errors; the binary surface wraps these
//! in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for protosync operations
pub type ProtoSyncResult<T> = Result<T, ProtoSyncError>;

/// Main error type for protosync operations
#[derive(Error, Debug)]
pub enum ProtoSyncError {
    /// A definition file must declare exactly one package
    #[error(
        "expected {file} to have exactly one package declaration but found {found}; \
         run `protosync --mode fix` to regenerate the tree"
    )]
    MalformedInput { file: PathBuf, found: usize },

    /// An import path with no mapping rule
    #[error("unknown import path mapping for {import} in {file}; update the external import map")]
    UnknownImport { import: String, file: PathBuf },

    /// Non-zero exit from the pretty-printer or merge tool
    #[error("{tool} exited with status {status}: {stderr}")]
    ExternalTool {
        tool: String,
        status: i32,
        stderr: String,
    },

    /// Non-zero exit from a version-control command
    #[error("{context} failed with status {status}: {stderr}")]
    Git {
        context: String,
        status: i32,
        stderr: String,
    },

    /// Unreadable or invalid external import map
    #[error("invalid import map {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reconciliation was aborted at a confirmation prompt
    #[error("reconciliation aborted by user")]
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_display_malformed_input() {
        let err = ProtoSyncError::MalformedInput {
            file: PathBuf::from("envoy/admin/v3/certs.proto"),
            found: 2,
        };
        let message = err.to_string();
        assert!(message.contains("envoy/admin/v3/certs.proto"));
        assert!(message.contains("found 2"));
        assert!(message.contains("--mode fix"));
    }

    #[test]
    fn test_error_display_unknown_import() {
        let err = ProtoSyncError::UnknownImport {
            import: "mystery/types.proto".to_string(),
            file: PathBuf::from("envoy/admin/v3/certs.proto"),
        };
        assert!(err.to_string().contains("mystery/types.proto"));
    }

    #[test]
    fn test_error_display_external_tool() {
        let err = ProtoSyncError::ExternalTool {
            tool: "protoprint".to_string(),
            status: 3,
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "protoprint exited with status 3: boom");
    }
}
