//! Module host error types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors from scanning, registry, resolution and invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    /// A file under the module root could not be introspected.
    #[error("scan failed for {path}: {message}")]
    Scan {
        /// File or directory that failed.
        path: PathBuf,
        /// Failure reason.
        message: String,
    },

    /// The registry document could not be written.
    #[error("registry unavailable at {path}: {message}")]
    RegistryUnavailable {
        /// Registry document path.
        path: PathBuf,
        /// Failure reason.
        message: String,
    },

    /// No registry entry, or no file in any search root.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// The module file exists but failed to parse or initialize.
    #[error("failed to load module {module}: {message}")]
    ModuleLoad {
        /// Module name.
        module: String,
        /// Failure reason.
        message: String,
    },

    /// The module has no public callable with this name.
    #[error("function '{function}' not found in module {module}")]
    FunctionNotFound {
        /// Module name.
        module: String,
        /// Requested function.
        function: String,
    },

    /// The callee raised an error or panicked.
    #[error("{module}.{function} failed: {message}")]
    Execution {
        /// Module name.
        module: String,
        /// Function name.
        function: String,
        /// The callee's error message.
        message: String,
        /// Output captured before the failure.
        output: String,
    },

    /// Two files under the module root share a base name.
    #[error("duplicate module name '{name}': {path} ignored, already defined by {first}")]
    DuplicateModuleName {
        /// The shared name.
        name: String,
        /// The ignored file.
        path: PathBuf,
        /// The file that was kept.
        first: PathBuf,
    },
}

impl ModuleError {
    /// Taxonomy entry for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Scan { .. } => ErrorKind::ScanError,
            Self::RegistryUnavailable { .. } => ErrorKind::RegistryUnavailable,
            Self::ModuleNotFound(_) => ErrorKind::ModuleNotFound,
            Self::ModuleLoad { .. } => ErrorKind::ModuleLoadError,
            Self::FunctionNotFound { .. } => ErrorKind::FunctionNotFound,
            Self::Execution { .. } => ErrorKind::ExecutionError,
            Self::DuplicateModuleName { .. } => ErrorKind::DuplicateModuleName,
        }
    }

    /// The error as a `{kind, message}` record for callers that report
    /// failures as data.
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    /// Output the callee wrote before failing, if any.
    #[must_use]
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::Execution { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

/// Error taxonomy, serialized in `PascalCase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Per-file scan failure.
    ScanError,
    /// Registry document missing, corrupt or unwritable.
    RegistryUnavailable,
    /// Unknown module name or file.
    ModuleNotFound,
    /// Module file failed to parse or initialize.
    ModuleLoadError,
    /// Unknown function on a resolved module.
    FunctionNotFound,
    /// Function raised during execution.
    ExecutionError,
    /// Name collision found while scanning.
    DuplicateModuleName,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ScanError => "ScanError",
            Self::RegistryUnavailable => "RegistryUnavailable",
            Self::ModuleNotFound => "ModuleNotFound",
            Self::ModuleLoadError => "ModuleLoadError",
            Self::FunctionNotFound => "FunctionNotFound",
            Self::ExecutionError => "ExecutionError",
            Self::DuplicateModuleName => "DuplicateModuleName",
        };
        f.write_str(s)
    }
}

/// A failure reported as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Taxonomy entry.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

/// Result type for module host operations.
pub type ModuleResult<T> = Result<T, ModuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_kind_in_pascal_case() {
        let report = ModuleError::ModuleNotFound("missing_module".into()).report();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["kind"], "ModuleNotFound");
        assert_eq!(json["message"], "module not found: missing_module");
    }

    #[test]
    fn kinds_match_variants() {
        let err = ModuleError::FunctionNotFound {
            module: "m".into(),
            function: "bar".into(),
        };
        assert_eq!(err.kind(), ErrorKind::FunctionNotFound);
        assert_eq!(err.kind().to_string(), "FunctionNotFound");

        let err = ModuleError::ModuleLoad {
            module: "m".into(),
            message: "syntax".into(),
        };
        assert_eq!(err.kind(), ErrorKind::ModuleLoadError);
    }

    #[test]
    fn execution_error_keeps_partial_output() {
        let err = ModuleError::Execution {
            module: "m".into(),
            function: "boom".into(),
            message: "Runtime error: nope".into(),
            output: "before\n".into(),
        };
        assert_eq!(err.captured_output(), Some("before\n"));
        assert_eq!(err.report().kind, ErrorKind::ExecutionError);
        assert!(err.to_string().contains("m.boom failed"));

        assert!(ModuleError::ModuleNotFound("x".into()).captured_output().is_none());
    }
}
