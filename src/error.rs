//! Error taxonomy and process exit-code mapping.
//!
//! Every failure that can end a `check`, `update` or `purge` run is an
//! [`NvdError`]. Failures raised by an [`Engine`](crate::engine::Engine)
//! implementation are [`EngineError`]s and get wrapped into the variant that
//! names the lifecycle phase they happened in.

use std::path::PathBuf;

/// Exit code for a clean run.
pub const EXIT_OK: i32 = 0;

/// Exit code when at least one vulnerability was found.
///
/// Kept apart from every error code so callers can tell "the scan worked and
/// found problems" from "the scan did not work".
pub const EXIT_VULNERABLE: i32 = 4;

/// Failure raised by an engine implementation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Generic engine failure with a human readable reason.
    #[error("{0}")]
    Message(String),

    /// Filesystem failure while touching engine-owned files.
    #[error("io error: {path}: {source}")]
    Io {
        /// Path involved in the failing operation.
        path: String,
        /// Original I/O error.
        source: std::io::Error,
    },

    /// A remote feed could not be fetched.
    #[error("http error: {url}: {source}")]
    Http {
        /// Feed location.
        url: String,
        /// Original transport error.
        source: reqwest::Error,
    },

    /// A feed, store or report payload could not be (de)serialised.
    #[error("json error: {context}: {source}")]
    Json {
        /// What was being read or written.
        context: String,
        /// Original serde error.
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Build an [`EngineError::Io`] from a path and an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into().display().to_string(),
            source,
        }
    }
}

/// Top level error type for every operation of this crate.
#[derive(Debug, thiserror::Error)]
pub enum NvdError {
    /// The configuration document is unreadable or malformed.
    #[error("configuration error: {path}: {reason}")]
    Config {
        /// Document location (or `<inline>` for in-memory documents).
        path: String,
        /// Why loading failed.
        reason: String,
    },

    /// A single configuration value could not be coerced to its setting type.
    #[error("configuration error: {field}: {reason}")]
    ConfigField {
        /// Dotted document path of the offending value.
        field: String,
        /// Why coercion failed.
        reason: String,
    },

    /// The engine could not be instantiated.
    #[error("engine creation failed: {0}")]
    EngineCreation(String),

    /// A delegated analyzer failed during scan or analysis.
    #[error("analysis failed: {0}")]
    Analysis(#[source] EngineError),

    /// The remote feed was unreachable or corrupt.
    #[error("database update failed: {0}")]
    Update(#[source] EngineError),

    /// Report rendering failed (unwritable output, unsupported format).
    #[error("report generation failed: {0}")]
    Report(#[source] EngineError),

    /// The local store could not be removed or read.
    #[error("store access error: {path}: {source}")]
    StoreAccess {
        /// Store file path.
        path: String,
        /// Original I/O error.
        source: std::io::Error,
    },
}

impl NvdError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 1    | Engine failure (create/analyze/update/report) |
    /// | 2    | Configuration error                       |
    /// | 4    | Vulnerabilities found (not an error, see [`EXIT_VULNERABLE`]) |
    /// | 10   | Store access error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::ConfigField { .. } => 2,
            Self::EngineCreation(_) | Self::Analysis(_) | Self::Update(_) | Self::Report(_) => 1,
            Self::StoreAccess { .. } => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = NvdError::Config {
            path: "nvd.json".to_owned(),
            reason: "expected value at line 1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nvd.json"));
        assert!(msg.contains("line 1"));
    }

    #[test]
    fn test_analysis_error_wraps_engine_message() {
        let err = NvdError::Analysis(EngineError::Message("jar analyzer crashed".to_owned()));
        assert!(err.to_string().contains("jar analyzer crashed"));
    }

    #[test]
    fn test_exit_codes_are_distinct_from_vulnerable() {
        let errors = [
            NvdError::Config {
                path: "x".to_owned(),
                reason: "y".to_owned(),
            },
            NvdError::ConfigField {
                field: "nvd.auto-update".to_owned(),
                reason: "not a boolean".to_owned(),
            },
            NvdError::EngineCreation("boom".to_owned()),
            NvdError::Update(EngineError::Message("offline".to_owned())),
            NvdError::Report(EngineError::Message("bad format".to_owned())),
            NvdError::StoreAccess {
                path: "/tmp/store".to_owned(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            },
        ];
        for err in &errors {
            assert_ne!(err.exit_code(), EXIT_OK);
            assert_ne!(err.exit_code(), EXIT_VULNERABLE);
        }
        assert_eq!(errors[0].exit_code(), 2);
        assert_eq!(errors[5].exit_code(), 10);
    }

    #[test]
    fn test_engine_io_helper_keeps_path() {
        let err = EngineError::io(
            "/data/nvd-store.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("nvd-store.json"));
    }
}
