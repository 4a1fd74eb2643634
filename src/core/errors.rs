//! SSW-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SswError>;

/// Top-level error type for sample_sweeper.
#[derive(Debug, Error)]
pub enum SswError {
    #[error("[SSW-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SSW-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SSW-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SSW-2001] path escapes download root {root}: {path}")]
    PathEscape { path: PathBuf, root: PathBuf },

    #[error("[SSW-2002] refusing to follow link at {path}")]
    UnsafeLink { path: PathBuf },

    #[error("[SSW-2003] download root is not a directory: {path}")]
    InvalidRoot { path: PathBuf },

    #[error("[SSW-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SSW-3001] permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("[SSW-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SSW-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SswError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SSW-1001",
            Self::MissingConfig { .. } => "SSW-1002",
            Self::ConfigParse { .. } => "SSW-1003",
            Self::PathEscape { .. } => "SSW-2001",
            Self::UnsafeLink { .. } => "SSW-2002",
            Self::InvalidRoot { .. } => "SSW-2003",
            Self::Serialization { .. } => "SSW-2101",
            Self::PermissionDenied { .. } => "SSW-3001",
            Self::Io { .. } => "SSW-3002",
            Self::Runtime { .. } => "SSW-3900",
        }
    }

    /// Whether this error is fatal to the whole run (as opposed to a
    /// per-item failure that the run isolates and continues past).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::InvalidRoot { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for SswError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SswError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_errors() -> Vec<SswError> {
        vec![
            SswError::InvalidConfig {
                details: String::new(),
            },
            SswError::MissingConfig {
                path: PathBuf::new(),
            },
            SswError::ConfigParse {
                context: "",
                details: String::new(),
            },
            SswError::PathEscape {
                path: PathBuf::new(),
                root: PathBuf::new(),
            },
            SswError::UnsafeLink {
                path: PathBuf::new(),
            },
            SswError::InvalidRoot {
                path: PathBuf::new(),
            },
            SswError::Serialization {
                context: "",
                details: String::new(),
            },
            SswError::PermissionDenied {
                path: PathBuf::new(),
            },
            SswError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            SswError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_errors();
        let codes: Vec<&str> = errors.iter().map(SswError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_ssw_prefix() {
        for err in &all_errors() {
            assert!(
                err.code().starts_with("SSW-"),
                "code {} must start with SSW-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = SswError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("SSW-1001"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("bad value"),
            "display should contain details: {msg}"
        );
    }

    #[test]
    fn fatal_classification() {
        assert!(
            SswError::InvalidConfig {
                details: String::new()
            }
            .is_fatal()
        );
        assert!(
            SswError::InvalidRoot {
                path: PathBuf::new()
            }
            .is_fatal()
        );
        assert!(
            !SswError::UnsafeLink {
                path: PathBuf::new()
            }
            .is_fatal()
        );
        assert!(!SswError::io("/tmp/x", std::io::Error::other("boom")).is_fatal());
    }

    #[test]
    fn io_convenience_constructor() {
        let err = SswError::io(
            "/tmp/test.mkv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "SSW-3002");
        assert!(err.to_string().contains("/tmp/test.mkv"));
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: SswError = toml_err.into();
        assert_eq!(err.code(), "SSW-1003");
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: SswError = json_err.into();
        assert_eq!(err.code(), "SSW-2101");
    }
}
