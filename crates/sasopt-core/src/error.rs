//! Error types for SASOPT Core
//!
//! Provides error handling for:
//! - Edit validation (shape, shared flags, bounds)
//! - Model interaction and background mapping
//! - Session configuration and run settings

use sasopt_store::StoreError;
use sasopt_table::TableError;
use std::path::PathBuf;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Table is malformed, repeats a name or has invalid bounds
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Repository or store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Edit changed the set of setting names
    #[error("edit of '{table}' changes its settings (added {added:?}, removed {removed:?})")]
    ShapeMismatch {
        /// Edited table
        table: String,
        /// Names the edit introduced
        added: Vec<String>,
        /// Names the edit dropped
        removed: Vec<String>,
    },

    /// Edit added or dropped a `shared` flag
    #[error("'shared' of '{name}' cannot be added or removed in configuration {index}")]
    SharedColumn {
        /// Configuration index
        index: usize,
        /// Setting name
        name: String,
    },

    /// Edit toggled `shared` outside the reference configuration
    #[error("'shared' of '{name}' can only be changed on the first configuration, not on configuration {index}")]
    SharedOnDependent {
        /// Configuration index
        index: usize,
        /// Setting name
        name: String,
    },

    /// Edit of a dependent's copy of a setting the reference shares
    #[error("'{name}' of configuration {index} is shared from the first configuration and cannot be edited there")]
    GovernedSetting {
        /// Configuration index
        index: usize,
        /// Setting name
        name: String,
    },

    /// Index outside the selected set
    #[error("configuration index {index} out of range ({len} selected)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Set length
        len: usize,
    },

    /// Operation needs a selected model
    #[error("no model selected")]
    NoModelSelected,

    /// Model interaction failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Background mapping is invalid
    #[error("background mapping error: {0}")]
    Background(#[from] BackgroundError),

    /// Session configuration is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SessionError {
    /// Create shape mismatch from the two name lists
    pub fn shape_mismatch<'a>(
        table: impl Into<String>,
        before: impl Iterator<Item = &'a str> + Clone,
        after: impl Iterator<Item = &'a str> + Clone,
    ) -> Self {
        let added = after
            .clone()
            .filter(|n| !before.clone().any(|b| b == *n))
            .map(str::to_string)
            .collect();
        let removed = before
            .filter(|n| !after.clone().any(|a| a == *n))
            .map(str::to_string)
            .collect();
        Self::ShapeMismatch {
            table: table.into(),
            added,
            removed,
        }
    }

    /// Check if the error rejects an edit
    #[inline]
    #[must_use]
    pub fn is_edit_rejection(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. }
                | Self::SharedColumn { .. }
                | Self::SharedOnDependent { .. }
                | Self::GovernedSetting { .. }
                | Self::Table(TableError::InvalidBounds { .. })
        )
    }

    /// Check if the error is an invalid optimization range
    #[inline]
    #[must_use]
    pub fn is_invalid_bounds(&self) -> bool {
        matches!(self, Self::Table(TableError::InvalidBounds { .. }))
    }
}

/// Failure reported by the external fitting engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("model interaction failed: {0}")]
pub struct ModelError(pub String);

impl ModelError {
    /// Create model error
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Background mapping errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackgroundError {
    /// Source or sink names no model parameter
    #[error("dataset {dataset}: unknown model parameter '{name}'")]
    UnknownParameter {
        /// Dataset index
        dataset: usize,
        /// Parameter name
        name: String,
    },

    /// Dataset index outside the model's dataset list
    #[error("unknown dataset index {index} ({len} datasets expected)")]
    UnknownDataset {
        /// Requested index
        index: usize,
        /// Number of expected datasets
        len: usize,
    },
}

/// Session configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid TOML
    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    /// Invalid YAML
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Invalid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// File extension not recognized
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Configuration file unreadable
    #[error("io error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Run setting outside its allowed range
    #[error("{field} = {value} is out of range: {reason}")]
    OutOfRange {
        /// Setting name
        field: &'static str,
        /// Rejected value
        value: String,
        /// Allowed range
        reason: String,
    },
}

impl ConfigError {
    /// Create out-of-range error
    #[inline]
    pub fn out_of_range(field: &'static str, value: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_lists_differences() {
        let before = ["gap", "time"];
        let after = ["gap", "wavelength"];
        let err = SessionError::shape_mismatch("a.json", before.iter().copied(), after.iter().copied());

        match &err {
            SessionError::ShapeMismatch { added, removed, .. } => {
                assert_eq!(added, &vec!["wavelength".to_string()]);
                assert_eq!(removed, &vec!["time".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_edit_rejection());
    }

    #[test]
    fn bounds_classification() {
        let err = SessionError::from(TableError::InvalidBounds {
            name: "gap".to_string(),
            lower: 2.0,
            upper: 1.0,
            step: 0.0,
        });
        assert!(err.is_invalid_bounds());
        assert!(err.is_edit_rejection());
        assert!(!SessionError::NoModelSelected.is_edit_rejection());
    }

    #[test]
    fn out_of_range_display() {
        let err = ConfigError::out_of_range("q_min", 0.9, "must be below q_max");
        assert_eq!(err.to_string(), "q_min = 0.9 is out of range: must be below q_max");
    }
}
