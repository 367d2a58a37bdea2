//! Error types for configuration storage
//!
//! Provides error handling for:
//! - Repository access (read, write, list, file management)
//! - Table load failures attributed to a configuration
//! - Index lookups into the selected set

use sasopt_table::TableError;
use std::path::PathBuf;

/// Errors raised by repositories and the configuration set store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Persisted table could not be loaded
    #[error("configuration '{id}': {source}")]
    Table {
        /// Configuration identifier
        id: String,
        /// Underlying table error
        #[source]
        source: TableError,
    },

    /// No persisted configuration with that identifier
    #[error("configuration not found: '{0}'")]
    NotFound(String),

    /// Identifier is not a plain file name
    #[error("invalid configuration identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Variant modifier already part of the base name
    #[error("modifier '{modifier}' is already part of '{base}', choose a unique extension")]
    InvalidModifier {
        /// Base configuration
        base: String,
        /// Rejected modifier
        modifier: String,
    },

    /// IO error on a configuration file
    #[error("io error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Index outside the selected set
    #[error("configuration index {index} out of range ({len} selected)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Set length
        len: usize,
    },
}

impl StoreError {
    /// Attribute a table error to a configuration
    #[inline]
    pub fn table(id: impl Into<String>, source: TableError) -> Self {
        Self::Table {
            id: id.into(),
            source,
        }
    }

    /// Create IO error for path
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the persisted table is malformed
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Table { source, .. } if source.is_malformed())
    }

    /// Check if the persisted table repeats a setting name
    #[inline]
    #[must_use]
    pub fn is_duplicate_setting(&self) -> bool {
        matches!(
            self,
            Self::Table {
                source: TableError::DuplicateSetting { .. },
                ..
            }
        )
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
