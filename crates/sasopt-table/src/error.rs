//! Error types for parameter tables
//!
//! Covers load-time failures (malformed records, duplicate names) and
//! value validation of optimization bounds.

/// Errors raised while loading, serializing or validating a table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A record lacks a required field or carries it with the wrong type
    #[error("malformed table: record {record}: field '{field}' {problem}")]
    MalformedTable {
        /// Zero-based record position in the source
        record: usize,
        /// Offending field name
        field: String,
        /// What is wrong with the field
        problem: String,
    },

    /// The source is valid JSON but not a list of records
    #[error("malformed table: expected a list of setting records, found {found}")]
    NotARecordList {
        /// JSON kind found at the root
        found: &'static str,
    },

    /// Two settings share a name within one table
    #[error("duplicate setting: '{name}'")]
    DuplicateSetting {
        /// The repeated name
        name: String,
    },

    /// Optimization bounds are inconsistent on an optimized setting
    #[error("invalid optimization bounds for '{name}': lower {lower}, upper {upper}, step {step}")]
    InvalidBounds {
        /// Setting name
        name: String,
        /// `lower_opt`
        lower: f64,
        /// `upper_opt`
        upper: f64,
        /// `step_opt`
        step: f64,
    },

    /// Source is not valid JSON, or serialization failed
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl TableError {
    /// Create error for a required field that is absent
    #[inline]
    pub fn missing(record: usize, field: impl Into<String>) -> Self {
        Self::MalformedTable {
            record,
            field: field.into(),
            problem: "is missing".to_string(),
        }
    }

    /// Create error for a field carrying the wrong JSON type
    #[inline]
    pub fn wrong_type(record: usize, field: impl Into<String>, expected: &str) -> Self {
        Self::MalformedTable {
            record,
            field: field.into(),
            problem: format!("must be {expected}"),
        }
    }

    /// Check if this error stems from a malformed source
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedTable { .. } | Self::NotARecordList { .. } | Self::InvalidJson(_)
        )
    }
}

/// Result type alias for table operations
pub type TableResult<T> = Result<T, TableError>;
