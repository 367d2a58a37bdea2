//! Configuration sets and their table generations
//!
//! Every selected configuration carries three snapshots of its table:
//!
//! ```text
//! default ──(materialize)──> associated ──(user edit)──> updated
//!                                 ^                          │
//!                                 └──────(reconcile)─────────┘
//! ```

use sasopt_table::ConfigurationTable;
use serde::{Deserialize, Serialize};

/// Identifier of a persisted instrument configuration (its file name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationId(String);

impl ConfigurationId {
    /// Create identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigurationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConfigurationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ConfigurationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The three table generations of one selected configuration
///
/// # Invariants
/// - `default` is never mutated while the selection lasts
/// - `updated` equals `associated` (or `default` before the first
///   materialization) plus at most one user edit plus reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationGenerations {
    id: ConfigurationId,
    default: ConfigurationTable,
    associated: Option<ConfigurationTable>,
    updated: ConfigurationTable,
}

impl ConfigurationGenerations {
    /// Freshly loaded configuration: nothing materialized yet
    #[must_use]
    pub fn fresh(id: ConfigurationId, default: ConfigurationTable) -> Self {
        let updated = default.clone();
        Self {
            id,
            default,
            associated: None,
            updated,
        }
    }

    /// Configuration carried into a new selection
    ///
    /// `carried` becomes both the associated and the updated generation.
    #[must_use]
    pub fn carried(id: ConfigurationId, default: ConfigurationTable, carried: ConfigurationTable) -> Self {
        Self {
            id,
            default,
            associated: Some(carried.clone()),
            updated: carried,
        }
    }

    /// Configuration identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ConfigurationId {
        &self.id
    }

    /// Table as loaded
    #[inline]
    #[must_use]
    pub fn default_table(&self) -> &ConfigurationTable {
        &self.default
    }

    /// Table last materialized into an editor, if any
    #[inline]
    #[must_use]
    pub fn associated(&self) -> Option<&ConfigurationTable> {
        self.associated.as_ref()
    }

    /// Table after the latest edit or reconciliation
    #[inline]
    #[must_use]
    pub fn updated(&self) -> &ConfigurationTable {
        &self.updated
    }

    /// Table an editor starts from
    ///
    /// The associated generation once materialized, otherwise the default.
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> &ConfigurationTable {
        self.associated.as_ref().unwrap_or(&self.default)
    }

    /// Materialize the baseline into the associated generation
    ///
    /// Idempotent; returns the associated table.
    pub fn materialize(&mut self) -> &ConfigurationTable {
        self.associated.get_or_insert_with(|| self.default.clone())
    }

    /// Record the table an editor returned
    ///
    /// Returns `true` if `updated` changed.
    pub fn record_edit(&mut self, edited: ConfigurationTable) -> bool {
        if edited == self.updated {
            return false;
        }
        self.updated = edited;
        true
    }

    /// Commit a reconciled table as both associated and updated
    ///
    /// Returns `true` if `updated` changed.
    pub fn commit(&mut self, table: ConfigurationTable) -> bool {
        let changed = table != self.updated;
        self.associated = Some(table.clone());
        self.updated = table;
        changed
    }
}

/// Ordered set of selected configurations; index 0 is the reference
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigurationSet {
    entries: Vec<ConfigurationGenerations>,
}

impl ConfigurationSet {
    /// Create set from generations
    #[inline]
    #[must_use]
    pub fn new(entries: Vec<ConfigurationGenerations>) -> Self {
        Self { entries }
    }

    /// Number of configurations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// More than one configuration selected
    #[inline]
    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.entries.len() > 1
    }

    /// Generations at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ConfigurationGenerations> {
        self.entries.get(index)
    }

    /// Mutable generations at `index`
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut ConfigurationGenerations> {
        self.entries.get_mut(index)
    }

    /// Reference configuration
    #[inline]
    #[must_use]
    pub fn reference(&self) -> Option<&ConfigurationGenerations> {
        self.entries.first()
    }

    /// Position of a configuration
    #[must_use]
    pub fn index_of(&self, id: &ConfigurationId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Identifiers in order
    pub fn ids(&self) -> impl Iterator<Item = &ConfigurationId> {
        self.entries.iter().map(ConfigurationGenerations::id)
    }

    /// Generations in order
    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationGenerations> {
        self.entries.iter()
    }

    /// Updated tables in order
    pub fn updated_tables(&self) -> impl Iterator<Item = &ConfigurationTable> {
        self.entries.iter().map(ConfigurationGenerations::updated)
    }
}
