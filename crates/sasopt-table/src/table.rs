//! Configuration tables
//!
//! Provides [`ConfigurationTable`], the ordered name → [`Setting`] mapping of
//! one instrument configuration, with its JSON record codec.

use crate::error::{TableError, TableResult};
use crate::setting::{Setting, TableDefaults};
use indexmap::IndexMap;
use serde_json::Value;

/// Ordered mapping from setting name to [`Setting`]
///
/// # Invariants
/// - Names are unique (enforced on every constructor)
/// - Iteration order is the persisted record order unless settings are
///   restored by [`restore_from`](Self::restore_from), which keeps the
///   default table's relative order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigurationTable {
    settings: IndexMap<String, Setting>,
}

impl ConfigurationTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from settings, rejecting duplicate names
    ///
    /// # Errors
    /// Returns [`TableError::DuplicateSetting`] on a repeated name
    pub fn from_settings(settings: impl IntoIterator<Item = Setting>) -> TableResult<Self> {
        let mut table = Self::new();
        for setting in settings {
            if table.settings.contains_key(&setting.name) {
                return Err(TableError::DuplicateSetting { name: setting.name });
            }
            table.settings.insert(setting.name.clone(), setting);
        }
        Ok(table)
    }

    /// Parse a persisted JSON record list
    ///
    /// Optimization fields missing from a record are filled from `defaults`.
    ///
    /// # Errors
    /// - [`TableError::InvalidJson`] if the source is not JSON
    /// - [`TableError::NotARecordList`] if the root is not an array of objects
    /// - [`TableError::MalformedTable`] if a record lacks `setting` or `value`
    /// - [`TableError::DuplicateSetting`] on a repeated name
    pub fn load(source: &[u8], defaults: &TableDefaults) -> TableResult<Self> {
        let root: Value = serde_json::from_slice(source)?;
        let records = match root {
            Value::Array(records) => records,
            other => {
                return Err(TableError::NotARecordList {
                    found: json_kind(&other),
                })
            }
        };

        let mut settings = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let fields = match record {
                Value::Object(fields) => fields,
                other => {
                    return Err(TableError::NotARecordList {
                        found: json_kind(&other),
                    })
                }
            };
            settings.push(Setting::from_record(index, fields, defaults)?);
        }

        Self::from_settings(settings)
    }

    /// Serialize to a pretty-printed JSON record list
    ///
    /// # Errors
    /// Returns [`TableError::InvalidJson`] if a value cannot be represented
    pub fn serialize(&self) -> TableResult<Vec<u8>> {
        let records: Vec<&Setting> = self.settings.values().collect();
        Ok(serde_json::to_vec_pretty(&records)?)
    }

    /// Get setting by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.settings.get(name)
    }

    /// Get mutable setting by name
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Setting> {
        self.settings.get_mut(name)
    }

    /// Check if setting exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.settings.contains_key(name)
    }

    /// Setting names in order
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone {
        self.settings.keys().map(String::as_str)
    }

    /// Settings in order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Setting> {
        self.settings.values()
    }

    /// Number of settings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Insert or replace a setting
    ///
    /// A replaced setting keeps its position; a new one is appended.
    #[inline]
    pub fn insert(&mut self, setting: Setting) -> Option<Setting> {
        self.settings.insert(setting.name.clone(), setting)
    }

    /// Remove a setting, keeping the order of the rest
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Setting> {
        self.settings.shift_remove(name)
    }

    /// Check if any setting carries the `shared` column
    #[inline]
    #[must_use]
    pub fn has_shared_column(&self) -> bool {
        self.settings.values().any(|s| s.shared.is_some())
    }

    /// Inject (`present = true`) or strip the `shared` column
    ///
    /// Injection sets `shared = false` only where the column is absent.
    #[must_use]
    pub fn with_shared_column(mut self, present: bool) -> Self {
        for setting in self.settings.values_mut() {
            if present {
                setting.shared.get_or_insert(false);
            } else {
                setting.shared = None;
            }
        }
        self
    }

    /// Clear every `shared` flag to `false`, keeping the column
    #[must_use]
    pub fn with_shared_cleared(mut self) -> Self {
        for setting in self.settings.values_mut() {
            if setting.shared.is_some() {
                setting.shared = Some(false);
            }
        }
        self
    }

    /// Names of settings with `shared = true`
    pub fn shared_names(&self) -> impl Iterator<Item = &str> {
        self.settings
            .values()
            .filter(|s| s.is_shared())
            .map(|s| s.name.as_str())
    }

    /// Check if both tables hold the same set of names
    #[must_use]
    pub fn same_names(&self, other: &Self) -> bool {
        self.len() == other.len() && self.names().all(|name| other.contains(name))
    }

    /// Restore `name` from `default`
    ///
    /// An existing entry is replaced in place. A missing entry is inserted
    /// right after the last setting that precedes it in `default`, so the
    /// relative order of `default` is kept.
    ///
    /// Returns `false` (and leaves the table untouched) when `default` has no
    /// such setting.
    pub fn restore_from(&mut self, default: &Self, name: &str) -> bool {
        let Some((target, _, setting)) = default.settings.get_full(name) else {
            return false;
        };

        if let Some(slot) = self.settings.get_mut(name) {
            *slot = setting.clone();
            return true;
        }

        let position = self
            .settings
            .keys()
            .rposition(|key| {
                default
                    .settings
                    .get_index_of(key.as_str())
                    .is_some_and(|index| index < target)
            })
            .map_or(0, |last| last + 1);
        self.settings
            .shift_insert(position, name.to_string(), setting.clone());
        true
    }

    /// Check optimization bounds of every setting
    ///
    /// # Errors
    /// Returns the first [`TableError::InvalidBounds`] found
    pub fn check_bounds(&self) -> TableResult<()> {
        self.settings.values().try_for_each(Setting::check_bounds)
    }
}

impl<'a> IntoIterator for &'a ConfigurationTable {
    type Item = &'a Setting;
    type IntoIter = indexmap::map::Values<'a, String, Setting>;

    fn into_iter(self) -> Self::IntoIter {
        self.settings.values()
    }
}

/// JSON kind name for diagnostics
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
