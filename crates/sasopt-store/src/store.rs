//! Configuration set store
//!
//! [`ConfigurationSetStore`] owns the selected [`ConfigurationSet`] across
//! interaction passes. Selection changes go through [`select`]; everything
//! else mutates the set in place through [`set_mut`] or swaps it wholesale
//! through [`replace_set`].
//!
//! # Retention
//!
//! When a selection changes, configurations present before and after keep
//! their `updated` generation (as the new `associated` one) if
//! [`SelectionPolicy::retain_edits_on_reselect`] is set. Carried tables are
//! normalised to their new position:
//!
//! 1. Governed copies (entries a dependent held because the old reference
//!    shared them) are released back to the default entry
//! 2. The `shared` column is injected or stripped by set size
//! 3. Dependents have their `shared` flags cleared
//!
//! [`select`]: ConfigurationSetStore::select
//! [`set_mut`]: ConfigurationSetStore::set_mut
//! [`replace_set`]: ConfigurationSetStore::replace_set

use crate::error::StoreError;
use crate::repository::ConfigurationRepository;
use crate::set::{ConfigurationGenerations, ConfigurationId, ConfigurationSet};
use sasopt_table::ConfigurationTable;
use serde::{Deserialize, Serialize};

/// How a changed selection treats configurations that stay selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Carry edits of configurations present in both selections
    pub retain_edits_on_reselect: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            retain_edits_on_reselect: true,
        }
    }
}

impl SelectionPolicy {
    /// Discard every generation on a changed selection
    #[inline]
    #[must_use]
    pub const fn reload_all() -> Self {
        Self {
            retain_edits_on_reselect: false,
        }
    }
}

/// Result of [`ConfigurationSetStore::select`]
#[derive(Debug, Default)]
pub struct SelectionOutcome {
    /// Selection differed from the previous one and the set was replaced
    pub changed: bool,
    /// Configurations loaded fresh from the repository
    pub loaded: Vec<ConfigurationId>,
    /// Configurations whose edits were carried forward
    pub retained: Vec<ConfigurationId>,
    /// Configurations excluded because their load failed
    pub failed: Vec<(ConfigurationId, StoreError)>,
}

impl SelectionOutcome {
    /// Check if any configuration failed to load
    #[inline]
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Owner of the selected configuration set
#[derive(Debug, Clone, Default)]
pub struct ConfigurationSetStore {
    set: ConfigurationSet,
    selection: Vec<ConfigurationId>,
    policy: SelectionPolicy,
}

impl ConfigurationSetStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            set: ConfigurationSet::default(),
            selection: Vec::new(),
            policy,
        }
    }

    /// Current set
    #[inline]
    #[must_use]
    pub fn set(&self) -> &ConfigurationSet {
        &self.set
    }

    /// Mutable current set
    #[inline]
    pub fn set_mut(&mut self) -> &mut ConfigurationSet {
        &mut self.set
    }

    /// Replace the current set, keeping the selection
    #[inline]
    pub fn replace_set(&mut self, set: ConfigurationSet) {
        self.set = set;
    }

    /// Requested selection, including identifiers that failed to load
    #[inline]
    #[must_use]
    pub fn selection(&self) -> &[ConfigurationId] {
        &self.selection
    }

    /// Retention policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Select an ordered list of configurations
    ///
    /// An unchanged list (after dropping repeated identifiers) keeps the
    /// current set untouched and reports `changed = false`. Otherwise every
    /// identifier is read through `repo`; failures are reported and leave
    /// only that configuration out of the new set.
    pub fn select(
        &mut self,
        ids: &[ConfigurationId],
        repo: &dyn ConfigurationRepository,
    ) -> SelectionOutcome {
        let requested = dedupe(ids);
        if requested == self.selection {
            tracing::debug!("Selection unchanged ({} configurations)", requested.len());
            return SelectionOutcome {
                changed: false,
                retained: self.set.ids().cloned().collect(),
                ..SelectionOutcome::default()
            };
        }

        let mut outcome = SelectionOutcome {
            changed: true,
            ..SelectionOutcome::default()
        };

        let mut defaults = Vec::with_capacity(requested.len());
        for id in &requested {
            match repo.read(id) {
                Ok(table) => defaults.push((id.clone(), table)),
                Err(e) => {
                    tracing::warn!("Excluding configuration {}: {}", id, e);
                    outcome.failed.push((id.clone(), e));
                }
            }
        }

        let multi = defaults.len() > 1;
        let mut entries = Vec::with_capacity(defaults.len());
        for (index, (id, default)) in defaults.into_iter().enumerate() {
            let default = position_table(default, multi, index == 0);
            let previous = self
                .set
                .index_of(&id)
                .filter(|_| self.policy.retain_edits_on_reselect);

            let entry = match previous.and_then(|old| self.set.get(old).map(|g| (old, g))) {
                Some((old, generations)) => {
                    let carried = carry(generations.updated(), &default, old > 0);
                    let carried = position_table(carried, multi, index == 0);
                    outcome.retained.push(id.clone());
                    ConfigurationGenerations::carried(id, default, carried)
                }
                None => {
                    outcome.loaded.push(id.clone());
                    ConfigurationGenerations::fresh(id, default)
                }
            };
            entries.push(entry);
        }

        tracing::info!(
            "Selected {} configurations ({} loaded, {} retained, {} failed)",
            entries.len(),
            outcome.loaded.len(),
            outcome.retained.len(),
            outcome.failed.len()
        );

        self.set = ConfigurationSet::new(entries);
        self.selection = requested;
        outcome
    }
}

/// Drop repeated identifiers, keeping first occurrences
fn dedupe(ids: &[ConfigurationId]) -> Vec<ConfigurationId> {
    let mut unique: Vec<ConfigurationId> = Vec::with_capacity(ids.len());
    for id in ids {
        if unique.contains(id) {
            tracing::warn!("Ignoring repeated configuration {}", id);
        } else {
            unique.push(id.clone());
        }
    }
    unique
}

/// Shape a table for its position in a set of the given size
fn position_table(table: ConfigurationTable, multi: bool, reference: bool) -> ConfigurationTable {
    let table = table.with_shared_column(multi);
    if reference {
        table
    } else {
        table.with_shared_cleared()
    }
}

/// Release governed entries a former dependent still holds
fn carry(updated: &ConfigurationTable, default: &ConfigurationTable, was_dependent: bool) -> ConfigurationTable {
    let mut table = updated.clone();
    if !was_dependent {
        return table;
    }

    let governed: Vec<String> = table.shared_names().map(str::to_string).collect();
    for name in governed {
        if !table.restore_from(default, &name) {
            table.remove(&name);
        }
    }
    table
}
