//! Shared-setting reconciliation
//!
//! Propagates the reference configuration's shared settings into every
//! dependent configuration. Reconciliation is a pure function of the set: it
//! returns a new set and the indices whose `updated` table changed, and
//! leaves token issuance to the caller.
//!
//! # Rules
//!
//! For each dependent table and each setting `p` of the reference:
//!
//! | Reference `p` | Dependent entry            | Result                         |
//! |---------------|----------------------------|--------------------------------|
//! | shared        | any                        | exact copy of the reference    |
//! | not shared    | absent                     | restored from dependent default|
//! | not shared    | governed copy              | restored from default, or gone |
//! | not shared    | independent                | untouched                      |

use sasopt_store::{ConfigurationGenerations, ConfigurationSet};
use sasopt_table::ConfigurationTable;
use serde::{Deserialize, Serialize};

/// Whether reconciliation had anything to work on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcileStatus {
    /// Dependents were examined
    Applied,

    /// Empty set or no dependents; the set is returned unchanged
    NoOp,
}

/// Result of a reconciliation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Reconciled set
    pub set: ConfigurationSet,
    /// Dependent indices whose `updated` table changed, ascending
    pub changed: Vec<usize>,
    /// Pass status
    pub status: ReconcileStatus,
}

impl Reconciliation {
    /// Check if any dependent changed
    #[inline]
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Check if the pass was a no-op
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.status == ReconcileStatus::NoOp
    }
}

/// Reconciler driven by the reference (index 0) configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedSettingReconciler;

impl SharedSettingReconciler {
    /// Create reconciler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reconcile every dependent against the reference's `updated` table
    ///
    /// Changed dependents get the result as both `associated` and `updated`;
    /// unchanged ones are left exactly as they were.
    #[must_use]
    pub fn reconcile(&self, set: &ConfigurationSet) -> Reconciliation {
        let Some(reference) = set.reference().filter(|_| set.is_multi()) else {
            tracing::debug!("Reconciliation skipped ({} configurations)", set.len());
            return Reconciliation {
                set: set.clone(),
                changed: Vec::new(),
                status: ReconcileStatus::NoOp,
            };
        };

        let reference = reference.updated().clone();
        let mut result = set.clone();
        let mut changed = Vec::new();

        for index in 1..result.len() {
            let Some(dependent) = result.get_mut(index) else {
                continue;
            };
            let table = reconcile_dependent(&reference, dependent);
            if table != *dependent.updated() {
                dependent.commit(table);
                changed.push(index);
            }
        }

        if changed.is_empty() {
            tracing::debug!("Reconciliation left all {} dependents unchanged", result.len() - 1);
        } else {
            tracing::info!("Reconciliation changed configurations {:?}", changed);
        }

        Reconciliation {
            set: result,
            changed,
            status: ReconcileStatus::Applied,
        }
    }
}

/// Reconcile with a default [`SharedSettingReconciler`]
#[inline]
#[must_use]
pub fn reconcile(set: &ConfigurationSet) -> Reconciliation {
    SharedSettingReconciler::new().reconcile(set)
}

/// New `updated` table of one dependent
fn reconcile_dependent(
    reference: &ConfigurationTable,
    dependent: &ConfigurationGenerations,
) -> ConfigurationTable {
    let default = dependent.default_table();
    let mut table = dependent.updated().clone();

    for setting in reference {
        let name = setting.name.as_str();
        if setting.is_shared() {
            match table.get_mut(name) {
                Some(entry) => *entry = setting.clone(),
                None => {
                    table.restore_from(default, name);
                    table.insert(setting.clone());
                }
            }
            continue;
        }

        match table.get(name) {
            None => {
                table.restore_from(default, name);
            }
            Some(entry) if entry.is_shared() => {
                if !table.restore_from(default, name) {
                    table.remove(name);
                }
            }
            Some(_) => {}
        }
    }

    table
}
