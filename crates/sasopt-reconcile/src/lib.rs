//! SASOPT Reconciliation
//!
//! Shared-setting propagation across a configuration set and the edit-session
//! tokens that decide when editors reset.
//!
//! # Core Concepts
//!
//! - [`SharedSettingReconciler`]: Pure pass from a set to the reconciled set
//!   plus the indices that changed
//! - [`EditSessions`]: One [`EditToken`] per configuration index, reissued
//!   only where something changed
//!
//! # Example
//!
//! ```rust
//! use sasopt_reconcile::{reconcile, EditSessions};
//! use sasopt_store::{ConfigurationGenerations, ConfigurationSet};
//! use sasopt_table::{ConfigurationTable, Setting};
//!
//! let table = |v| {
//!     ConfigurationTable::from_settings([Setting::new("gap", v)])
//!         .unwrap()
//!         .with_shared_column(true)
//! };
//! let mut set = ConfigurationSet::new(vec![
//!     ConfigurationGenerations::fresh("a.json".into(), table(5.0)),
//!     ConfigurationGenerations::fresh("b.json".into(), table(3.0)),
//! ]);
//! let mut sessions = EditSessions::new();
//! sessions.reset_all(set.len());
//!
//! let mut edited = set.get(0).unwrap().updated().clone();
//! edited.get_mut("gap").unwrap().shared = Some(true);
//! set.get_mut(0).unwrap().record_edit(edited);
//!
//! let result = reconcile(&set);
//! for &index in &result.changed {
//!     sessions.refresh(index);
//! }
//! assert_eq!(result.changed, vec![1]);
//! assert_eq!(result.set.get(1).unwrap().updated().get("gap").unwrap().value, 5.0);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod lifecycle;
mod reconciler;

// Re-exports
pub use lifecycle::{EditSessions, EditToken};
pub use reconciler::{reconcile, ReconcileStatus, Reconciliation, SharedSettingReconciler};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
