//! SASOPT Configuration Store
//!
//! Persisted instrument configurations and the set of configurations
//! selected for an optimization.
//!
//! # Core Concepts
//!
//! - [`ConfigurationRepository`]: Read/write/list contract for persisted
//!   tables, with a JSON directory and an in-memory implementation
//! - [`ConfigurationGenerations`]: The default, associated and updated
//!   tables of one selected configuration
//! - [`ConfigurationSet`]: Ordered selection; index 0 is the reference
//! - [`ConfigurationSetStore`]: Owner of the set across interaction passes
//!
//! # Example
//!
//! ```rust
//! use sasopt_store::{ConfigurationId, ConfigurationSetStore, MemoryRepository};
//! use sasopt_table::{ConfigurationTable, Setting};
//!
//! let gap = |v| ConfigurationTable::from_settings([Setting::new("gap", v)]).unwrap();
//! let repo = MemoryRepository::new()
//!     .with_table("a.json", gap(5.0))
//!     .with_table("b.json", gap(3.0));
//!
//! let mut store = ConfigurationSetStore::default();
//! let outcome = store.select(&[ConfigurationId::new("a.json"), ConfigurationId::new("b.json")], &repo);
//!
//! assert!(outcome.changed);
//! assert!(store.set().is_multi());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod error;
mod repository;
mod set;
mod store;

// Re-exports
pub use error::{StoreError, StoreResult};
pub use repository::{
    ConfigurationRepository, JsonDirectoryRepository, MemoryRepository, RemoveOutcome, VariantOutcome,
};
pub use set::{ConfigurationGenerations, ConfigurationId, ConfigurationSet};
pub use store::{ConfigurationSetStore, SelectionOutcome, SelectionPolicy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
