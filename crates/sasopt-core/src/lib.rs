//! SASOPT Core
//!
//! Setup engine for multi-configuration SANS experiment optimization.
//!
//! # Core Concepts
//!
//! - [`OptimizationSession`]: Coordinator owning the selected model, the
//!   configuration set and the editor tokens across interaction passes
//! - [`EditorSurface`]: Display surface that edits one [`EditorView`] at a time
//! - [`ModelInteraction`]: Contract of the external fitting engine
//! - [`SummaryBuilder`]: Flattens everything into a shorthand row set
//! - [`SessionConfig`]: Table defaults, retention policy, directories and
//!   [`RunSettings`]
//!
//! # Example
//!
//! ```rust
//! use sasopt_core::{OptimizationSession, SessionConfig};
//! use sasopt_store::{ConfigurationId, MemoryRepository};
//! use sasopt_table::{ConfigurationTable, Setting};
//!
//! let gap = |v| ConfigurationTable::from_settings([Setting::new("gap", v)]).unwrap();
//! let repo = MemoryRepository::new()
//!     .with_table("a.json", gap(5.0))
//!     .with_table("b.json", gap(3.0));
//!
//! let mut session = OptimizationSession::new(SessionConfig::default());
//! session.select_configurations(&[ConfigurationId::new("a.json"), ConfigurationId::new("b.json")], &repo);
//!
//! // Share the gap of the first configuration
//! let mut edited = session.view(0).unwrap().table;
//! edited.get_mut("gap").unwrap().shared = Some(true);
//! let outcome = session.apply_edit(0, edited).unwrap();
//!
//! assert_eq!(outcome.refreshed, vec![1]);
//! let summary = session.summary();
//! assert_eq!(summary.rows_for("gap").count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod background;
mod config;
mod editor;
mod error;
mod model;
mod run;
mod session;
mod summary;

// Re-exports
pub use background::{BackgroundAssignment, BackgroundMapping};
pub use config::SessionConfig;
pub use editor::{EditorSurface, EditorView, ModelView, CONFIGURATION_COLUMNS, MODEL_COLUMNS};
pub use error::{BackgroundError, ConfigError, ModelError, SessionError, SessionResult};
pub use model::{ModelInteraction, SelectedModel};
pub use run::{
    Acquisition, BackgroundRule, Fitter, Optimizer, RunSettings, MIN_GP_ITERATIONS, Q_CEILING, Q_FLOOR,
};
pub use session::{EditOutcome, OptimizationSession, PassReport};
pub use summary::{OptimizationSummary, ReportRow, SummaryBuilder, SUMMARY_COLUMNS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
