//! SASOPT Parameter Tables
//!
//! Fixed-schema tables of named settings for SANS instrument configurations
//! and model-fit parameters.
//!
//! # Core Concepts
//!
//! - [`Setting`]: One named scalar of an instrument configuration, with its
//!   optimization bounds and the `shared` flag
//! - [`ConfigurationTable`]: Ordered, name-unique mapping of settings that
//!   loads from and serializes to JSON record lists
//! - [`ModelParameterTable`]: Ordered mapping of model-fit parameters
//! - [`TableDefaults`]: Values injected for missing optimization fields
//!
//! # Example
//!
//! ```rust
//! use sasopt_table::{ConfigurationTable, TableDefaults};
//!
//! let json = r#"[{"setting": "detector_distance", "value": 4.0}]"#;
//! let table = ConfigurationTable::load(json.as_bytes(), &TableDefaults::configuration()).unwrap();
//!
//! let setting = table.get("detector_distance").unwrap();
//! assert_eq!(setting.value, 4.0);
//! assert_eq!(setting.upper_opt, 1.0);
//! assert!(!setting.optimize);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod error;
mod model;
mod setting;
mod table;

// Re-exports
pub use error::{TableError, TableResult};
pub use model::{ModelParameter, ModelParameterTable, ParameterDescriptor, ParameterType};
pub use setting::{Setting, TableDefaults};
pub use table::ConfigurationTable;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
