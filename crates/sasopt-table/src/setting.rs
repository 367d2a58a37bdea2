//! Setting records
//!
//! A [`Setting`] is one named scalar of an instrument configuration. Records
//! are persisted as flat JSON objects; fields outside the fixed schema are
//! carried verbatim in [`Setting::extra`] so that a load/serialize cycle never
//! drops information.

use crate::error::{TableError, TableResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted key of the setting name
pub(crate) const NAME_KEY: &str = "setting";

/// Accepted alternative key of the setting name
pub(crate) const NAME_ALIAS: &str = "name";

/// Values injected for optimization fields a record does not carry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDefaults {
    /// Default `lower_opt`
    pub lower_opt: f64,
    /// Default `upper_opt`
    pub upper_opt: f64,
    /// Default `step_opt`
    pub step_opt: f64,
}

impl TableDefaults {
    /// Defaults for instrument configuration tables
    #[inline]
    #[must_use]
    pub const fn configuration() -> Self {
        Self {
            lower_opt: 0.0,
            upper_opt: 1.0,
            step_opt: 0.0,
        }
    }

    /// Defaults for model-fit parameter tables
    #[inline]
    #[must_use]
    pub const fn model() -> Self {
        Self {
            lower_opt: 0.0,
            upper_opt: 1.0,
            step_opt: 1.0,
        }
    }

    /// With a different default step
    #[inline]
    #[must_use]
    pub const fn with_step_opt(mut self, step_opt: f64) -> Self {
        self.step_opt = step_opt;
        self
    }
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self::configuration()
    }
}

/// One named setting of an instrument configuration
///
/// # Invariants
/// - `name` is unique within its [`ConfigurationTable`](crate::ConfigurationTable)
/// - `shared` is `None` when the owning table belongs to a single-configuration
///   selection (there is nothing to share with)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Setting {
    /// Setting name
    #[serde(rename = "setting")]
    pub name: String,

    /// Current value
    pub value: f64,

    /// Shared with all other selected configurations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,

    /// Included in the optimization
    pub optimize: bool,

    /// Lower optimization bound
    pub lower_opt: f64,

    /// Upper optimization bound
    pub upper_opt: f64,

    /// Optimization step
    pub step_opt: f64,

    /// Lower fit limit, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowerlimit: Option<f64>,

    /// Upper fit limit, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upperlimit: Option<f64>,

    /// Persisted fields outside the fixed schema, in source order
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Setting {
    /// Create setting with configuration defaults
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self::with_defaults(name, value, &TableDefaults::configuration())
    }

    /// Create setting with explicit defaults
    #[inline]
    #[must_use]
    pub fn with_defaults(name: impl Into<String>, value: f64, defaults: &TableDefaults) -> Self {
        Self {
            name: name.into(),
            value,
            shared: None,
            optimize: false,
            lower_opt: defaults.lower_opt,
            upper_opt: defaults.upper_opt,
            step_opt: defaults.step_opt,
            lowerlimit: None,
            upperlimit: None,
            extra: IndexMap::new(),
        }
    }

    /// Enable optimization over `[lower, upper]` with `step`
    #[inline]
    #[must_use]
    pub fn optimized(mut self, lower: f64, upper: f64, step: f64) -> Self {
        self.optimize = true;
        self.lower_opt = lower;
        self.upper_opt = upper;
        self.step_opt = step;
        self
    }

    /// Set the shared flag
    #[inline]
    #[must_use]
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Set the fit limits
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.lowerlimit = Some(lower);
        self.upperlimit = Some(upper);
        self
    }

    /// Shared flag is present and set
    #[inline]
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.shared == Some(true)
    }

    /// Check optimization bounds
    ///
    /// Bounds are only meaningful when `optimize` is set; an unoptimized
    /// setting always passes.
    ///
    /// # Errors
    /// Returns [`TableError::InvalidBounds`] if `lower_opt > upper_opt` or
    /// `step_opt` is negative or not finite
    pub fn check_bounds(&self) -> TableResult<()> {
        check_bounds(
            &self.name,
            self.optimize,
            self.lower_opt,
            self.upper_opt,
            self.step_opt,
        )
    }

    /// Parse one persisted record
    pub(crate) fn from_record(
        record: usize,
        mut fields: Map<String, Value>,
        defaults: &TableDefaults,
    ) -> TableResult<Self> {
        let name = match fields.shift_remove(NAME_KEY) {
            Some(value) => value,
            None => fields
                .shift_remove(NAME_ALIAS)
                .ok_or_else(|| TableError::missing(record, NAME_KEY))?,
        };
        let name = match name {
            Value::String(name) => name,
            _ => return Err(TableError::wrong_type(record, NAME_KEY, "a string")),
        };

        let value = take_f64(&mut fields, record, "value")?
            .ok_or_else(|| TableError::missing(record, "value"))?;
        let shared = take_bool(&mut fields, record, "shared")?;
        let optimize = take_bool(&mut fields, record, "optimize")?.unwrap_or(false);
        let lower_opt = take_f64(&mut fields, record, "lower_opt")?.unwrap_or(defaults.lower_opt);
        let upper_opt = take_f64(&mut fields, record, "upper_opt")?.unwrap_or(defaults.upper_opt);
        let step_opt = take_f64(&mut fields, record, "step_opt")?.unwrap_or(defaults.step_opt);
        let lowerlimit = take_f64(&mut fields, record, "lowerlimit")?;
        let upperlimit = take_f64(&mut fields, record, "upperlimit")?;

        Ok(Self {
            name,
            value,
            shared,
            optimize,
            lower_opt,
            upper_opt,
            step_opt,
            lowerlimit,
            upperlimit,
            extra: fields.into_iter().collect(),
        })
    }
}

/// Shared bounds check for settings and model parameters
pub(crate) fn check_bounds(
    name: &str,
    optimize: bool,
    lower: f64,
    upper: f64,
    step: f64,
) -> TableResult<()> {
    if !optimize {
        return Ok(());
    }
    if lower > upper || !step.is_finite() || step < 0.0 {
        return Err(TableError::InvalidBounds {
            name: name.to_string(),
            lower,
            upper,
            step,
        });
    }
    Ok(())
}

/// Remove an optional numeric field; `null` counts as absent
fn take_f64(fields: &mut Map<String, Value>, record: usize, key: &str) -> TableResult<Option<f64>> {
    match fields.shift_remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| TableError::wrong_type(record, key, "a number")),
        Some(_) => Err(TableError::wrong_type(record, key, "a number")),
    }
}

/// Remove an optional boolean field; `null` counts as absent
fn take_bool(fields: &mut Map<String, Value>, record: usize, key: &str) -> TableResult<Option<bool>> {
    match fields.shift_remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(TableError::wrong_type(record, key, "a boolean")),
    }
}
