//! Model-fit parameter tables
//!
//! A [`ModelParameterTable`] is built once per selected scattering model from
//! the parameter enumeration of the fitting engine and replaced wholesale
//! when the model changes.

use crate::error::{TableError, TableResult};
use crate::setting::{check_bounds, TableDefaults};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Role of a model parameter in the experimental optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// Contributes to the information content of the measurement
    #[default]
    Information,

    /// Nuisance parameter
    Nuisance,
}

impl ParameterType {
    /// Persisted/display name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Nuisance => "nuisance",
        }
    }
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "information" => Ok(Self::Information),
            "nuisance" => Ok(Self::Nuisance),
            other => Err(format!("unknown parameter type: '{other}'")),
        }
    }
}

/// Parameter as enumerated by the fitting engine
///
/// `value` is optional here so that an incomplete enumeration surfaces as
/// [`TableError::MalformedTable`] instead of a silent zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Current value
    pub value: Option<f64>,
    /// Lower fit limit
    pub lowerlimit: Option<f64>,
    /// Upper fit limit
    pub upperlimit: Option<f64>,
}

impl ParameterDescriptor {
    /// Descriptor with a value and no limits
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value: Some(value),
            lowerlimit: None,
            upperlimit: None,
        }
    }

    /// With fit limits
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.lowerlimit = Some(lower);
        self.upperlimit = Some(upper);
        self
    }
}

/// One model-fit parameter with its optimization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameter {
    /// Parameter name
    pub name: String,
    /// Current value
    pub value: f64,
    /// Lower fit limit
    pub lowerlimit: Option<f64>,
    /// Upper fit limit
    pub upperlimit: Option<f64>,
    /// Fit limits are relative to the value
    pub relative: bool,
    /// Included in the optimization
    pub optimize: bool,
    /// Lower optimization bound
    pub lower_opt: f64,
    /// Upper optimization bound
    pub upper_opt: f64,
    /// Optimization step
    pub step_opt: f64,
    /// Information or nuisance
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
}

impl ModelParameter {
    /// Create parameter with defaults for the optimization fields
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64, defaults: &TableDefaults) -> Self {
        Self {
            name: name.into(),
            value,
            lowerlimit: None,
            upperlimit: None,
            relative: true,
            optimize: false,
            lower_opt: defaults.lower_opt,
            upper_opt: defaults.upper_opt,
            step_opt: defaults.step_opt,
            parameter_type: ParameterType::Information,
        }
    }

    /// Check optimization bounds
    ///
    /// # Errors
    /// Returns [`TableError::InvalidBounds`] on an optimized parameter with
    /// `lower_opt > upper_opt` or a negative step
    pub fn check_bounds(&self) -> TableResult<()> {
        check_bounds(
            &self.name,
            self.optimize,
            self.lower_opt,
            self.upper_opt,
            self.step_opt,
        )
    }
}

/// Ordered mapping from parameter name to [`ModelParameter`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelParameterTable {
    parameters: IndexMap<String, ModelParameter>,
}

impl ModelParameterTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from enumerated descriptors
    ///
    /// # Errors
    /// - [`TableError::MalformedTable`] if a descriptor has no value
    /// - [`TableError::DuplicateSetting`] on a repeated name
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = (String, ParameterDescriptor)>,
        defaults: &TableDefaults,
    ) -> TableResult<Self> {
        let mut table = Self::new();
        for (index, (name, descriptor)) in descriptors.into_iter().enumerate() {
            let value = descriptor
                .value
                .ok_or_else(|| TableError::missing(index, "value"))?;
            let mut parameter = ModelParameter::new(name, value, defaults);
            parameter.lowerlimit = descriptor.lowerlimit;
            parameter.upperlimit = descriptor.upperlimit;
            table.push(parameter)?;
        }
        Ok(table)
    }

    /// Build from complete parameters
    ///
    /// # Errors
    /// Returns [`TableError::DuplicateSetting`] on a repeated name
    pub fn from_parameters(parameters: impl IntoIterator<Item = ModelParameter>) -> TableResult<Self> {
        let mut table = Self::new();
        for parameter in parameters {
            table.push(parameter)?;
        }
        Ok(table)
    }

    fn push(&mut self, parameter: ModelParameter) -> TableResult<()> {
        if self.parameters.contains_key(&parameter.name) {
            return Err(TableError::DuplicateSetting {
                name: parameter.name,
            });
        }
        self.parameters.insert(parameter.name.clone(), parameter);
        Ok(())
    }

    /// Get parameter by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelParameter> {
        self.parameters.get(name)
    }

    /// Get mutable parameter by name
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModelParameter> {
        self.parameters.get_mut(name)
    }

    /// Check if parameter exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Parameter names in order
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone {
        self.parameters.keys().map(String::as_str)
    }

    /// Parameters in order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ModelParameter> {
        self.parameters.values()
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Check if both tables hold the same set of names
    #[must_use]
    pub fn same_names(&self, other: &Self) -> bool {
        self.len() == other.len() && self.names().all(|name| other.contains(name))
    }

    /// Check optimization bounds of every parameter
    ///
    /// # Errors
    /// Returns the first [`TableError::InvalidBounds`] found
    pub fn check_bounds(&self) -> TableResult<()> {
        self.parameters
            .values()
            .try_for_each(ModelParameter::check_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors() -> Vec<(String, ParameterDescriptor)> {
        vec![
            (
                "background".to_string(),
                ParameterDescriptor::new(0.01).with_limits(0.0, 0.1),
            ),
            (
                "radius".to_string(),
                ParameterDescriptor::new(50.0).with_limits(10.0, 200.0),
            ),
        ]
    }

    #[test]
    fn descriptors_get_model_defaults() {
        let table = ModelParameterTable::from_descriptors(descriptors(), &TableDefaults::model()).unwrap();
        let radius = table.get("radius").unwrap();

        assert_eq!(radius.value, 50.0);
        assert_eq!(radius.lowerlimit, Some(10.0));
        assert!(radius.relative);
        assert!(!radius.optimize);
        assert_eq!(radius.step_opt, 1.0);
        assert_eq!(radius.parameter_type, ParameterType::Information);
    }

    #[test]
    fn order_follows_enumeration() {
        let table = ModelParameterTable::from_descriptors(descriptors(), &TableDefaults::model()).unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["background", "radius"]);
    }

    #[test]
    fn missing_value_is_malformed() {
        let descs = vec![("radius".to_string(), ParameterDescriptor::default())];
        let err = ModelParameterTable::from_descriptors(descs, &TableDefaults::model()).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn duplicate_parameter_rejected() {
        let descs = vec![
            ("radius".to_string(), ParameterDescriptor::new(1.0)),
            ("radius".to_string(), ParameterDescriptor::new(2.0)),
        ];
        let err = ModelParameterTable::from_descriptors(descs, &TableDefaults::model()).unwrap_err();
        assert!(matches!(err, TableError::DuplicateSetting { .. }));
    }

    #[test]
    fn parameter_type_parse_and_display() {
        assert_eq!("nuisance".parse::<ParameterType>(), Ok(ParameterType::Nuisance));
        assert_eq!(ParameterType::Information.to_string(), "information");
        assert!("other".parse::<ParameterType>().is_err());
    }

    #[test]
    fn parameter_type_serde_lowercase() {
        let json = serde_json::to_string(&ParameterType::Nuisance).unwrap();
        assert_eq!(json, "\"nuisance\"");
    }

    #[test]
    fn bounds_validation() {
        let mut table = ModelParameterTable::from_descriptors(descriptors(), &TableDefaults::model()).unwrap();
        assert!(table.check_bounds().is_ok());

        let radius = table.get_mut("radius").unwrap();
        radius.optimize = true;
        radius.lower_opt = 100.0;
        radius.upper_opt = 20.0;
        assert!(table.check_bounds().is_err());
    }
}
