//! Fitting engine contract
//!
//! The session never runs a fit. It only needs the parameter enumeration of
//! the selected model and the datasets that model expects.

use crate::error::ModelError;
use indexmap::IndexMap;
use sasopt_table::{ModelParameterTable, ParameterDescriptor, TableDefaults, TableError};

/// Model interaction object of the external fitting engine
#[cfg_attr(test, mockall::automock)]
pub trait ModelInteraction {
    /// Parameters of the model in engine order
    ///
    /// # Errors
    /// Returns [`ModelError`] if the engine cannot enumerate the model
    fn enumerate_parameters(&self) -> Result<IndexMap<String, ParameterDescriptor>, ModelError>;

    /// File names of the datasets the model is fitted against, in order
    ///
    /// # Errors
    /// Returns [`ModelError`] if the engine cannot list the datasets
    fn list_expected_datasets(&self) -> Result<Vec<String>, ModelError>;
}

/// Model selected in a session
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedModel {
    /// Model name
    pub name: String,
    /// Editable parameter table
    pub parameters: ModelParameterTable,
    /// Expected dataset file names
    pub datasets: Vec<String>,
}

impl SelectedModel {
    /// Query the engine and build the parameter table
    ///
    /// # Errors
    /// - [`SessionError::Model`](crate::SessionError::Model) if the engine fails
    /// - [`SessionError::Table`](crate::SessionError::Table) if a parameter
    ///   has no value or a name repeats
    pub fn load(
        name: impl Into<String>,
        model: &dyn ModelInteraction,
        defaults: &TableDefaults,
    ) -> crate::SessionResult<Self> {
        let name = name.into();
        let descriptors = model.enumerate_parameters()?;
        let parameters = ModelParameterTable::from_descriptors(descriptors, defaults)
            .map_err(|e: TableError| {
                tracing::warn!("Model {} has an invalid parameter enumeration: {}", name, e);
                e
            })?;
        let datasets = model.list_expected_datasets()?;
        tracing::info!(
            "Loaded model {} ({} parameters, {} datasets)",
            name,
            parameters.len(),
            datasets.len()
        );
        Ok(Self {
            name,
            parameters,
            datasets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;

    fn descriptors() -> IndexMap<String, ParameterDescriptor> {
        let mut map = IndexMap::new();
        map.insert("background".to_string(), ParameterDescriptor::new(0.01));
        map.insert(
            "radius".to_string(),
            ParameterDescriptor::new(40.0).with_limits(10.0, 100.0),
        );
        map
    }

    #[test]
    fn load_builds_table_and_datasets() {
        let mut model = MockModelInteraction::new();
        model.expect_enumerate_parameters().times(1).returning(|| Ok(descriptors()));
        model
            .expect_list_expected_datasets()
            .times(1)
            .returning(|| Ok(vec!["h2o.dat".to_string(), "d2o.dat".to_string()]));

        let selected = SelectedModel::load("sphere.py", &model, &TableDefaults::model()).unwrap();
        assert_eq!(selected.name, "sphere.py");
        assert_eq!(selected.parameters.names().collect::<Vec<_>>(), vec!["background", "radius"]);
        assert_eq!(selected.datasets.len(), 2);
    }

    #[test]
    fn engine_failure_propagates() {
        let mut model = MockModelInteraction::new();
        model
            .expect_enumerate_parameters()
            .returning(|| Err(ModelError::new("runfile not found")));
        model.expect_list_expected_datasets().never();

        let err = SelectedModel::load("sphere.py", &model, &TableDefaults::model()).unwrap_err();
        assert!(matches!(err, SessionError::Model(_)));
    }

    #[test]
    fn missing_value_is_malformed() {
        let mut model = MockModelInteraction::new();
        model.expect_enumerate_parameters().returning(|| {
            let mut map = IndexMap::new();
            map.insert("radius".to_string(), ParameterDescriptor::default());
            Ok(map)
        });
        model.expect_list_expected_datasets().never();

        let err = SelectedModel::load("sphere.py", &model, &TableDefaults::model()).unwrap_err();
        assert!(matches!(err, SessionError::Table(ref e) if e.is_malformed()));
    }
}
