//! Simulated scattering background mapping
//!
//! Each dataset the model expects may name one model parameter that
//! determines its background (`source`) and one that receives it (`sink`).

use crate::error::BackgroundError;
use sasopt_table::ModelParameterTable;
use serde::{Deserialize, Serialize};

/// Background parameters of one dataset
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackgroundAssignment {
    /// Dataset index in the model's dataset list
    pub dataset: usize,
    /// Parameter determining the background
    pub source: Option<String>,
    /// Parameter receiving the background
    pub sink: Option<String>,
}

/// One assignment per expected dataset, in dataset order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackgroundMapping {
    assignments: Vec<BackgroundAssignment>,
}

impl BackgroundMapping {
    /// Empty assignments for `datasets` datasets
    #[must_use]
    pub fn new(datasets: usize) -> Self {
        Self {
            assignments: (0..datasets)
                .map(|dataset| BackgroundAssignment {
                    dataset,
                    ..BackgroundAssignment::default()
                })
                .collect(),
        }
    }

    /// Set source and sink of a dataset
    ///
    /// Parameter names are checked by [`validate`](Self::validate).
    ///
    /// # Errors
    /// Returns [`BackgroundError::UnknownDataset`] if `dataset` is out of range
    pub fn assign(
        &mut self,
        dataset: usize,
        source: Option<String>,
        sink: Option<String>,
    ) -> Result<(), BackgroundError> {
        let len = self.assignments.len();
        let entry = self
            .assignments
            .get_mut(dataset)
            .ok_or(BackgroundError::UnknownDataset {
                index: dataset,
                len,
            })?;
        entry.source = source;
        entry.sink = sink;
        Ok(())
    }

    /// Check every named parameter exists in `parameters`
    ///
    /// # Errors
    /// Returns the first [`BackgroundError::UnknownParameter`]
    pub fn validate(&self, parameters: &ModelParameterTable) -> Result<(), BackgroundError> {
        for assignment in &self.assignments {
            for name in [&assignment.source, &assignment.sink].into_iter().flatten() {
                if !parameters.contains(name) {
                    return Err(BackgroundError::UnknownParameter {
                        dataset: assignment.dataset,
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// First dataset whose background `name` determines
    #[must_use]
    pub fn source_dataset(&self, name: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.source.as_deref() == Some(name))
            .map(|a| a.dataset)
    }

    /// First dataset whose background `name` receives
    #[must_use]
    pub fn sink_dataset(&self, name: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.sink.as_deref() == Some(name))
            .map(|a| a.dataset)
    }

    /// Assignments in dataset order
    pub fn iter(&self) -> impl Iterator<Item = &BackgroundAssignment> {
        self.assignments.iter()
    }

    /// Number of datasets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Check if there are no datasets
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
