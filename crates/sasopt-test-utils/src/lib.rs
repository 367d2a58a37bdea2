//! Testing utilities for SASOPT workspace
//!
//! Shared fixtures: configuration tables, repositories, a scripted editor
//! surface and a fake fitting engine.

#![allow(missing_docs)]

use indexmap::IndexMap;
use sasopt_core::{EditorSurface, EditorView, ModelError, ModelInteraction};
use sasopt_reconcile::EditToken;
use sasopt_store::{ConfigurationId, MemoryRepository};
use sasopt_table::{ConfigurationTable, ParameterDescriptor, Setting};
use std::collections::{HashMap, VecDeque};

pub fn configuration_table(settings: &[(&str, f64)]) -> ConfigurationTable {
    ConfigurationTable::from_settings(settings.iter().map(|(name, value)| Setting::new(*name, *value))).unwrap()
}

/// Typical SANS instrument configuration at a detector distance [m]
pub fn sans_configuration(detector_distance: f64) -> ConfigurationTable {
    configuration_table(&[
        ("attenuation", 0.0),
        ("counting_time", 1200.0),
        ("detector_distance", detector_distance),
        ("guides", 0.0),
        ("wavelength", 6.0),
        ("wavelength_spread", 0.132),
    ])
}

pub fn ids(names: &[&str]) -> Vec<ConfigurationId> {
    names.iter().map(|n| ConfigurationId::new(*n)).collect()
}

pub fn repository_with(tables: Vec<(&str, ConfigurationTable)>) -> MemoryRepository {
    tables
        .into_iter()
        .fold(MemoryRepository::new(), |repo, (id, table)| repo.with_table(id, table))
}

/// `sans_1m.json`, `sans_4m.json` and `sans_12m.json`
pub fn sans_repository() -> MemoryRepository {
    repository_with(vec![
        ("sans_1m.json", sans_configuration(1.0)),
        ("sans_4m.json", sans_configuration(4.0)),
        ("sans_12m.json", sans_configuration(12.0)),
    ])
}

/// Gap scenario: `c0.json {gap: 5}` and `c1.json {gap: 3}`
pub fn gap_repository() -> MemoryRepository {
    repository_with(vec![
        ("c0.json", configuration_table(&[("gap", 5.0)])),
        ("c1.json", configuration_table(&[("gap", 3.0)])),
    ])
}

type UserEdit = Box<dyn FnOnce(&mut ConfigurationTable)>;

/// Editor surface that keeps state per token and applies scripted user edits
///
/// Mirrors a data-editor widget: while the token is unchanged it returns its
/// own state (the table it was first given plus any user edits); a new token
/// makes it reload from the view.
#[derive(Default)]
pub struct ScriptedSurface {
    state: HashMap<usize, (EditToken, ConfigurationTable)>,
    pending: HashMap<usize, VecDeque<UserEdit>>,
    reloads: Vec<usize>,
    shown: Vec<(usize, EditToken)>,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a user edit for the next time `index` is shown
    pub fn user_edit(&mut self, index: usize, edit: impl FnOnce(&mut ConfigurationTable) + 'static) {
        self.pending.entry(index).or_default().push_back(Box::new(edit));
    }

    /// Indices the surface reloaded from a view, in order
    pub fn reloads(&self) -> &[usize] {
        &self.reloads
    }

    /// Every (index, token) shown, in order
    pub fn shown(&self) -> &[(usize, EditToken)] {
        &self.shown
    }

    pub fn clear_log(&mut self) {
        self.reloads.clear();
        self.shown.clear();
    }

    /// Table the surface currently displays for `index`
    pub fn displayed(&self, index: usize) -> Option<&ConfigurationTable> {
        self.state.get(&index).map(|(_, table)| table)
    }
}

impl EditorSurface for ScriptedSurface {
    fn edit(&mut self, view: &EditorView) -> ConfigurationTable {
        self.shown.push((view.index, view.token));
        let reload = self
            .state
            .get(&view.index)
            .map_or(true, |(token, _)| *token != view.token);
        if reload {
            self.reloads.push(view.index);
            self.state.insert(view.index, (view.token, view.table.clone()));
        }

        let (_, table) = self.state.get_mut(&view.index).unwrap();
        if let Some(edit) = self.pending.get_mut(&view.index).and_then(VecDeque::pop_front) {
            edit(table);
        }
        table.clone()
    }
}

/// Fitting engine stand-in with fixed parameters and datasets
#[derive(Debug, Clone, Default)]
pub struct FakeModel {
    pub parameters: IndexMap<String, ParameterDescriptor>,
    pub datasets: Vec<String>,
}

impl FakeModel {
    /// Core-shell sphere against H2O and D2O contrasts
    pub fn core_shell_sphere() -> Self {
        let mut parameters = IndexMap::new();
        parameters.insert(
            "background_h2o".to_string(),
            ParameterDescriptor::new(0.5).with_limits(0.0, 1.0),
        );
        parameters.insert(
            "background_d2o".to_string(),
            ParameterDescriptor::new(0.05).with_limits(0.0, 0.2),
        );
        parameters.insert(
            "radius".to_string(),
            ParameterDescriptor::new(40.0).with_limits(10.0, 200.0),
        );
        parameters.insert(
            "thickness".to_string(),
            ParameterDescriptor::new(10.0).with_limits(1.0, 50.0),
        );
        parameters.insert("sld_solvent".to_string(), ParameterDescriptor::new(6.3));
        Self {
            parameters,
            datasets: vec!["sphere_h2o.dat".to_string(), "sphere_d2o.dat".to_string()],
        }
    }
}

impl ModelInteraction for FakeModel {
    fn enumerate_parameters(&self) -> Result<IndexMap<String, ParameterDescriptor>, ModelError> {
        Ok(self.parameters.clone())
    }

    fn list_expected_datasets(&self) -> Result<Vec<String>, ModelError> {
        Ok(self.datasets.clone())
    }
}
