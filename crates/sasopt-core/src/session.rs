//! Optimization session
//!
//! [`OptimizationSession`] is the single owner of all state that survives
//! between interaction passes: the selected model, the configuration set
//! store and the edit-session tokens.
//!
//! # Pass
//!
//! ```text
//! select_model / select_configurations    (repository and engine calls)
//!                 │
//!                 v
//! for index in 0..len:  view(index) -> surface -> apply_edit(index)
//!                 │                                   │ index 0 changed
//!                 │                                   v
//!                 │                               reconcile -> refresh(changed)
//!                 v
//!              summary
//! ```

use crate::background::BackgroundMapping;
use crate::config::SessionConfig;
use crate::editor::{EditorSurface, EditorView, ModelView, MODEL_COLUMNS};
use crate::error::{SessionError, SessionResult};
use crate::model::{ModelInteraction, SelectedModel};
use crate::run::RunSettings;
use crate::summary::{OptimizationSummary, SummaryBuilder};
use sasopt_reconcile::{EditSessions, EditToken, SharedSettingReconciler};
use sasopt_store::{
    ConfigurationGenerations, ConfigurationId, ConfigurationRepository, ConfigurationSet,
    ConfigurationSetStore, SelectionOutcome,
};
use sasopt_table::{ConfigurationTable, ModelParameterTable};

/// Result of [`OptimizationSession::apply_edit`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditOutcome {
    /// The edited table differed from the previous `updated` generation
    pub changed: bool,
    /// Indices whose token was reissued as a consequence
    pub refreshed: Vec<usize>,
}

/// Result of [`OptimizationSession::render_pass`]
#[derive(Debug, Default)]
pub struct PassReport {
    /// Indices whose editor returned a changed table
    pub edited: Vec<usize>,
    /// Indices whose token was reissued, ascending
    pub refreshed: Vec<usize>,
    /// Edits that failed validation and were discarded
    pub rejected: Vec<(usize, SessionError)>,
}

impl PassReport {
    /// Check if the pass changed nothing
    #[inline]
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.edited.is_empty() && self.refreshed.is_empty() && self.rejected.is_empty()
    }
}

/// Coordinator of one optimization setup
#[derive(Debug)]
pub struct OptimizationSession {
    config: SessionConfig,
    store: ConfigurationSetStore,
    sessions: EditSessions,
    reconciler: SharedSettingReconciler,
    summary: SummaryBuilder,
    model: Option<SelectedModel>,
    background: BackgroundMapping,
}

impl Default for OptimizationSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl OptimizationSession {
    /// Create session
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            store: ConfigurationSetStore::new(config.selection),
            config,
            sessions: EditSessions::new(),
            reconciler: SharedSettingReconciler::new(),
            summary: SummaryBuilder::new(),
            model: None,
            background: BackgroundMapping::default(),
        }
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Model
    // ------------------------------------------------------------------

    /// Select the scattering model
    ///
    /// Re-selecting the current model keeps its edited parameter table; a
    /// different model replaces the table and resets the background mapping.
    ///
    /// # Errors
    /// Returns error if the engine fails or its enumeration is malformed; the
    /// previous model stays selected
    pub fn select_model(&mut self, name: &str, model: &dyn ModelInteraction) -> SessionResult<bool> {
        if self.model.as_ref().is_some_and(|m| m.name == name) {
            return Ok(false);
        }
        let selected = SelectedModel::load(name, model, &self.config.model_defaults())?;
        self.background = BackgroundMapping::new(selected.datasets.len());
        self.model = Some(selected);
        Ok(true)
    }

    /// Selected model, if any
    #[inline]
    #[must_use]
    pub fn model(&self) -> Option<&SelectedModel> {
        self.model.as_ref()
    }

    /// Model parameter editor view
    ///
    /// # Errors
    /// Returns [`SessionError::NoModelSelected`] before a model is selected
    pub fn model_view(&self) -> SessionResult<ModelView> {
        let model = self.model.as_ref().ok_or(SessionError::NoModelSelected)?;
        Ok(ModelView {
            model: model.name.clone(),
            table: model.parameters.clone(),
            column_order: MODEL_COLUMNS,
        })
    }

    /// Replace the model parameter table with an edited one
    ///
    /// Returns `true` if the table changed.
    ///
    /// # Errors
    /// - [`SessionError::NoModelSelected`] before a model is selected
    /// - [`SessionError::ShapeMismatch`] if the edit adds or drops parameters
    /// - [`SessionError::Table`] on invalid optimization bounds
    /// - [`SessionError::Background`] if the edit invalidates the mapping
    pub fn apply_model_edit(&mut self, edited: ModelParameterTable) -> SessionResult<bool> {
        let model = self.model.as_mut().ok_or(SessionError::NoModelSelected)?;
        if !edited.same_names(&model.parameters) {
            return Err(SessionError::shape_mismatch(
                model.name.clone(),
                model.parameters.names(),
                edited.names(),
            ));
        }
        edited.check_bounds()?;
        self.background.validate(&edited)?;

        if edited == model.parameters {
            return Ok(false);
        }
        model.parameters = edited;
        tracing::debug!("Model parameters of {} edited", model.name);
        Ok(true)
    }

    /// Background mapping
    #[inline]
    #[must_use]
    pub fn background(&self) -> &BackgroundMapping {
        &self.background
    }

    /// Set source and sink parameters of a dataset
    ///
    /// # Errors
    /// - [`SessionError::NoModelSelected`] before a model is selected
    /// - [`SessionError::Background`] on an unknown dataset or parameter
    pub fn assign_background(
        &mut self,
        dataset: usize,
        source: Option<&str>,
        sink: Option<&str>,
    ) -> SessionResult<()> {
        let model = self.model.as_ref().ok_or(SessionError::NoModelSelected)?;
        let mut mapping = self.background.clone();
        mapping.assign(dataset, source.map(str::to_string), sink.map(str::to_string))?;
        mapping.validate(&model.parameters)?;
        self.background = mapping;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Configurations
    // ------------------------------------------------------------------

    /// Select instrument configurations in order
    ///
    /// A changed selection reissues every token and reconciles the new set.
    /// An unchanged one issues nothing.
    pub fn select_configurations(
        &mut self,
        ids: &[ConfigurationId],
        repo: &dyn ConfigurationRepository,
    ) -> SelectionOutcome {
        let outcome = self.store.select(ids, repo);
        if !outcome.changed {
            return outcome;
        }

        self.sessions.reset_all(self.store.set().len());
        tracing::info!("Configuration selection changed, reset {} editors", self.sessions.len());

        let reconciliation = self.reconciler.reconcile(self.store.set());
        self.store.replace_set(reconciliation.set);
        outcome
    }

    /// Selected configuration set
    #[inline]
    #[must_use]
    pub fn configurations(&self) -> &ConfigurationSet {
        self.store.set()
    }

    /// Current token of a configuration editor
    #[inline]
    #[must_use]
    pub fn token(&self, index: usize) -> Option<EditToken> {
        self.sessions.token(index)
    }

    /// Total tokens issued
    #[inline]
    #[must_use]
    pub fn tokens_issued(&self) -> u64 {
        self.sessions.issued()
    }

    /// Editor view of configuration `index`
    ///
    /// Materializes the associated generation on first use.
    ///
    /// # Errors
    /// Returns [`SessionError::IndexOutOfRange`] for an unknown index
    pub fn view(&mut self, index: usize) -> SessionResult<EditorView> {
        let generations = self.generations_mut(index)?;
        let table = generations.materialize().clone();
        let id = generations.id().clone();
        let token = self.sessions.token(index).ok_or(SessionError::IndexOutOfRange {
            index,
            len: self.sessions.len(),
        })?;
        Ok(EditorView::new(index, id, table, token))
    }

    /// Apply the table an editor returned for configuration `index`
    ///
    /// An edit of the reference that changes it triggers reconciliation;
    /// tokens are reissued only for dependents whose table changed.
    ///
    /// # Errors
    /// - [`SessionError::IndexOutOfRange`] for an unknown index
    /// - [`SessionError::ShapeMismatch`] if the edit adds or drops settings
    /// - [`SessionError::SharedColumn`] if the edit adds or drops a `shared`
    ///   flag
    /// - [`SessionError::SharedOnDependent`] if a dependent toggles `shared`
    /// - [`SessionError::GovernedSetting`] if a dependent edits a setting the
    ///   reference shares
    /// - [`SessionError::Table`] on invalid optimization bounds
    pub fn apply_edit(&mut self, index: usize, edited: ConfigurationTable) -> SessionResult<EditOutcome> {
        validate_edit(index, self.generations(index)?.updated(), &edited)?;

        let changed = self.generations_mut(index)?.record_edit(edited);
        if !changed {
            return Ok(EditOutcome::default());
        }
        tracing::debug!("Configuration {} edited", index);

        let refreshed = if index == 0 { self.reconcile() } else { Vec::new() };
        Ok(EditOutcome { changed, refreshed })
    }

    /// Reconcile dependents against the reference
    ///
    /// Returns the indices whose token was reissued.
    pub fn reconcile(&mut self) -> Vec<usize> {
        let reconciliation = self.reconciler.reconcile(self.store.set());
        self.store.replace_set(reconciliation.set);

        let mut refreshed = Vec::with_capacity(reconciliation.changed.len());
        for index in reconciliation.changed {
            if self.sessions.refresh(index).is_some() {
                refreshed.push(index);
            }
        }
        if !refreshed.is_empty() {
            tracing::info!("Reset editors {:?} after reconciliation", refreshed);
        }
        refreshed
    }

    /// Run one top-to-bottom pass over all configuration editors
    ///
    /// Invalid edits are discarded and reported; the pass continues with the
    /// next configuration.
    pub fn render_pass(&mut self, surface: &mut dyn EditorSurface) -> PassReport {
        let mut report = PassReport::default();
        for index in 0..self.store.set().len() {
            let view = match self.view(index) {
                Ok(view) => view,
                Err(e) => {
                    report.rejected.push((index, e));
                    continue;
                }
            };
            let edited = surface.edit(&view);
            match self.apply_edit(index, edited) {
                Ok(outcome) => {
                    if outcome.changed {
                        report.edited.push(index);
                    }
                    report.refreshed.extend(outcome.refreshed);
                }
                Err(e) => {
                    tracing::warn!("Discarding edit of configuration {}: {}", index, e);
                    report.rejected.push((index, e));
                }
            }
        }
        report.refreshed.sort_unstable();
        report.refreshed.dedup();
        report
    }

    // ------------------------------------------------------------------
    // Summary and run settings
    // ------------------------------------------------------------------

    /// Shorthand summary of model and configuration settings
    ///
    /// Without a selected model only configuration rows are produced.
    #[must_use]
    pub fn summary(&self) -> OptimizationSummary {
        let empty = ModelParameterTable::new();
        let parameters = self.model.as_ref().map_or(&empty, |m| &m.parameters);
        self.summary
            .build(parameters, self.store.set(), &self.background)
    }

    /// Run settings
    #[inline]
    #[must_use]
    pub fn run_settings(&self) -> &RunSettings {
        &self.config.run
    }

    /// Replace the run settings
    ///
    /// # Errors
    /// Returns [`SessionError::Config`] if the settings are out of range
    pub fn set_run_settings(&mut self, run: RunSettings) -> SessionResult<()> {
        run.validate()?;
        self.config.run = run;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the default generation of configuration `index` back
    ///
    /// # Errors
    /// Returns error on an unknown index or a repository failure
    pub fn save(&self, index: usize, repo: &dyn ConfigurationRepository) -> SessionResult<()> {
        let generations = self.generations(index)?;
        let table = generations.default_table().clone().with_shared_column(false);
        repo.write(generations.id(), &table)?;
        Ok(())
    }

    /// Write the updated generation of configuration `index` under `id`
    ///
    /// # Errors
    /// Returns error on an unknown index or a repository failure
    pub fn export_updated(
        &self,
        index: usize,
        id: &ConfigurationId,
        repo: &dyn ConfigurationRepository,
    ) -> SessionResult<()> {
        let table = self.generations(index)?.updated().clone().with_shared_column(false);
        repo.write(id, &table)?;
        tracing::info!("Exported configuration {} as {}", index, id);
        Ok(())
    }

    fn generations(&self, index: usize) -> SessionResult<&ConfigurationGenerations> {
        let len = self.store.set().len();
        self.store
            .set()
            .get(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })
    }

    fn generations_mut(&mut self, index: usize) -> SessionResult<&mut ConfigurationGenerations> {
        let len = self.store.set().len();
        self.store
            .set_mut()
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })
    }
}

/// Check an edited table against the current one
fn validate_edit(index: usize, current: &ConfigurationTable, edited: &ConfigurationTable) -> SessionResult<()> {
    if !edited.same_names(current) {
        return Err(SessionError::shape_mismatch(
            format!("configuration {index}"),
            current.names(),
            edited.names(),
        ));
    }
    for setting in edited {
        let Some(before) = current.get(&setting.name) else {
            continue;
        };
        if setting.shared.is_some() != before.shared.is_some() {
            return Err(SessionError::SharedColumn {
                index,
                name: setting.name.clone(),
            });
        }
        if index > 0 {
            if setting.shared != before.shared {
                return Err(SessionError::SharedOnDependent {
                    index,
                    name: setting.name.clone(),
                });
            }
            if before.is_shared() && setting != before {
                return Err(SessionError::GovernedSetting {
                    index,
                    name: setting.name.clone(),
                });
            }
        }
    }
    edited.check_bounds()?;
    Ok(())
}
