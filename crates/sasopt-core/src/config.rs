//! Session configuration
//!
//! [`SessionConfig`] collects everything a session needs besides the
//! user's interaction: table defaults, the selection retention policy,
//! configuration directories and the run settings. It can be read from
//! TOML, YAML or JSON.
//!
//! ```toml
//! configuration_step_opt = 0.0
//! model_step_opt = 1.0
//! user_dir = "/data/sans/configurations"
//!
//! [selection]
//! retain_edits_on_reselect = true
//!
//! [run]
//! q_min = 0.001
//! q_max = 0.5
//! fitter = "dream"
//! optimizer = { kind = "grid_search" }
//! ```

use crate::error::ConfigError;
use crate::run::RunSettings;
use sasopt_store::{JsonDirectoryRepository, SelectionPolicy};
use sasopt_table::TableDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Default `step_opt` injected into instrument configuration tables
    pub configuration_step_opt: f64,
    /// Default `step_opt` of model-fit parameters
    pub model_step_opt: f64,
    /// Treatment of edits when the configuration selection changes
    pub selection: SelectionPolicy,
    /// Directory of user configuration files
    pub user_dir: Option<PathBuf>,
    /// Directory of shipped example configuration files
    pub example_dir: Option<PathBuf>,
    /// Run settings
    pub run: RunSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            configuration_step_opt: TableDefaults::configuration().step_opt,
            model_step_opt: TableDefaults::model().step_opt,
            selection: SelectionPolicy::default(),
            user_dir: None,
            example_dir: None,
            run: RunSettings::default(),
        }
    }
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default configuration step
    #[inline]
    #[must_use]
    pub fn with_configuration_step_opt(mut self, step_opt: f64) -> Self {
        self.configuration_step_opt = step_opt;
        self
    }

    /// With default model parameter step
    #[inline]
    #[must_use]
    pub fn with_model_step_opt(mut self, step_opt: f64) -> Self {
        self.model_step_opt = step_opt;
        self
    }

    /// With selection policy
    #[inline]
    #[must_use]
    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection = policy;
        self
    }

    /// With user configuration directory
    #[inline]
    #[must_use]
    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }

    /// With example configuration directory
    #[inline]
    #[must_use]
    pub fn with_example_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.example_dir = Some(dir.into());
        self
    }

    /// With run settings
    #[inline]
    #[must_use]
    pub fn with_run_settings(mut self, run: RunSettings) -> Self {
        self.run = run;
        self
    }

    /// Defaults for instrument configuration tables
    #[inline]
    #[must_use]
    pub fn configuration_defaults(&self) -> TableDefaults {
        TableDefaults::configuration().with_step_opt(self.configuration_step_opt)
    }

    /// Defaults for model parameter tables
    #[inline]
    #[must_use]
    pub fn model_defaults(&self) -> TableDefaults {
        TableDefaults::model().with_step_opt(self.model_step_opt)
    }

    /// Directory repository over the configured directories
    ///
    /// `None` without a user directory.
    #[must_use]
    pub fn repository(&self) -> Option<JsonDirectoryRepository> {
        let user_dir = self.user_dir.as_ref()?;
        let repo = JsonDirectoryRepository::new(user_dir).with_defaults(self.configuration_defaults());
        Some(match &self.example_dir {
            Some(dir) => repo.with_example_dir(dir),
            None => repo,
        })
    }

    /// Validate
    ///
    /// # Errors
    /// Returns [`ConfigError::OutOfRange`] on invalid run settings or a
    /// negative/non-finite default step
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, step) in [
            ("configuration_step_opt", self.configuration_step_opt),
            ("model_step_opt", self.model_step_opt),
        ] {
            if !step.is_finite() || step < 0.0 {
                return Err(ConfigError::out_of_range(field, step, "must be a non-negative number"));
            }
        }
        self.run.validate()
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns error if the TOML is invalid or the result fails validation
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML
    ///
    /// # Errors
    /// Returns error if the YAML is invalid or the result fails validation
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if the JSON is invalid or the result fails validation
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, choosing the format by extension
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedFormat`] for an unknown extension
    /// - [`ConfigError::Io`] if the file cannot be read
    /// - A parse or validation error from the format reader
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("toml") => Self::from_toml,
            Some("yaml" | "yml") => Self::from_yaml,
            Some("json") => Self::from_json,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse(&text)?;
        tracing::info!("Loaded session configuration from {}", path.display());
        Ok(config)
    }
}
