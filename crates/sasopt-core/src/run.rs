//! Optimization run settings
//!
//! The q range, time budget, fitter and optimizer handed to the external
//! optimization run once the parameter setup is complete.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Smallest accepted `q_min` [1/Å]
pub const Q_FLOOR: f64 = 0.0001;

/// Largest accepted `q_max` [1/Å]
pub const Q_CEILING: f64 = 0.8;

/// Fewest Gaussian-process iterations accepted
pub const MIN_GP_ITERATIONS: u32 = 20;

/// Fitting engine backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fitter {
    /// Levenberg-Marquardt least squares
    #[default]
    LevenbergMarquardt,

    /// DREAM Markov chain Monte Carlo
    Dream,
}

/// Acquisition function of the Gaussian-process optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acquisition {
    /// Vectorized Shannon information gain
    #[default]
    ShannonIgVec,
    /// Upper confidence bound
    Ucb,
    /// Largest predicted variance
    Variance,
    /// Largest predicted value
    Maximum,
}

/// Search strategy over the optimization parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Optimizer {
    /// Gaussian-process regression
    GaussianProcess {
        /// Number of iterations
        iterations: u32,
        /// Acquisition function
        acquisition: Acquisition,
    },

    /// Exhaustive grid over the optimization steps
    GridSearch,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::GaussianProcess {
            iterations: 1000,
            acquisition: Acquisition::default(),
        }
    }
}

/// Solvent model for the simulated scattering background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundRule {
    /// H2O/D2O mixtures
    #[default]
    Water,
    /// Acetonitrile
    Acetonitrile,
}

/// Settings of one optimization run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Lower end of the q range [1/Å]
    pub q_min: f64,
    /// Upper end of the q range [1/Å]
    pub q_max: f64,
    /// Total counting time [s]; 0 uses the configuration settings
    pub max_time_s: u64,
    /// Fitting backend
    pub fitter: Fitter,
    /// Search strategy
    pub optimizer: Optimizer,
    /// Background solvent model
    pub background_rule: BackgroundRule,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            q_min: 0.001,
            q_max: 0.5,
            max_time_s: 0,
            fitter: Fitter::default(),
            optimizer: Optimizer::default(),
            background_rule: BackgroundRule::default(),
        }
    }
}

impl RunSettings {
    /// With q range
    #[inline]
    #[must_use]
    pub fn with_q_range(mut self, q_min: f64, q_max: f64) -> Self {
        self.q_min = q_min;
        self.q_max = q_max;
        self
    }

    /// With time budget
    #[inline]
    #[must_use]
    pub fn with_max_time(mut self, seconds: u64) -> Self {
        self.max_time_s = seconds;
        self
    }

    /// With fitter
    #[inline]
    #[must_use]
    pub fn with_fitter(mut self, fitter: Fitter) -> Self {
        self.fitter = fitter;
        self
    }

    /// With optimizer
    #[inline]
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// With background rule
    #[inline]
    #[must_use]
    pub fn with_background_rule(mut self, rule: BackgroundRule) -> Self {
        self.background_rule = rule;
        self
    }

    /// Time budget, `None` when the configurations decide
    #[inline]
    #[must_use]
    pub fn time_budget(&self) -> Option<u64> {
        (self.max_time_s > 0).then_some(self.max_time_s)
    }

    /// Validate ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::OutOfRange`] if the q range leaves
    /// `[Q_FLOOR, Q_CEILING]`, is empty, or the Gaussian process has fewer
    /// than [`MIN_GP_ITERATIONS`] iterations
    pub fn validate(&self) -> Result<(), ConfigError> {
        let range = format!("[{Q_FLOOR}, {Q_CEILING}]");
        if !(Q_FLOOR..=Q_CEILING).contains(&self.q_min) {
            return Err(ConfigError::out_of_range("q_min", self.q_min, range));
        }
        if !(Q_FLOOR..=Q_CEILING).contains(&self.q_max) {
            return Err(ConfigError::out_of_range("q_max", self.q_max, range));
        }
        if self.q_min >= self.q_max {
            return Err(ConfigError::out_of_range(
                "q_min",
                self.q_min,
                format!("must be below q_max = {}", self.q_max),
            ));
        }
        if let Optimizer::GaussianProcess { iterations, .. } = self.optimizer {
            if iterations < MIN_GP_ITERATIONS {
                return Err(ConfigError::out_of_range(
                    "iterations",
                    iterations,
                    format!("at least {MIN_GP_ITERATIONS}"),
                ));
            }
        }
        Ok(())
    }
}
