//! Shorthand optimization summary
//!
//! Flattens the model parameters and every configuration table into one row
//! set, model rows first, then configuration rows grouped by index with the
//! reference first.
//!
//! | column    | model row                          | configuration row             |
//! |-----------|------------------------------------|-------------------------------|
//! | type      | `information`/`nuisance`, `f`-prefixed when absolute | `n`  |
//! | dataset   | `d` source, `b<d>` sink, else `-`  | `*`                           |
//! | config.   | `*` for background, else `-`       | `*` shared, else the index    |
//! | l_fit     | fit limit                          | `0` when optimized            |
//! | l_opt     | only when optimized                | only when optimized           |

use crate::background::BackgroundMapping;
use sasopt_store::ConfigurationSet;
use sasopt_table::{ModelParameter, ModelParameterTable, Setting};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column headers in display order
pub const SUMMARY_COLUMNS: [&str; 10] = [
    "type",
    "dataset",
    "config.",
    "parameter",
    "value",
    "l_fit",
    "u_fit",
    "l_opt",
    "u_opt",
    "step_opt",
];

/// One summary row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Parameter kind
    #[serde(rename = "type")]
    pub kind: String,
    /// Dataset column
    pub dataset: String,
    /// Configuration column
    #[serde(rename = "config.")]
    pub config: String,
    /// Parameter or setting name
    pub parameter: String,
    /// Current value
    pub value: f64,
    /// Lower fit limit
    pub l_fit: String,
    /// Upper fit limit
    pub u_fit: String,
    /// Lower optimization bound
    pub l_opt: String,
    /// Upper optimization bound
    pub u_opt: String,
    /// Optimization step
    pub step_opt: String,
}

impl ReportRow {
    fn cells(&self) -> [String; 10] {
        [
            self.kind.clone(),
            self.dataset.clone(),
            self.config.clone(),
            self.parameter.clone(),
            number(self.value),
            self.l_fit.clone(),
            self.u_fit.clone(),
            self.l_opt.clone(),
            self.u_opt.clone(),
            self.step_opt.clone(),
        ]
    }
}

/// Display-ready summary rows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptimizationSummary {
    rows: Vec<ReportRow>,
}

impl OptimizationSummary {
    /// Rows in display order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of a parameter or setting
    pub fn rows_for<'a>(&'a self, parameter: &'a str) -> impl Iterator<Item = &'a ReportRow> {
        self.rows.iter().filter(move |r| r.parameter == parameter)
    }

    /// Pretty-printed JSON array of the rows
    ///
    /// # Errors
    /// Returns error if a value cannot be represented in JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for OptimizationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 10]> = self.rows.iter().map(ReportRow::cells).collect();
        let mut widths = SUMMARY_COLUMNS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let header = SUMMARY_COLUMNS.map(str::to_string);
        for row in std::iter::once(&header).chain(&cells) {
            let line = row
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

/// Builder of [`OptimizationSummary`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryBuilder;

impl SummaryBuilder {
    /// Create builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the summary
    ///
    /// Dependent entries of settings shared on the reference are left out;
    /// the reference row (config `*`) stands for them.
    #[must_use]
    pub fn build(
        &self,
        parameters: &ModelParameterTable,
        set: &ConfigurationSet,
        background: &BackgroundMapping,
    ) -> OptimizationSummary {
        let mut rows: Vec<ReportRow> = parameters
            .iter()
            .map(|p| model_row(p, background))
            .collect();

        let reference = set.reference().map(|r| r.updated());
        let shared_on_reference =
            |name: &str| reference.and_then(|r| r.get(name)).is_some_and(Setting::is_shared);

        for (index, generations) in set.iter().enumerate() {
            for setting in generations.updated() {
                let shared = shared_on_reference(&setting.name);
                if shared && index > 0 {
                    continue;
                }
                let config = if shared { "*".to_string() } else { index.to_string() };
                rows.push(configuration_row(setting, config));
            }
        }

        OptimizationSummary { rows }
    }
}

fn model_row(parameter: &ModelParameter, background: &BackgroundMapping) -> ReportRow {
    let mut kind = parameter.parameter_type.as_str().to_string();
    if !parameter.relative {
        kind.insert(0, 'f');
    }

    let (dataset, config) = if let Some(d) = background.source_dataset(&parameter.name) {
        (d.to_string(), "*")
    } else if let Some(d) = background.sink_dataset(&parameter.name) {
        (format!("b{d}"), "*")
    } else {
        ("-".to_string(), "-")
    };

    let (l_opt, u_opt, step_opt) = opt_columns(
        parameter.optimize,
        parameter.lower_opt,
        parameter.upper_opt,
        parameter.step_opt,
    );

    ReportRow {
        kind,
        dataset,
        config: config.to_string(),
        parameter: parameter.name.clone(),
        value: parameter.value,
        l_fit: parameter.lowerlimit.map(number).unwrap_or_default(),
        u_fit: parameter.upperlimit.map(number).unwrap_or_default(),
        l_opt,
        u_opt,
        step_opt,
    }
}

fn configuration_row(setting: &Setting, config: String) -> ReportRow {
    let fit = if setting.optimize { "0" } else { "" };
    let (l_opt, u_opt, step_opt) = opt_columns(
        setting.optimize,
        setting.lower_opt,
        setting.upper_opt,
        setting.step_opt,
    );

    ReportRow {
        kind: "n".to_string(),
        dataset: "*".to_string(),
        config,
        parameter: setting.name.clone(),
        value: setting.value,
        l_fit: fit.to_string(),
        u_fit: fit.to_string(),
        l_opt,
        u_opt,
        step_opt,
    }
}

fn opt_columns(optimize: bool, lower: f64, upper: f64, step: f64) -> (String, String, String) {
    if optimize {
        (number(lower), number(upper), number(step))
    } else {
        (String::new(), String::new(), String::new())
    }
}

/// Shortest representation that keeps a decimal point
fn number(value: f64) -> String {
    format!("{value:?}")
}
