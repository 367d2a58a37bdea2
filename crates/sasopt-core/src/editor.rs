//! Editor views
//!
//! The session hands each table to an [`EditorSurface`] as a view: the table
//! to show, which columns the user may not touch, the column order and the
//! edit-session token. A surface keeps the user's in-progress edits for as
//! long as the token stays the same.

use sasopt_reconcile::EditToken;
use sasopt_store::ConfigurationId;
use sasopt_table::{ConfigurationTable, ModelParameterTable};

/// Column order of configuration editors
pub const CONFIGURATION_COLUMNS: [&str; 6] = [
    "value",
    "shared",
    "optimize",
    "lower_opt",
    "upper_opt",
    "step_opt",
];

/// Column order of the model parameter editor
pub const MODEL_COLUMNS: [&str; 9] = [
    "type",
    "value",
    "lowerlimit",
    "upperlimit",
    "relative",
    "optimize",
    "lower_opt",
    "upper_opt",
    "step_opt",
];

/// One configuration table as handed to an editor
#[derive(Debug, Clone, PartialEq)]
pub struct EditorView {
    /// Configuration index; 0 is the reference
    pub index: usize,
    /// Configuration identifier
    pub id: ConfigurationId,
    /// Table to show (the associated generation)
    pub table: ConfigurationTable,
    /// Columns the user cannot edit
    pub disabled_columns: Vec<&'static str>,
    /// Visible columns in display order
    pub column_order: Vec<&'static str>,
    /// Edit-session token
    pub token: EditToken,
}

impl EditorView {
    /// Build the view of configuration `index`
    ///
    /// `shared` is only shown when the table carries the column, and only
    /// editable on the reference.
    #[must_use]
    pub fn new(index: usize, id: ConfigurationId, table: ConfigurationTable, token: EditToken) -> Self {
        let shared = table.has_shared_column();
        let disabled_columns = if index == 0 {
            vec!["setting"]
        } else {
            vec!["setting", "shared"]
        };
        let column_order = CONFIGURATION_COLUMNS
            .into_iter()
            .filter(|c| shared || *c != "shared")
            .collect();
        Self {
            index,
            id,
            table,
            disabled_columns,
            column_order,
            token,
        }
    }

    /// Check if a column is read-only
    #[inline]
    #[must_use]
    pub fn is_disabled(&self, column: &str) -> bool {
        self.disabled_columns.iter().any(|c| *c == column)
    }
}

/// The model parameter table as handed to an editor
#[derive(Debug, Clone, PartialEq)]
pub struct ModelView {
    /// Model name
    pub model: String,
    /// Table to show
    pub table: ModelParameterTable,
    /// Visible columns in display order
    pub column_order: [&'static str; 9],
}

/// Display surface that lets the user edit tables
///
/// # Contract
/// Given the same token twice and no user input in between, `edit` returns
/// its input unchanged. A new token discards any in-progress state.
pub trait EditorSurface {
    /// Show `view` and return the (possibly) edited table
    fn edit(&mut self, view: &EditorView) -> ConfigurationTable;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sasopt_reconcile::EditSessions;
    use sasopt_table::Setting;

    fn token() -> EditToken {
        let mut sessions = EditSessions::new();
        sessions.reset_all(1);
        sessions.token(0).unwrap()
    }

    fn table(shared: bool) -> ConfigurationTable {
        ConfigurationTable::from_settings([Setting::new("gap", 1.0)])
            .unwrap()
            .with_shared_column(shared)
    }

    #[test]
    fn reference_may_edit_shared() {
        let view = EditorView::new(0, "a.json".into(), table(true), token());
        assert!(view.is_disabled("setting"));
        assert!(!view.is_disabled("shared"));
        assert_eq!(view.column_order, CONFIGURATION_COLUMNS.to_vec());
    }

    #[test]
    fn dependent_shared_is_read_only() {
        let view = EditorView::new(2, "c.json".into(), table(true), token());
        assert!(view.is_disabled("shared"));
    }

    #[test]
    fn single_configuration_hides_shared() {
        let view = EditorView::new(0, "a.json".into(), table(false), token());
        assert!(!view.column_order.contains(&"shared"));
        assert_eq!(view.column_order.len(), 5);
    }
}
