//! Functional tests for the optimization session across interaction passes.
//!
//! Core guarantees exercised here:
//! - Settings shared on the first configuration show up identically in every
//!   other configuration, and unsharing restores the loaded defaults.
//! - Editors reset exactly when their table changed underneath them, never
//!   on an unrelated rerun.
//! - Selection changes keep prior edits of configurations that stay selected
//!   and reset every editor.
//! - The shorthand summary marks shared settings with `*`.

use pretty_assertions::assert_eq;
use sasopt_core::{OptimizationSession, SessionConfig, SessionError};
use sasopt_store::{ConfigurationRepository, MemoryRepository, SelectionPolicy};
use sasopt_table::ConfigurationTable;
use sasopt_test_utils::{gap_repository, ids, sans_repository, ScriptedSurface};
use std::collections::HashSet;

fn gap_session() -> (OptimizationSession, MemoryRepository, ScriptedSurface) {
    let repo = gap_repository();
    let mut session = OptimizationSession::default();
    session.select_configurations(&ids(&["c0.json", "c1.json"]), &repo);
    (session, repo, ScriptedSurface::new())
}

fn share_gap(shared: bool) -> impl FnOnce(&mut ConfigurationTable) {
    move |t| t.get_mut("gap").unwrap().shared = Some(shared)
}

/// Tenet: a shared setting propagates with all optimization fields.
///
/// Scenario: config0 {gap: 5, shared} and config1 {gap: 3}; config0 turns on
/// optimization of gap over [1, 10]. Config1 must show exactly the same.
#[test]
fn shared_setting_propagates_to_dependent_editor() {
    let (mut session, _repo, mut surface) = gap_session();
    surface.user_edit(0, |t| {
        let gap = t.get_mut("gap").unwrap();
        gap.shared = Some(true);
        gap.optimize = true;
        gap.lower_opt = 1.0;
        gap.upper_opt = 10.0;
    });

    let report = session.render_pass(&mut surface);
    assert_eq!(report.edited, vec![0]);
    assert_eq!(report.refreshed, vec![1]);
    assert!(report.rejected.is_empty());

    let shown = surface.displayed(1).unwrap().get("gap").unwrap();
    assert_eq!(shown.value, 5.0);
    assert!(shown.optimize);
    assert_eq!((shown.lower_opt, shown.upper_opt), (1.0, 10.0));
    assert_eq!(session.configurations().get(1).unwrap().updated().get("gap"), Some(shown));
}

/// Tenet: an unrelated rerun issues no token.
///
/// If a pass with unchanged editor output reset an editor, the user would
/// lose in-progress edits on every interaction.
#[test]
fn unchanged_rerun_issues_no_token() {
    let (mut session, _repo, mut surface) = gap_session();
    surface.user_edit(0, share_gap(true));
    session.render_pass(&mut surface);

    let issued = session.tokens_issued();
    surface.clear_log();
    for _ in 0..3 {
        let report = session.render_pass(&mut surface);
        assert!(report.is_quiet(), "unexpected activity: {report:?}");
    }
    assert_eq!(session.tokens_issued(), issued);
    assert!(surface.reloads().is_empty());
}

/// Tenet: editing a dependent never resets another editor.
#[test]
fn dependent_edit_does_not_propagate() {
    let (mut session, _repo, mut surface) = gap_session();
    session.render_pass(&mut surface);
    let issued = session.tokens_issued();

    surface.user_edit(1, |t| t.get_mut("gap").unwrap().value = 4.0);
    let report = session.render_pass(&mut surface);

    assert_eq!(report.edited, vec![1]);
    assert!(report.refreshed.is_empty());
    assert_eq!(session.tokens_issued(), issued);
    assert_eq!(session.configurations().get(0).unwrap().updated().get("gap").unwrap().value, 5.0);
}

/// Tenet: unsharing restores the dependent from its default.
///
/// The dependent had a local edit (gap = 4) before the reference shared gap.
/// After unsharing it must show its loaded value (3), not the shared copy and
/// not the overwritten local edit.
#[test]
fn unsharing_restores_default_not_local_edit() {
    let (mut session, _repo, mut surface) = gap_session();
    surface.user_edit(1, |t| t.get_mut("gap").unwrap().value = 4.0);
    session.render_pass(&mut surface);

    surface.user_edit(0, |t| {
        let gap = t.get_mut("gap").unwrap();
        gap.shared = Some(true);
        gap.value = 7.0;
    });
    session.render_pass(&mut surface);
    assert_eq!(surface.displayed(1).unwrap().get("gap").unwrap().value, 7.0);

    surface.user_edit(0, share_gap(false));
    let report = session.render_pass(&mut surface);
    assert_eq!(report.refreshed, vec![1]);

    let gap = surface.displayed(1).unwrap().get("gap").unwrap();
    assert_eq!(gap.value, 3.0);
    assert_eq!(gap.shared, Some(false));
}

/// Tenet: selecting more configurations keeps earlier edits.
///
/// Scenario: select [A] and edit it, then select [A, B]. A's editor is reset
/// but shows the edit.
#[test]
fn growing_selection_keeps_edits() {
    let repo = sans_repository();
    let mut session = OptimizationSession::default();
    let mut surface = ScriptedSurface::new();

    session.select_configurations(&ids(&["sans_4m.json"]), &repo);
    surface.user_edit(0, |t| t.get_mut("counting_time").unwrap().value = 3600.0);
    session.render_pass(&mut surface);
    let before = session.token(0).unwrap();

    let outcome = session.select_configurations(&ids(&["sans_4m.json", "sans_12m.json"]), &repo);
    assert_eq!(outcome.retained, ids(&["sans_4m.json"]));
    assert_ne!(session.token(0).unwrap(), before);

    surface.clear_log();
    session.render_pass(&mut surface);
    assert_eq!(surface.reloads(), &[0, 1]);

    let shown = surface.displayed(0).unwrap();
    assert_eq!(shown.get("counting_time").unwrap().value, 3600.0);
    assert_eq!(shown.get("counting_time").unwrap().shared, Some(false));
    assert_eq!(surface.displayed(1).unwrap().get("counting_time").unwrap().value, 1200.0);
}

/// Tenet: with retention disabled a changed selection starts from defaults.
#[test]
fn reload_policy_discards_edits() {
    let repo = sans_repository();
    let config = SessionConfig::new().with_selection_policy(SelectionPolicy::reload_all());
    let mut session = OptimizationSession::new(config);
    let mut surface = ScriptedSurface::new();

    session.select_configurations(&ids(&["sans_4m.json"]), &repo);
    surface.user_edit(0, |t| t.get_mut("counting_time").unwrap().value = 3600.0);
    session.render_pass(&mut surface);

    session.select_configurations(&ids(&["sans_4m.json", "sans_12m.json"]), &repo);
    session.render_pass(&mut surface);
    assert_eq!(surface.displayed(0).unwrap().get("counting_time").unwrap().value, 1200.0);
}

/// Tenet: removing a configuration is a set change.
///
/// Scenario: select [A, B] then [A]; A's token is reissued.
#[test]
fn shrinking_selection_resets_remaining_editor() {
    let repo = sans_repository();
    let mut session = OptimizationSession::default();
    session.select_configurations(&ids(&["sans_4m.json", "sans_12m.json"]), &repo);
    let before = session.token(0).unwrap();

    let outcome = session.select_configurations(&ids(&["sans_4m.json"]), &repo);
    assert!(outcome.changed);
    assert_ne!(session.token(0).unwrap(), before);
    assert_eq!(session.token(1), None);
    assert!(!session.configurations().get(0).unwrap().updated().has_shared_column());
}

/// Tenet: re-selecting the same list is a no-op.
#[test]
fn same_selection_issues_no_token() {
    let repo = sans_repository();
    let mut session = OptimizationSession::default();
    session.select_configurations(&ids(&["sans_4m.json", "sans_12m.json"]), &repo);
    let issued = session.tokens_issued();

    let outcome = session.select_configurations(&ids(&["sans_4m.json", "sans_12m.json"]), &repo);
    assert!(!outcome.changed);
    assert_eq!(session.tokens_issued(), issued);
}

/// Tenet: the summary marks shared settings with `*` and others with their
/// configuration index.
#[test]
fn summary_marks_shared_and_owned_settings() {
    let repo = sans_repository();
    let mut session = OptimizationSession::default();
    let mut surface = ScriptedSurface::new();
    session.select_configurations(&ids(&["sans_12m.json", "sans_4m.json", "sans_1m.json"]), &repo);

    surface.user_edit(0, |t| t.get_mut("wavelength").unwrap().shared = Some(true));
    session.render_pass(&mut surface);

    let summary = session.summary();
    let wavelength: Vec<_> = summary.rows_for("wavelength").collect();
    assert_eq!(wavelength.len(), 1);
    assert_eq!((wavelength[0].dataset.as_str(), wavelength[0].config.as_str()), ("*", "*"));

    let distance: Vec<_> = summary
        .rows_for("detector_distance")
        .map(|r| (r.config.as_str(), r.value))
        .collect();
    assert_eq!(distance, vec![("0", 12.0), ("1", 4.0), ("2", 1.0)]);
}

/// Tenet: tokens are never reused.
#[test]
fn tokens_are_unique_across_passes() {
    let (mut session, _repo, mut surface) = gap_session();
    for i in 0..5 {
        surface.user_edit(0, move |t| {
            let gap = t.get_mut("gap").unwrap();
            gap.shared = Some(true);
            gap.value = f64::from(i) + 10.0;
        });
        session.render_pass(&mut surface);
    }

    // 2 initial tokens + one refresh of the dependent per pass; the dependent's
    // initial token is replaced before it is first shown
    let distinct: HashSet<_> = surface.shown().iter().map(|(_, token)| *token).collect();
    assert_eq!(session.tokens_issued(), 7);
    assert_eq!(distinct.len(), 6);
    assert_eq!(surface.shown().len(), 10);
}

/// Tenet: invalid edits are rejected and leave the tables untouched.
#[test]
fn invalid_edits_are_rejected() {
    let (mut session, _repo, mut surface) = gap_session();
    surface.user_edit(1, share_gap(true));
    surface.user_edit(0, |t| {
        let gap = t.get_mut("gap").unwrap();
        gap.optimize = true;
        gap.lower_opt = 10.0;
        gap.upper_opt = 1.0;
    });

    let report = session.render_pass(&mut surface);
    assert_eq!(report.rejected.len(), 2);
    assert!(report.rejected[0].1.is_invalid_bounds());
    assert!(matches!(report.rejected[1].1, SessionError::SharedOnDependent { index: 1, .. }));
    assert!(report.refreshed.is_empty());

    for generations in session.configurations().iter() {
        assert!(!generations.updated().get("gap").unwrap().optimize);
        assert_eq!(generations.updated().get("gap").unwrap().shared, Some(false));
    }
}

/// Tenet: a dependent cannot edit its copy of a shared setting.
#[test]
fn governed_copy_is_read_only() {
    let (mut session, _repo, mut surface) = gap_session();
    surface.user_edit(0, share_gap(true));
    session.render_pass(&mut surface);

    let mut edited = session.view(1).unwrap().table;
    edited.get_mut("gap").unwrap().value = 1.0;
    let err = session.apply_edit(1, edited).unwrap_err();
    assert!(matches!(err, SessionError::GovernedSetting { index: 1, .. }));
}

/// Tenet: edits cannot add or drop settings.
#[test]
fn shape_changing_edit_is_rejected() {
    let (mut session, _repo, _surface) = gap_session();
    let mut edited = session.view(0).unwrap().table;
    edited.remove("gap");

    let err = session.apply_edit(0, edited).unwrap_err();
    assert!(matches!(err, SessionError::ShapeMismatch { ref removed, .. } if removed == &vec!["gap".to_string()]));
    assert!(matches!(
        session.apply_edit(7, ConfigurationTable::new()),
        Err(SessionError::IndexOutOfRange { index: 7, len: 2 })
    ));
}

/// Tenet: a failing configuration is excluded, the rest load.
#[test]
fn failed_load_excludes_only_that_configuration() {
    let repo = gap_repository();
    let mut session = OptimizationSession::default();
    let outcome = session.select_configurations(&ids(&["c0.json", "missing.json", "c1.json"]), &repo);

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0.as_str(), "missing.json");
    assert_eq!(session.configurations().len(), 2);
    assert_eq!(session.token(2), None);
}

/// Tenet: saving writes the default generation; exporting writes the edits.
#[test]
fn save_and_export() {
    let (mut session, repo, mut surface) = gap_session();
    surface.user_edit(1, |t| t.get_mut("gap").unwrap().value = 4.0);
    session.render_pass(&mut surface);

    session.save(1, &repo).unwrap();
    let saved = repo.read(&"c1.json".into()).unwrap();
    assert_eq!(saved.get("gap").unwrap().value, 3.0);
    assert!(!saved.has_shared_column());

    session.export_updated(1, &"c1_edited.json".into(), &repo).unwrap();
    assert_eq!(repo.read(&"c1_edited.json".into()).unwrap().get("gap").unwrap().value, 4.0);

    assert!(session.save(5, &repo).is_err());
}

/// Tenet: a single configuration has nothing to share with.
///
/// Its table has no `shared` column and an edit cannot introduce one.
#[test]
fn single_configuration_cannot_gain_shared_flag() {
    let repo = sans_repository();
    let mut session = OptimizationSession::default();
    session.select_configurations(&ids(&["sans_4m.json"]), &repo);

    let mut edited = session.view(0).unwrap().table;
    assert!(!edited.has_shared_column());
    edited.get_mut("wavelength").unwrap().shared = Some(true);

    let err = session.apply_edit(0, edited).unwrap_err();
    assert!(matches!(err, SessionError::SharedColumn { index: 0, ref name } if name == "wavelength"));
    assert!(err.is_edit_rejection());
    assert!(!session.configurations().get(0).unwrap().updated().has_shared_column());
    assert_eq!(session.summary().rows_for("wavelength").next().unwrap().config, "0");
}

/// Tenet: the reference of a multi-configuration set keeps its `shared`
/// column.
#[test]
fn reference_cannot_drop_shared_flag() {
    let (mut session, _repo, _surface) = gap_session();
    let mut edited = session.view(0).unwrap().table;
    edited.get_mut("gap").unwrap().shared = None;

    assert!(matches!(
        session.apply_edit(0, edited),
        Err(SessionError::SharedColumn { index: 0, .. })
    ));
    assert_eq!(session.configurations().get(0).unwrap().updated().get("gap").unwrap().shared, Some(false));
}
