//! End-to-end setup workflow against a configuration directory on disk.
//!
//! A session is configured from a TOML file, reads its configurations from a
//! JSON directory, selects a model from a fake fitting engine and produces
//! a summary and exported configurations.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sasopt_core::{Fitter, OptimizationSession, SessionConfig};
use sasopt_store::{ConfigurationRepository, JsonDirectoryRepository};
use sasopt_test_utils::{configuration_table, ids, repository_with, sans_configuration, FakeModel, ScriptedSurface};
use tempfile::TempDir;

fn configured_session(dir: &TempDir) -> (OptimizationSession, JsonDirectoryRepository) {
    let config_path = dir.path().join("session.toml");
    let user_dir = dir.path().join("configurations");
    std::fs::create_dir(&user_dir).unwrap();
    std::fs::write(
        &config_path,
        format!(
            "configuration_step_opt = 0.5\nuser_dir = {:?}\n\n[run]\nfitter = \"dream\"\n",
            user_dir.display().to_string()
        ),
    )
    .unwrap();

    let config = SessionConfig::load(&config_path).unwrap();
    let repo = config.repository().unwrap();
    // Minimal records as shipped by the instrument; optimization fields are
    // filled in on read
    for distance in [1.0, 4.0, 12.0] {
        let records: Vec<_> = sans_configuration(distance)
            .iter()
            .map(|s| serde_json::json!({ "setting": s.name, "value": s.value }))
            .collect();
        let path = user_dir.join(format!("sans_{distance}m.json"));
        std::fs::write(path, serde_json::to_vec(&records).unwrap()).unwrap();
    }
    (OptimizationSession::new(config), repo)
}

/// Tenet: a full setup round trip through files.
#[test]
fn setup_round_trip() {
    let dir = TempDir::new().unwrap();
    let (mut session, repo) = configured_session(&dir);
    assert_eq!(session.run_settings().fitter, Fitter::Dream);
    assert_eq!(
        repo.list().unwrap(),
        ids(&["sans_12m.json", "sans_1m.json", "sans_4m.json"])
    );

    assert!(session.select_model("core_shell_sphere", &FakeModel::core_shell_sphere()).unwrap());
    session.assign_background(0, Some("background_h2o"), None).unwrap();
    session.assign_background(1, None, Some("background_d2o")).unwrap();

    let outcome = session.select_configurations(&ids(&["sans_12m.json", "sans_4m.json"]), &repo);
    assert!(outcome.failed.is_empty());
    // Defaults injected on read come from the session configuration
    let time = session.configurations().get(0).unwrap().updated().get("counting_time").unwrap();
    assert_eq!(time.step_opt, 0.5);

    let mut surface = ScriptedSurface::new();
    surface.user_edit(0, |t| {
        let wavelength = t.get_mut("wavelength").unwrap();
        wavelength.shared = Some(true);
        wavelength.optimize = true;
        wavelength.lower_opt = 4.5;
        wavelength.upper_opt = 12.0;
    });
    let report = session.render_pass(&mut surface);
    assert_eq!(report.refreshed, vec![1]);

    let summary = session.summary();
    let source = summary.rows_for("background_h2o").next().unwrap();
    assert_eq!((source.dataset.as_str(), source.config.as_str()), ("0", "*"));
    let sink = summary.rows_for("background_d2o").next().unwrap();
    assert_eq!(sink.dataset, "b1");
    let json = summary.to_json().unwrap();
    assert!(json.contains("\"config.\": \"*\""));

    session
        .export_updated(1, &"sans_4m_shared.json".into(), &repo)
        .unwrap();
    let exported = repo.read(&"sans_4m_shared.json".into()).unwrap();
    let wavelength = exported.get("wavelength").unwrap();
    assert!(wavelength.optimize);
    assert_eq!((wavelength.lower_opt, wavelength.upper_opt), (4.5, 12.0));
    assert!(!exported.has_shared_column());
}

/// Tenet: a missing configuration file is reported, not fatal.
#[test]
fn missing_file_is_excluded() {
    let dir = TempDir::new().unwrap();
    let (mut session, repo) = configured_session(&dir);

    let outcome = session.select_configurations(&ids(&["sans_4m.json", "sans_30m.json"]), &repo);
    assert!(outcome.has_failures());
    assert_eq!(session.configurations().len(), 1);
    assert!(!session.configurations().is_multi());
}

/// Tenet: identifiers cannot leave the configuration directory.
#[test]
fn path_escape_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (mut session, repo) = configured_session(&dir);
    assert!(repo.read(&"../session.toml".into()).is_err());

    session.select_configurations(&ids(&["sans_4m.json"]), &repo);
    assert!(session
        .export_updated(0, &"../escaped.json".into(), &repo)
        .is_err());
    assert!(!dir.path().join("escaped.json").exists());
}

proptest! {
    /// Tenet: whatever the reference shares, a second pass with no user
    /// input is quiet and issues no token.
    #[test]
    fn settled_session_stays_quiet(
        gap in 0.5f64..20.0,
        time in 60.0f64..7200.0,
        share_gap in any::<bool>(),
    ) {
        let table = |gap: f64| configuration_table(&[("gap", gap), ("time", 600.0)]);
        let repo = repository_with(vec![("c0.json", table(5.0)), ("c1.json", table(3.0)), ("c2.json", table(1.0))]);
        let mut session = OptimizationSession::default();
        session.select_configurations(&ids(&["c0.json", "c1.json", "c2.json"]), &repo);

        let mut surface = ScriptedSurface::new();
        surface.user_edit(0, move |t| {
            let setting = t.get_mut("gap").unwrap();
            setting.value = gap;
            setting.shared = Some(share_gap);
        });
        surface.user_edit(1, move |t| t.get_mut("time").unwrap().value = time);
        let first = session.render_pass(&mut surface);
        prop_assert!(first.rejected.is_empty());

        let issued = session.tokens_issued();
        let report = session.render_pass(&mut surface);
        prop_assert!(report.is_quiet());
        prop_assert_eq!(session.tokens_issued(), issued);

        let set = session.configurations();
        prop_assert_eq!(set.get(1).unwrap().updated().get("time").unwrap().value, time);
        for (generations, default_gap) in set.iter().skip(1).zip([3.0, 1.0]) {
            let expected = if share_gap { gap } else { default_gap };
            prop_assert_eq!(generations.updated().get("gap").unwrap().value, expected);
        }
    }
}
