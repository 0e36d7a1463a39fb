use daybook_core::ExitCode;
use daybook_fs::{
    DEFAULT_PROFILE, DEFAULT_QUEUE_SLOT, ProfileConfig, init_workspace, load_config,
    resolve_profile, resolve_workspace, run_doctor, save_config, set_active_profile,
};

#[test]
fn init_workspace_creates_expected_layout() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("ws");

    let result = init_workspace(Some(&root)).expect("init workspace");

    assert!(result.paths.root.is_dir());
    assert!(result.paths.daybook_dir.is_dir());
    assert!(result.paths.logs_dir.is_dir());
    assert!(result.paths.config_path.is_file());

    let config = load_config(&result.paths).expect("load config");
    assert_eq!(config.active_profile, DEFAULT_PROFILE);
    assert_eq!(
        config
            .profiles
            .get(DEFAULT_PROFILE)
            .map(|p| p.queue_slot.as_str()),
        Some(DEFAULT_QUEUE_SLOT)
    );
}

#[test]
fn resolve_workspace_fails_when_uninitialized() {
    let temp = tempfile::tempdir().expect("tempdir");

    let error =
        resolve_workspace(Some(temp.path())).expect_err("workspace should not be initialized");

    assert_eq!(error.exit_code(), ExitCode::Usage);
}

#[test]
fn profile_mutation_round_trip() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("ws");

    let result = init_workspace(Some(&root)).expect("init workspace");
    let mut config = load_config(&result.paths).expect("load config");

    config.profiles.insert(
        "work".to_string(),
        ProfileConfig {
            queue_slot: "offline_sync_queue_work".to_string(),
        },
    );
    set_active_profile(&mut config, "work").expect("set active profile");
    save_config(&result.paths, &config).expect("save config");

    let saved = load_config(&result.paths).expect("reload config");
    assert_eq!(saved.active_profile, "work");

    let resolved = resolve_profile(&saved, None).expect("resolve profile");
    assert_eq!(resolved.queue_slot, "offline_sync_queue_work");

    let explicit = resolve_profile(&saved, Some(DEFAULT_PROFILE)).expect("resolve default");
    assert_eq!(explicit.queue_slot, DEFAULT_QUEUE_SLOT);
}

#[test]
fn doctor_reports_healthy_workspace() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("ws");

    let result = init_workspace(Some(&root)).expect("init workspace");
    let report = run_doctor(&result.paths, None).expect("run doctor");

    assert!(report.healthy);
    assert_eq!(report.active_profile.as_deref(), Some(DEFAULT_PROFILE));
    assert_eq!(report.queue_slot.as_deref(), Some(DEFAULT_QUEUE_SLOT));
}

#[test]
fn doctor_flags_unknown_profile() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("ws");

    let result = init_workspace(Some(&root)).expect("init workspace");
    let report = run_doctor(&result.paths, Some("missing")).expect("run doctor");

    assert!(!report.healthy);
    assert!(report.active_profile.is_none());
}
