//! Unit tests for the TOML-backed settings store.

use std::fs;

use tiersched::config::{SchedulerSettings, SettingsStore, TomlSettingsStore, WatchdogConfig};
use tiersched::AppError;

#[test]
fn save_then_load_round_trips_the_snapshot() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.toml");
    let store = TomlSettingsStore::new(&path);

    let settings = SchedulerSettings {
        auto_run_enabled: false,
        core_idle_delay_secs: 42,
        watchdog: WatchdogConfig {
            max_auto_resumes: 1,
            ..WatchdogConfig::default()
        },
        ..SchedulerSettings::default()
    };

    store.save(&settings).expect("save should succeed");
    let loaded = store.load().expect("load should succeed");
    assert_eq!(loaded, settings);
}

#[test]
fn saved_file_is_plain_toml() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.toml");
    let store = TomlSettingsStore::new(&path);

    store
        .save(&SchedulerSettings::default())
        .expect("save should succeed");

    let raw = fs::read_to_string(&path).expect("file exists");
    assert!(raw.contains("core_idle_delay_secs = 30"));
    assert!(raw.contains("[watchdog]"));
}

#[test]
fn loading_a_missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = TomlSettingsStore::new(dir.path().join("absent.toml"));
    let result = store.load();
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn loading_rejects_out_of_range_values() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, "core_idle_delay_secs = 2\n").expect("write");

    let store = TomlSettingsStore::new(&path);
    let result = store.load();
    assert!(
        matches!(result, Err(AppError::Config(ref msg)) if msg.contains("core_idle_delay_secs"))
    );
}

#[test]
fn store_exposes_its_backing_path() {
    let store = TomlSettingsStore::new("/tmp/tiersched.toml");
    assert_eq!(store.path(), std::path::Path::new("/tmp/tiersched.toml"));
}
