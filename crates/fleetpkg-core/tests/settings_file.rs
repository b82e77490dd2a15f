//! Settings file loading tests.

use fleetpkg_core::config::Settings;
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings::load(&temp.path().join("fleetpkg.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("fleetpkg.toml");
    std::fs::write(
        &path,
        r#"
broker_command = "/opt/puppetlabs/bin/mco"
operator = "deploy"
verify_timeout_secs = 300
"#,
    )
    .expect("Failed to write settings");

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.broker_command, "/opt/puppetlabs/bin/mco");
    assert_eq!(settings.operator, "deploy");
    assert_eq!(settings.verify_timeout_secs, 300);
    assert_eq!(settings.poll_interval_secs, 5);
}

#[test]
fn malformed_file_reports_its_path() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("fleetpkg.toml");
    std::fs::write(&path, "operator = [").expect("Failed to write settings");

    let err = Settings::load(&path).unwrap_err();
    assert!(
        format!("{err:#}").contains("fleetpkg.toml"),
        "unexpected error: {err:#}"
    );
}
