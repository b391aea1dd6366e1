use super::*;
use tempfile::TempDir;

fn local_overrides(project: &str) -> ConfigOverrides {
    ConfigOverrides {
        project: Some(project.to_string()),
        backend: Some(BackendKind::Local),
        ..ConfigOverrides::default()
    }
}

#[test]
fn defaults_need_a_project() {
    let err = validate_config(&default_config()).expect_err("no project");
    assert!(err.to_string().contains("project is required"));
}

#[test]
fn cli_overrides_fill_in_defaults() {
    let config = resolve_config(None, &local_overrides("demo-project")).expect("config");
    assert_eq!(config.project_id(), "demo-project");
    assert_eq!(config.location, DEFAULT_LOCATION);
    assert_eq!(config.backend, BackendKind::Local);
    assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
}

#[test]
fn file_values_are_overridden_by_flags() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("dcflow.json");
    fs::write(
        &path,
        r#"{
  "schema_version": 1,
  "project": "from-file",
  "location": "europe-west1",
  "backend": "local",
  "state_path": "state.json"
}"#,
    )
    .expect("write config");

    let from_file = resolve_config(Some(&path), &ConfigOverrides::default()).expect("config");
    assert_eq!(from_file.project_id(), "from-file");
    assert_eq!(from_file.location, "europe-west1");
    assert_eq!(from_file.state_path, Some(PathBuf::from("state.json")));

    let overridden = resolve_config(
        Some(&path),
        &ConfigOverrides {
            project: Some("from-flag".to_string()),
            ..ConfigOverrides::default()
        },
    )
    .expect("config");
    assert_eq!(overridden.project_id(), "from-flag");
    assert_eq!(overridden.location, "europe-west1");
}

#[test]
fn rejects_unknown_schema_version_and_fields() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("dcflow.json");
    fs::write(&path, r#"{"schema_version": 2, "project": "p"}"#).expect("write");
    let err = resolve_config(Some(&path), &ConfigOverrides::default()).expect_err("version");
    assert!(err.to_string().contains("schema_version 2"));

    fs::write(&path, r#"{"schema_version": 1, "projet": "p"}"#).expect("write");
    assert!(load_config(&path).is_err());
}

#[test]
fn rest_backend_requires_token_file_and_http_endpoint() {
    let mut config = default_config();
    config.project = Some("p".to_string());
    let err = validate_config(&config).expect_err("token file missing");
    assert!(err.to_string().contains("access_token_file"));

    config.access_token_file = Some(PathBuf::from("token"));
    validate_config(&config).expect("valid rest config");

    config.endpoint = "datacatalog.googleapis.com".to_string();
    assert!(validate_config(&config).is_err());
}

#[test]
fn rejects_unaddressable_project_and_zero_timeout() {
    let mut config = resolve_config(None, &local_overrides("p")).expect("config");
    config.project = Some("bad/project".to_string());
    assert!(validate_config(&config).is_err());

    config.project = Some("p".to_string());
    config.timeout_secs = 0;
    assert!(validate_config(&config).is_err());
}

#[test]
fn access_token_is_trimmed_and_must_be_present() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("token");
    fs::write(&path, "  ya29.token-value\n").expect("write token");
    assert_eq!(read_access_token(&path).expect("token"), "ya29.token-value");

    fs::write(&path, "\n").expect("write empty token");
    assert!(read_access_token(&path).is_err());
    assert!(read_access_token(&dir.path().join("missing")).is_err());
}
