//! Loading plan files from disk.

use std::io::Write;

use nodestep_config::{ConfigError, PlanDef};

fn write_plan(suffix: &str, content: &str) -> tempfile::NamedTempFile {
  let mut file = tempfile::Builder::new()
    .suffix(suffix)
    .tempfile()
    .expect("failed to create temp file");
  file
    .write_all(content.as_bytes())
    .expect("failed to write plan");
  file
}

#[test]
fn test_load_json_plan() {
  let file = write_plan(".json", r#"{"nodes": {"0": ["install"]}}"#);

  let def = PlanDef::from_path(file.path()).unwrap();

  assert_eq!(def.nodes[&0], vec!["install".to_string()]);
}

#[test]
fn test_load_yaml_plan() {
  let file = write_plan(".yml", "nodes:\n  0: [install, test]\n");

  let def = PlanDef::from_path(file.path()).unwrap();

  assert_eq!(def.nodes[&0].len(), 2);
}

#[test]
fn test_load_missing_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("missing.json");

  let err = PlanDef::from_path(&path).unwrap_err();

  match err {
    ConfigError::Read { path: reported, .. } => assert_eq!(reported, path),
    other => panic!("expected read error, got {:?}", other),
  }
}

#[test]
fn test_yaml_content_in_json_file_fails() {
  let file = write_plan(".json", "nodes:\n  0: [install]\n");

  assert!(matches!(
    PlanDef::from_path(file.path()),
    Err(ConfigError::Json(_))
  ));
}
