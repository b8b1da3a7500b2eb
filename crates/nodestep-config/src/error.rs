use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read plan file {path}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse JSON plan")]
  Json(#[from] serde_json::Error),

  #[error("failed to parse YAML plan")]
  Yaml(#[from] serde_yaml::Error),
}
