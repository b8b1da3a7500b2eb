use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::format::PlanFormat;

/// A step plan as written in a plan file.
///
/// `nodes` maps a worker ordinal to the commands that worker runs, in order.
/// Ordinal keys may be integers (`0:` in YAML) or integer strings (`"0"` in
/// JSON or YAML); anything else fails to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDef {
  /// Human readable plan name, used in logs only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  /// Number of parallel workers the plan is written for.
  /// When set, every ordinal in `0..node_total` must have an entry.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_total: Option<u32>,

  /// Environment variables exported to every command.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,

  /// Working directory for every command. Relative paths are resolved
  /// against the directory the dispatcher was started in.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub working_dir: Option<PathBuf>,

  /// Per-command timeout in milliseconds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,

  #[serde(deserialize_with = "deserialize_nodes")]
  pub nodes: BTreeMap<u32, Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrdinalKey {
  Int(u32),
  Str(String),
}

impl OrdinalKey {
  fn into_ordinal<E: de::Error>(self) -> Result<u32, E> {
    match self {
      OrdinalKey::Int(ordinal) => Ok(ordinal),
      OrdinalKey::Str(raw) => raw
        .trim()
        .parse()
        .map_err(|_| E::custom(format!("invalid worker ordinal '{}'", raw))),
    }
  }
}

fn deserialize_nodes<'de, D>(deserializer: D) -> Result<BTreeMap<u32, Vec<String>>, D::Error>
where
  D: Deserializer<'de>,
{
  struct NodesVisitor;

  impl<'de> Visitor<'de> for NodesVisitor {
    type Value = BTreeMap<u32, Vec<String>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str("a map from worker ordinal to a list of commands")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
      A: MapAccess<'de>,
    {
      let mut nodes = BTreeMap::new();
      while let Some((key, commands)) = map.next_entry::<OrdinalKey, Vec<String>>()? {
        let ordinal = key.into_ordinal::<A::Error>()?;
        if nodes.insert(ordinal, commands).is_some() {
          return Err(de::Error::custom(format!(
            "worker ordinal {} listed more than once",
            ordinal
          )));
        }
      }
      Ok(nodes)
    }
  }

  deserializer.deserialize_map(NodesVisitor)
}

impl PlanDef {
  pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(input)?)
  }

  pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
    Ok(serde_yaml::from_str(input)?)
  }

  /// Parse plan text in the given format.
  pub fn parse(input: &str, format: PlanFormat) -> Result<Self, ConfigError> {
    match format {
      PlanFormat::Json => Self::from_json_str(input),
      PlanFormat::Yaml => Self::from_yaml_str(input),
    }
  }

  /// Read and parse a plan file, picking the format from its extension.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, PlanFormat::from_path(path))
  }
}
