use std::path::Path;

/// On-disk encoding of a plan file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
  Json,
  Yaml,
}

impl PlanFormat {
  /// Pick the format from a file extension. `.yaml` and `.yml` are YAML,
  /// everything else is treated as JSON.
  pub fn from_path(path: &Path) -> Self {
    match path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| ext.to_ascii_lowercase())
      .as_deref()
    {
      Some("yaml") | Some("yml") => PlanFormat::Yaml,
      _ => PlanFormat::Json,
    }
  }
}
