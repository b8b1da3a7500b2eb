use std::fmt;

use serde::Serialize;

/// One opaque step in a worker's sequence.
///
/// The string is handed to the command runner untouched; it is never split or
/// interpreted here. Construction goes through [`StepPlan`](crate::StepPlan)
/// validation, which rejects blank commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
  pub(crate) fn parse(raw: String) -> Option<Self> {
    if raw.trim().is_empty() {
      None
    } else {
      Some(Self(raw))
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Command {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Command {
  fn as_ref(&self) -> &str {
    &self.0
  }
}
