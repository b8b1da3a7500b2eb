use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Index of one parallel worker, as handed out by the CI orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerOrdinal(u32);

impl WorkerOrdinal {
  pub const fn new(value: u32) -> Self {
    Self(value)
  }

  pub const fn get(self) -> u32 {
    self.0
  }
}

impl From<u32> for WorkerOrdinal {
  fn from(value: u32) -> Self {
    Self(value)
  }
}

impl FromStr for WorkerOrdinal {
  type Err = PlanError;

  /// Parses values such as `"0"` or `" 1\n"` read from the environment.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.trim()
      .parse::<u32>()
      .map(Self)
      .map_err(|_| PlanError::InvalidOrdinal(s.to_string()))
  }
}

impl fmt::Display for WorkerOrdinal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}
