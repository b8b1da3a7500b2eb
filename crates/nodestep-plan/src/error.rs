use thiserror::Error;

use crate::ordinal::WorkerOrdinal;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
  #[error("invalid worker ordinal '{0}': expected a non-negative integer")]
  InvalidOrdinal(String),

  #[error("empty command at position {index} for worker {ordinal}")]
  EmptyCommand { ordinal: WorkerOrdinal, index: usize },

  #[error("no steps defined for worker {ordinal} (plan declares {node_total} workers)")]
  MissingOrdinal {
    ordinal: WorkerOrdinal,
    node_total: u32,
  },

  #[error("worker {ordinal} is outside the declared {node_total} workers")]
  OrdinalOutOfRange {
    ordinal: WorkerOrdinal,
    node_total: u32,
  },
}
