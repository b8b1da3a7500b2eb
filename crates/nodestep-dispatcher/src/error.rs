//! Dispatch errors.

use std::time::Duration;

use nodestep_plan::{Command, WorkerOrdinal};
use thiserror::Error;

use crate::state::InvalidTransition;

/// Errors that can occur while dispatching a worker's steps.
#[derive(Debug, Error)]
pub enum DispatchError {
  /// The plan has no entry for this worker. Nothing was executed.
  #[error("no steps defined for worker {ordinal} (known workers: {})", list_ordinals(.known))]
  UnknownOrdinal {
    ordinal: WorkerOrdinal,
    known: Vec<WorkerOrdinal>,
  },

  /// A step exited with a non-zero status. Later steps were skipped.
  #[error("worker {ordinal}: step {index} `{command}` exited with status {exit_code}")]
  CommandFailure {
    ordinal: WorkerOrdinal,
    index: usize,
    command: Command,
    exit_code: i32,
  },

  /// The runner could not produce an exit status for a step.
  #[error("worker {ordinal}: step {index} could not be run")]
  Runner {
    ordinal: WorkerOrdinal,
    index: usize,
    #[source]
    source: RunnerError,
  },

  #[error(transparent)]
  State(#[from] InvalidTransition),
}

/// Errors raised by a [`CommandRunner`](crate::CommandRunner).
#[derive(Debug, Error)]
pub enum RunnerError {
  #[error("failed to start `{command}`")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed waiting for `{command}`")]
  Wait {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("`{command}` timed out after {timeout:?}")]
  Timeout { command: String, timeout: Duration },
}

fn list_ordinals(ordinals: &[WorkerOrdinal]) -> String {
  if ordinals.is_empty() {
    return "none".to_string();
  }
  ordinals
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}
