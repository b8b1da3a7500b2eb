//! Dispatch results.

use nodestep_plan::{Command, WorkerOrdinal};
use serde::Serialize;

use crate::error::DispatchError;
use crate::state::DispatchState;

/// Exit status of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
  /// Position of the step in the worker's sequence.
  pub index: usize,
  pub command: Command,
  pub exit_code: i32,
}

/// Outcome of dispatching one worker's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
  pub ordinal: WorkerOrdinal,
  /// True only if every step exited with status zero.
  pub success: bool,
  /// Terminal lifecycle state, `Succeeded` or `Failed`.
  pub state: DispatchState,
  /// Exit status of the last executed step (the failing one on failure).
  /// Zero for an empty sequence.
  pub exit_code: i32,
  /// Executed steps, in order. Skipped steps are absent.
  pub steps: Vec<StepOutcome>,
  /// The step that stopped the sequence.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub failure: Option<StepOutcome>,
}

impl ExecutionResult {
  pub fn failed_command(&self) -> Option<&Command> {
    self.failure.as_ref().map(|step| &step.command)
  }

  /// Turn a failed result into [`DispatchError::CommandFailure`].
  pub fn into_result(self) -> Result<Self, DispatchError> {
    if let Some(step) = &self.failure {
      return Err(DispatchError::CommandFailure {
        ordinal: self.ordinal,
        index: step.index,
        command: step.command.clone(),
        exit_code: step.exit_code,
      });
    }
    Ok(self)
  }
}
