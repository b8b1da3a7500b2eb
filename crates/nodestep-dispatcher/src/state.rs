//! Dispatch lifecycle.
//!
//! ```text
//! Idle -> Resolving -> Executing(0) -> Executing(1) -> ... -> Succeeded
//!             |              |
//!             +--------------+-----------------------------> Failed
//! ```

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
  Idle,
  Resolving,
  /// Running the step at this index.
  Executing(usize),
  Failed,
  Succeeded,
}

/// Inputs that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  /// Start looking up the worker's sequence.
  Resolve,
  /// The sequence was found and holds `steps` commands.
  Resolved { steps: usize },
  /// The current step exited. `steps` is the sequence length.
  StepExited { exit_code: i32, steps: usize },
  /// Resolution or execution could not continue.
  Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid dispatch transition {transition:?} from state {from:?}")]
pub struct InvalidTransition {
  pub from: DispatchState,
  pub transition: Transition,
}

impl DispatchState {
  pub fn is_terminal(self) -> bool {
    matches!(self, DispatchState::Failed | DispatchState::Succeeded)
  }

  pub fn advance(self, transition: Transition) -> Result<Self, InvalidTransition> {
    let next = match (self, transition) {
      (DispatchState::Idle, Transition::Resolve) => DispatchState::Resolving,
      (DispatchState::Resolving, Transition::Resolved { steps: 0 }) => DispatchState::Succeeded,
      (DispatchState::Resolving, Transition::Resolved { .. }) => DispatchState::Executing(0),
      (DispatchState::Executing(_), Transition::StepExited { exit_code, .. }) if exit_code != 0 => {
        DispatchState::Failed
      }
      (DispatchState::Executing(index), Transition::StepExited { steps, .. }) => {
        if index + 1 < steps {
          DispatchState::Executing(index + 1)
        } else {
          DispatchState::Succeeded
        }
      }
      (DispatchState::Resolving | DispatchState::Executing(_), Transition::Abort) => {
        DispatchState::Failed
      }
      (from, transition) => return Err(InvalidTransition { from, transition }),
    };
    Ok(next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(transitions: &[Transition]) -> Result<DispatchState, InvalidTransition> {
    transitions
      .iter()
      .try_fold(DispatchState::Idle, |state, t| state.advance(*t))
  }

  #[test]
  fn test_successful_sequence() {
    let state = run(&[
      Transition::Resolve,
      Transition::Resolved { steps: 2 },
      Transition::StepExited {
        exit_code: 0,
        steps: 2,
      },
    ])
    .unwrap();
    assert_eq!(state, DispatchState::Executing(1));

    let state = state
      .advance(Transition::StepExited {
        exit_code: 0,
        steps: 2,
      })
      .unwrap();
    assert_eq!(state, DispatchState::Succeeded);
    assert!(state.is_terminal());
  }

  #[test]
  fn test_empty_sequence_succeeds_immediately() {
    let state = run(&[Transition::Resolve, Transition::Resolved { steps: 0 }]).unwrap();
    assert_eq!(state, DispatchState::Succeeded);
  }

  #[test]
  fn test_non_zero_exit_fails() {
    let state = run(&[
      Transition::Resolve,
      Transition::Resolved { steps: 3 },
      Transition::StepExited {
        exit_code: 2,
        steps: 3,
      },
    ])
    .unwrap();
    assert_eq!(state, DispatchState::Failed);
  }

  #[test]
  fn test_abort_while_resolving() {
    let state = run(&[Transition::Resolve, Transition::Abort]).unwrap();
    assert_eq!(state, DispatchState::Failed);
  }

  #[test]
  fn test_illegal_transitions() {
    assert!(DispatchState::Idle
      .advance(Transition::Resolved { steps: 1 })
      .is_err());
    assert!(DispatchState::Idle.advance(Transition::Abort).is_err());
    assert!(DispatchState::Succeeded.advance(Transition::Resolve).is_err());

    let err = DispatchState::Failed
      .advance(Transition::StepExited {
        exit_code: 0,
        steps: 1,
      })
      .unwrap_err();
    assert_eq!(err.from, DispatchState::Failed);
  }
}
