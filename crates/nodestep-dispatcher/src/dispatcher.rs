//! Dispatcher implementation.

use nodestep_plan::{StepPlan, WorkerOrdinal};
use tracing::{debug, error, info, instrument};

use crate::error::DispatchError;
use crate::result::{ExecutionResult, StepOutcome};
use crate::runner::{CommandRunner, RunContext};
use crate::state::{DispatchState, InvalidTransition, Transition};

/// Resolves a worker's command sequence and runs it fail-fast.
///
/// The dispatcher holds no state between calls; dispatching the same ordinal
/// twice against the same plan repeats the same work.
pub struct Dispatcher<R> {
  runner: R,
}

impl<R: CommandRunner> Dispatcher<R> {
  pub fn new(runner: R) -> Self {
    Self { runner }
  }

  pub fn runner(&self) -> &R {
    &self.runner
  }

  /// Run the steps assigned to `ordinal`.
  ///
  /// Returns [`DispatchError::UnknownOrdinal`] without running anything if the
  /// plan has no entry for `ordinal`. A step with a non-zero exit status ends
  /// the sequence and yields an unsuccessful [`ExecutionResult`]; use
  /// [`ExecutionResult::into_result`] to treat that as an error.
  #[instrument(
    name = "dispatch",
    skip(self, ordinal, plan),
    fields(
      ordinal = %ordinal,
      plan = plan.name.as_deref().unwrap_or("unnamed"),
    )
  )]
  pub async fn dispatch(
    &self,
    ordinal: WorkerOrdinal,
    plan: &StepPlan,
  ) -> Result<ExecutionResult, DispatchError> {
    let state = advance(DispatchState::Idle, Transition::Resolve)?;

    let Some(commands) = plan.get(ordinal) else {
      advance(state, Transition::Abort)?;
      let known: Vec<WorkerOrdinal> = plan.ordinals().collect();
      error!(known = ?known, "dispatch_failed: unknown ordinal");
      return Err(DispatchError::UnknownOrdinal { ordinal, known });
    };

    info!(steps = commands.len(), "dispatch_started");

    let ctx = RunContext::new(ordinal, plan);
    let mut state = advance(state, Transition::Resolved {
      steps: commands.len(),
    })?;
    let mut steps = Vec::with_capacity(commands.len());
    let mut failure = None;

    while let DispatchState::Executing(index) = state {
      let command = &commands[index];
      info!(index, command = %command, "step_started");

      let exit_code = match self.runner.run(command, &ctx).await {
        Ok(exit_code) => exit_code,
        Err(source) => {
          advance(state, Transition::Abort)?;
          error!(
            index,
            command = %command,
            error = &source as &(dyn std::error::Error + 'static),
            "step_failed"
          );
          return Err(DispatchError::Runner {
            ordinal,
            index,
            source,
          });
        }
      };

      let outcome = StepOutcome {
        index,
        command: command.clone(),
        exit_code,
      };

      if exit_code == 0 {
        info!(index, command = %command, "step_completed");
      } else {
        error!(index, command = %command, exit_code, "step_failed");
        failure = Some(outcome.clone());
      }
      steps.push(outcome);

      state = advance(state, Transition::StepExited {
        exit_code,
        steps: commands.len(),
      })?;
    }

    let result = ExecutionResult {
      ordinal,
      success: state == DispatchState::Succeeded,
      state,
      exit_code: steps.last().map_or(0, |step| step.exit_code),
      steps,
      failure,
    };

    if result.success {
      info!(executed = result.steps.len(), "dispatch_completed");
    } else {
      error!(
        executed = result.steps.len(),
        exit_code = result.exit_code,
        "dispatch_failed"
      );
    }

    Ok(result)
  }
}

fn advance(from: DispatchState, transition: Transition) -> Result<DispatchState, InvalidTransition> {
  let to = from.advance(transition)?;
  debug!(from = ?from, to = ?to, "state_transition");
  Ok(to)
}
