//! Node step dispatch for nodestep.
//!
//! This crate provides the [`Dispatcher`] which:
//! - Resolves the command sequence assigned to a worker ordinal
//! - Runs the sequence strictly in order through a [`CommandRunner`]
//! - Stops at the first non-zero exit status
//! - Reports the outcome as an [`ExecutionResult`]
//!
//! [`ShellRunner`] is the process-spawning runner used in production;
//! [`DryRunner`] lists commands without running them.

mod dispatcher;
mod error;
mod result;
mod runner;
mod shell;
mod state;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, RunnerError};
pub use result::{ExecutionResult, StepOutcome};
pub use runner::{CommandRunner, DryRunOutput, DryRunner, RunContext};
pub use shell::{ORDINAL_ENV_VAR, ShellRunner};
pub use state::{DispatchState, InvalidTransition, Transition};
