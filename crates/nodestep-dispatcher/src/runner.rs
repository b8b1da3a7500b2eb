//! The command execution seam.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use nodestep_plan::{Command, StepPlan, WorkerOrdinal};
use tokio::io::AsyncWriteExt;

use crate::error::RunnerError;

/// Everything a runner needs to know about where a command runs.
///
/// The dispatcher builds this from the plan so runners never read ambient
/// process state to learn the worker ordinal or working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
  pub ordinal: WorkerOrdinal,
  pub env: BTreeMap<String, String>,
  pub working_dir: Option<PathBuf>,
  pub timeout: Option<Duration>,
}

impl RunContext {
  pub fn new(ordinal: WorkerOrdinal, plan: &StepPlan) -> Self {
    Self {
      ordinal,
      env: plan.env.clone(),
      working_dir: plan.working_dir.clone(),
      timeout: plan.timeout,
    }
  }
}

/// Runs a single command and reports its exit status.
///
/// Zero means success. Any other value, including a negative one for a
/// process that ended without a code, is a failure.
#[async_trait]
pub trait CommandRunner: Send + Sync {
  async fn run(&self, command: &Command, ctx: &RunContext) -> Result<i32, RunnerError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
  async fn run(&self, command: &Command, ctx: &RunContext) -> Result<i32, RunnerError> {
    (**self).run(command, ctx).await
  }
}

/// Where [`DryRunner`] lists commands.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DryRunOutput {
  #[default]
  Stdout,
  Stderr,
}

/// Lists each command instead of running it. Every command "succeeds", so
/// the whole sequence is listed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunner {
  output: DryRunOutput,
}

impl DryRunner {
  pub fn new(output: DryRunOutput) -> Self {
    Self { output }
  }

  pub fn output(&self) -> DryRunOutput {
    self.output
  }
}

#[async_trait]
impl CommandRunner for DryRunner {
  async fn run(&self, command: &Command, ctx: &RunContext) -> Result<i32, RunnerError> {
    let line = format!("[{}] + {}\n", ctx.ordinal, command);
    let written = match self.output {
      DryRunOutput::Stdout => tokio::io::stdout().write_all(line.as_bytes()).await,
      DryRunOutput::Stderr => tokio::io::stderr().write_all(line.as_bytes()).await,
    };
    written.map_err(|source| RunnerError::Wait {
      command: command.to_string(),
      source,
    })?;
    Ok(0)
  }
}
