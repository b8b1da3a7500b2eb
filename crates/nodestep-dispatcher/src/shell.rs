//! Runs commands through a system shell.

use async_trait::async_trait;
use nodestep_plan::Command;
use tokio::process::Child;
use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::runner::{CommandRunner, RunContext};

/// Environment variable carrying the worker ordinal into every command.
pub const ORDINAL_ENV_VAR: &str = "NODESTEP_ORDINAL";

/// Exit status reported for a process that ended without one (killed by a
/// signal).
const NO_EXIT_CODE: i32 = -1;

/// Runs each command as `<shell> -c <command>` with inherited stdio.
///
/// On unix each command leads its own process group, so a timeout kills
/// every process the command started, not just the shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
  shell: String,
}

impl ShellRunner {
  pub fn new() -> Self {
    Self::with_shell("sh")
  }

  pub fn with_shell(shell: impl Into<String>) -> Self {
    Self {
      shell: shell.into(),
    }
  }

  pub fn shell(&self) -> &str {
    &self.shell
  }
}

impl Default for ShellRunner {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl CommandRunner for ShellRunner {
  async fn run(&self, command: &Command, ctx: &RunContext) -> Result<i32, RunnerError> {
    let mut cmd = tokio::process::Command::new(&self.shell);
    cmd
      .arg("-c")
      .arg(command.as_str())
      .envs(&ctx.env)
      .env(ORDINAL_ENV_VAR, ctx.ordinal.to_string())
      .kill_on_drop(true);

    if let Some(dir) = &ctx.working_dir {
      cmd.current_dir(dir);
    }

    #[cfg(unix)]
    cmd.process_group(0);

    debug!(shell = %self.shell, command = %command, "spawning");

    let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
      command: command.to_string(),
      source,
    })?;

    let status = match ctx.timeout {
      Some(limit) => {
        let waited = tokio::time::timeout(limit, child.wait()).await;
        match waited {
          Ok(status) => status,
          Err(_) => {
            warn!(command = %command, timeout = ?limit, "command timed out, killing");
            kill_group(&child);
            // Reaps the shell; errors only if it was already reaped.
            let _ = child.kill().await;
            return Err(RunnerError::Timeout {
              command: command.to_string(),
              timeout: limit,
            });
          }
        }
      }
      None => child.wait().await,
    }
    .map_err(|source| RunnerError::Wait {
      command: command.to_string(),
      source,
    })?;

    Ok(status.code().unwrap_or(NO_EXIT_CODE))
  }
}

/// SIGKILL the process group led by `child`.
#[cfg(unix)]
fn kill_group(child: &Child) {
  use nix::sys::signal::{Signal, killpg};
  use nix::unistd::Pid;

  let Some(pid) = child.id() else {
    return;
  };
  let Ok(pid) = i32::try_from(pid) else {
    return;
  };
  if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
    debug!(pgid = pid, error = %e, "killpg failed");
  }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}
