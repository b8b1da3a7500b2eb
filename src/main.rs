use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nodestep_config::PlanDef;
use nodestep_dispatcher::{
  CommandRunner, Dispatcher, DryRunOutput, DryRunner, ExecutionResult, ShellRunner,
};
use nodestep_plan::{StepPlan, WorkerOrdinal};

/// Exit code for problems that stop dispatch before any step runs, or a step
/// that could not be launched at all.
const EXIT_DISPATCH_ERROR: u8 = 2;

/// nodestep - run the steps assigned to one parallel CI worker
#[derive(Parser)]
#[command(name = "nodestep")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log filter used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "info")]
  log_level: String,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the steps assigned to this worker
  Run {
    /// Path to the plan file (JSON or YAML)
    plan_file: PathBuf,

    #[command(flatten)]
    ordinal: OrdinalArgs,

    /// Print the commands instead of running them (to stderr with --json)
    #[arg(long)]
    dry_run: bool,

    /// Print the execution result as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Shell used to run each command
    #[arg(long, default_value = "sh")]
    shell: String,
  },

  /// Validate a plan file
  Check {
    /// Path to the plan file (JSON or YAML)
    plan_file: PathBuf,

    /// Require entries for workers 0..NODES
    #[arg(long)]
    nodes: Option<u32>,
  },

  /// Print the plan, or the steps of one worker
  Show {
    /// Path to the plan file (JSON or YAML)
    plan_file: PathBuf,

    /// Only show this worker
    #[arg(long)]
    ordinal: Option<u32>,
  },
}

#[derive(Args)]
struct OrdinalArgs {
  /// Worker ordinal; overrides the environment variable
  #[arg(long)]
  ordinal: Option<u32>,

  /// Environment variable holding the worker ordinal
  #[arg(long, default_value = "CIRCLE_NODE_INDEX")]
  ordinal_env: String,
}

impl OrdinalArgs {
  fn resolve(&self) -> Result<WorkerOrdinal> {
    if let Some(ordinal) = self.ordinal {
      return Ok(WorkerOrdinal::new(ordinal));
    }

    let raw = std::env::var(&self.ordinal_env).with_context(|| {
      format!(
        "worker ordinal not given: set {} or pass --ordinal",
        self.ordinal_env
      )
    })?;

    raw
      .parse()
      .with_context(|| format!("invalid value in {}", self.ordinal_env))
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(&cli.log_level);

  match run(cli) {
    Ok(code) => code,
    Err(e) => {
      eprintln!("error: {:#}", e);
      ExitCode::from(EXIT_DISPATCH_ERROR)
    }
  }
}

fn init_tracing(fallback_level: &str) {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(fallback_level))
    .unwrap_or_else(|_| EnvFilter::new("info"));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
  match cli.command {
    Commands::Run {
      plan_file,
      ordinal,
      dry_run,
      json,
      shell,
    } => {
      let plan = load_plan(&plan_file)?;
      let ordinal = ordinal.resolve()?;

      let result = if dry_run {
        dispatch(dry_runner(json), ordinal, &plan)?
      } else {
        dispatch(ShellRunner::with_shell(shell), ordinal, &plan)?
      };

      if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
      }

      let code = exit_code(&result);
      if let Err(e) = result.into_result() {
        eprintln!("error: {}", e);
      }
      Ok(ExitCode::from(code))
    }
    Commands::Check { plan_file, nodes } => {
      let plan = load_plan(&plan_file)?;
      if let Some(nodes) = nodes {
        plan
          .check_coverage(nodes)
          .with_context(|| format!("plan does not match {} workers", nodes))?;
      }
      eprintln!(
        "Plan OK: {} worker(s), {} command(s)",
        plan.len(),
        plan.iter().map(|(_, commands)| commands.len()).sum::<usize>()
      );
      Ok(ExitCode::SUCCESS)
    }
    Commands::Show { plan_file, ordinal } => {
      let plan = load_plan(&plan_file)?;
      match ordinal.map(WorkerOrdinal::new) {
        Some(ordinal) => match plan.get(ordinal) {
          Some(commands) => print_steps(ordinal, commands),
          None => bail!("no steps defined for worker {}", ordinal),
        },
        None => {
          for (ordinal, commands) in plan.iter() {
            print_steps(ordinal, commands);
          }
        }
      }
      Ok(ExitCode::SUCCESS)
    }
  }
}

fn load_plan(path: &Path) -> Result<StepPlan> {
  let def = PlanDef::from_path(path)
    .with_context(|| format!("failed to load plan file: {}", path.display()))?;
  let plan = StepPlan::from_def(def)
    .with_context(|| format!("invalid plan file: {}", path.display()))?;

  if let Some(name) = &plan.name {
    eprintln!("Loaded plan: {}", name);
  }

  Ok(plan)
}

fn dispatch<R: CommandRunner>(
  runner: R,
  ordinal: WorkerOrdinal,
  plan: &StepPlan,
) -> Result<ExecutionResult> {
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()?;
  let dispatcher = Dispatcher::new(runner);
  let result = rt.block_on(dispatcher.dispatch(ordinal, plan))?;
  Ok(result)
}

/// Keep stdout for the JSON result when both are requested.
fn dry_runner(json: bool) -> DryRunner {
  if json {
    DryRunner::new(DryRunOutput::Stderr)
  } else {
    DryRunner::new(DryRunOutput::Stdout)
  }
}

fn print_steps(ordinal: WorkerOrdinal, commands: &[nodestep_plan::Command]) {
  println!("worker {}:", ordinal);
  for (index, command) in commands.iter().enumerate() {
    println!("  {}. {}", index + 1, command);
  }
}

/// Process exit code for a finished dispatch: the failing step's own code when
/// it fits in 1..=255, otherwise 1.
fn exit_code(result: &ExecutionResult) -> u8 {
  if result.success {
    return 0;
  }
  u8::try_from(result.exit_code)
    .ok()
    .filter(|code| *code != 0)
    .unwrap_or(1)
}

#[cfg(test)]
mod tests {
  use super::*;

  use clap::CommandFactory;
  use nodestep_dispatcher::{DispatchState, StepOutcome};

  fn failed(exit_code: i32) -> ExecutionResult {
    let plan = StepPlan::new([(0, vec!["step"])]).unwrap();
    let command = plan.get(WorkerOrdinal::new(0)).unwrap()[0].clone();
    let step = StepOutcome {
      index: 0,
      command,
      exit_code,
    };
    ExecutionResult {
      ordinal: WorkerOrdinal::new(0),
      success: false,
      state: DispatchState::Failed,
      exit_code,
      steps: vec![step.clone()],
      failure: Some(step),
    }
  }

  #[test]
  fn test_cli_definition() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_parse_run_with_ordinal() {
    let cli =
      Cli::try_parse_from(["nodestep", "run", "plan.json", "--ordinal", "1", "--json"]).unwrap();

    match cli.command {
      Commands::Run {
        plan_file,
        ordinal,
        json,
        dry_run,
        shell,
      } => {
        assert_eq!(plan_file, PathBuf::from("plan.json"));
        assert_eq!(ordinal.resolve().unwrap(), WorkerOrdinal::new(1));
        assert_eq!(ordinal.ordinal_env, "CIRCLE_NODE_INDEX");
        assert!(json);
        assert!(!dry_run);
        assert_eq!(shell, "sh");
      }
      _ => panic!("expected run"),
    }
  }

  #[test]
  fn test_ordinal_from_missing_env_var() {
    let args = OrdinalArgs {
      ordinal: None,
      ordinal_env: "NODESTEP_TEST_UNSET_ORDINAL_VAR".to_string(),
    };

    let err = args.resolve().unwrap_err();

    assert!(err.to_string().contains("NODESTEP_TEST_UNSET_ORDINAL_VAR"));
  }

  #[test]
  fn test_dry_run_keeps_stdout_for_json() {
    assert_eq!(dry_runner(true).output(), DryRunOutput::Stderr);
    assert_eq!(dry_runner(false).output(), DryRunOutput::Stdout);
  }

  #[test]
  fn test_plan_parse_error_reports_cause_once() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    std::io::Write::write_all(&mut file, b"nodes:\n  zero: [install]\n").unwrap();

    let err = load_plan(file.path()).unwrap_err();
    let message = format!("{:#}", err);

    assert!(message.contains("failed to parse YAML plan"), "{}", message);
    assert_eq!(message.matches("invalid worker ordinal 'zero'").count(), 1, "{}", message);
  }

  #[test]
  fn test_exit_code_mapping() {
    let ok = ExecutionResult {
      ordinal: WorkerOrdinal::new(0),
      success: true,
      state: DispatchState::Succeeded,
      exit_code: 0,
      steps: vec![],
      failure: None,
    };

    assert_eq!(exit_code(&ok), 0);
    assert_eq!(exit_code(&failed(1)), 1);
    assert_eq!(exit_code(&failed(42)), 42);
    assert_eq!(exit_code(&failed(-1)), 1);
    assert_eq!(exit_code(&failed(300)), 1);
  }
}
