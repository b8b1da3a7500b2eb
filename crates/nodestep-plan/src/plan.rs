use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use nodestep_config::PlanDef;

use crate::command::Command;
use crate::error::PlanError;
use crate::ordinal::WorkerOrdinal;

/// A validated plan, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan {
  pub name: Option<String>,
  pub node_total: Option<u32>,
  pub env: BTreeMap<String, String>,
  pub working_dir: Option<PathBuf>,
  pub timeout: Option<Duration>,
  steps: BTreeMap<WorkerOrdinal, Vec<Command>>,
}

impl StepPlan {
  /// Build a plan with only step sequences and no environment, working
  /// directory or timeout.
  pub fn new<I, S>(entries: I) -> Result<Self, PlanError>
  where
    I: IntoIterator<Item = (u32, Vec<S>)>,
    S: Into<String>,
  {
    let steps = entries
      .into_iter()
      .map(|(ordinal, commands)| {
        let ordinal = WorkerOrdinal::new(ordinal);
        parse_commands(ordinal, commands.into_iter().map(Into::into)).map(|c| (ordinal, c))
      })
      .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(Self {
      name: None,
      node_total: None,
      env: BTreeMap::new(),
      working_dir: None,
      timeout: None,
      steps,
    })
  }

  /// Validate a plan definition.
  ///
  /// Every command must be non-blank. When the definition declares
  /// `node_total`, the plan must cover exactly the ordinals `0..node_total`.
  pub fn from_def(def: PlanDef) -> Result<Self, PlanError> {
    let steps = def
      .nodes
      .into_iter()
      .map(|(ordinal, commands)| {
        let ordinal = WorkerOrdinal::new(ordinal);
        parse_commands(ordinal, commands).map(|c| (ordinal, c))
      })
      .collect::<Result<BTreeMap<_, _>, _>>()?;

    let plan = Self {
      name: def.name,
      node_total: def.node_total,
      env: def.env,
      working_dir: def.working_dir,
      timeout: def.timeout_ms.map(Duration::from_millis),
      steps,
    };

    if let Some(node_total) = plan.node_total {
      plan.check_coverage(node_total)?;
    }

    Ok(plan)
  }

  /// Verify that ordinals `0..node_total` all have entries and nothing else does.
  pub fn check_coverage(&self, node_total: u32) -> Result<(), PlanError> {
    if let Some(ordinal) = (0..node_total)
      .map(WorkerOrdinal::new)
      .find(|ordinal| !self.steps.contains_key(ordinal))
    {
      return Err(PlanError::MissingOrdinal {
        ordinal,
        node_total,
      });
    }

    if let Some(ordinal) = self
      .steps
      .keys()
      .find(|ordinal| ordinal.get() >= node_total)
    {
      return Err(PlanError::OrdinalOutOfRange {
        ordinal: *ordinal,
        node_total,
      });
    }

    Ok(())
  }

  /// Commands assigned to `ordinal`, in execution order.
  pub fn get(&self, ordinal: WorkerOrdinal) -> Option<&[Command]> {
    self.steps.get(&ordinal).map(Vec::as_slice)
  }

  pub fn contains(&self, ordinal: WorkerOrdinal) -> bool {
    self.steps.contains_key(&ordinal)
  }

  /// Known ordinals in ascending order.
  pub fn ordinals(&self) -> impl Iterator<Item = WorkerOrdinal> + '_ {
    self.steps.keys().copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = (WorkerOrdinal, &[Command])> + '_ {
    self
      .steps
      .iter()
      .map(|(ordinal, commands)| (*ordinal, commands.as_slice()))
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

fn parse_commands(
  ordinal: WorkerOrdinal,
  commands: impl IntoIterator<Item = String>,
) -> Result<Vec<Command>, PlanError> {
  commands
    .into_iter()
    .enumerate()
    .map(|(index, raw)| Command::parse(raw).ok_or(PlanError::EmptyCommand { ordinal, index }))
    .collect()
}
