//! Validated step plans.
//!
//! A [`StepPlan`] is built once at startup from a [`PlanDef`] and maps each
//! [`WorkerOrdinal`] to the ordered [`Command`]s that worker runs. Validation
//! happens here so the dispatcher never sees an empty command or a plan that
//! leaves one of its declared workers without an entry.
//!
//! [`PlanDef`]: nodestep_config::PlanDef

mod command;
mod error;
mod ordinal;
mod plan;

pub use command::Command;
pub use error::PlanError;
pub use ordinal::WorkerOrdinal;
pub use plan::StepPlan;
