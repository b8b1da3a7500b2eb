//! Nodestep Config
//!
//! This crate contains the serializable plan configuration types for nodestep.
//! These types represent a step plan as written on disk, before it is validated
//! into a `StepPlan` by `nodestep-plan`.
//!
//! Plans can be loaded from:
//! - JSON files (any extension other than `.yaml`/`.yml`)
//! - YAML files (`.yaml` or `.yml`)

mod error;
mod format;
mod plan;

pub use error::ConfigError;
pub use format::PlanFormat;
pub use plan::PlanDef;
