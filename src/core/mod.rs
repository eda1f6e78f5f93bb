pub mod build;
pub mod plan;

pub use crate::domain::model::{BuildReport, BuildStep, CommandOutcome, StepKind, StepReport};
pub use crate::domain::ports::{CommandRunner, StatusReporter};
pub use crate::utils::error::Result;
