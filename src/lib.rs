pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{ConsoleReporter, ShellRunner};
pub use config::BuildConfig;
pub use crate::core::{build::BuildEngine, build::FailurePolicy, plan::BuildPlan};
pub use utils::error::{BuildError, Result};
