use super::toml_config::BuildConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "compile-doc")]
#[command(about = "Generate Javadoc and compile the FullyConnectedNetwork sources")]
pub struct CliConfig {
    /// Optional TOML build file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory the tools run in (defaults to the current directory)
    #[arg(short = 'C', long)]
    pub working_dir: Option<String>,

    /// Documentation output directory
    #[arg(long)]
    pub doc_dir: Option<String>,

    /// Also invoke the run command after compiling
    #[arg(long)]
    pub run: bool,

    /// Stop at the first failing step and exit with status 1
    #[arg(long)]
    pub strict: bool,

    /// Per-command timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the command lines without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Write the JSON build report to this file
    #[arg(long)]
    pub report: Option<String>,

    /// Log process resource usage after each step
    #[arg(long)]
    pub monitor: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入 TOML (若有指定) 並套用命令列覆蓋設定
    pub fn resolve(&self) -> Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading build file from: {}", path);
                BuildConfig::from_file(path)?
            }
            None => BuildConfig::default(),
        };

        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut BuildConfig) {
        if let Some(dir) = &self.working_dir {
            config.execution.working_directory = Some(dir.clone());
        }
        if let Some(doc_dir) = &self.doc_dir {
            config.project.doc_dir = Some(doc_dir.clone());
        }
        if self.run {
            config.execution.run_after_compile = Some(true);
        }
        if self.strict {
            config.error_handling.on_step_failure = Some("stop".to_string());
        }
        if let Some(timeout) = self.timeout {
            config.execution.timeout_seconds = Some(timeout);
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::build::FailurePolicy;

    #[test]
    fn test_defaults_without_flags() {
        let cli = CliConfig::parse_from(["compile-doc"]);
        let config = cli.resolve().unwrap();

        assert!(!config.run_after_compile());
        assert_eq!(config.failure_policy(), FailurePolicy::Continue);
        assert!(config.working_directory().is_none());
    }

    #[test]
    fn test_flags_override_build_file() {
        let cli = CliConfig::parse_from([
            "compile-doc",
            "--run",
            "--strict",
            "--timeout",
            "30",
            "--doc-dir",
            "api-docs",
            "-C",
            "src/java",
        ]);
        let mut config = BuildConfig::from_toml_str(
            r#"
[execution]
timeout_seconds = 600
run_after_compile = false
"#,
        )
        .unwrap();

        cli.apply_to(&mut config);

        assert!(config.run_after_compile());
        assert_eq!(config.failure_policy(), FailurePolicy::Stop);
        assert_eq!(config.execution.timeout_seconds, Some(30));
        assert_eq!(config.document_command(), "javadoc -d api-docs *.java -html5");
        assert_eq!(
            config.execution.working_directory.as_deref(),
            Some("src/java")
        );
    }

    #[test]
    fn test_resolve_rejects_invalid_timeout() {
        let cli = CliConfig::parse_from(["compile-doc", "--timeout", "0"]);
        assert!(cli.resolve().is_err());
    }
}
