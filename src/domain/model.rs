use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Document,
    Compile,
    Run,
}

impl StepKind {
    /// 執行前印出的狀態訊息
    pub fn banner(&self) -> &'static str {
        match self {
            StepKind::Document => "Creating Documentation...",
            StepKind::Compile => "Compiling...",
            StepKind::Run => "Running...",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Document => "document",
            StepKind::Compile => "compile",
            StepKind::Run => "run",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    pub kind: StepKind,
    pub command_line: String,
    pub enabled: bool,
}

impl BuildStep {
    pub fn new(kind: StepKind, command_line: impl Into<String>) -> Self {
        Self {
            kind,
            command_line: command_line.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// 毫秒數，超出 u64 時取最大值
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Peak resource usage of a command's whole process tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub peak_memory_bytes: u64,
    pub peak_cpu_usage: f32,
    pub peak_process_count: usize,
    pub samples: u32,
}

impl ResourceUsage {
    pub fn peak_memory_mb(&self) -> u64 {
        self.peak_memory_bytes / 1024 / 1024
    }
}

/// 外部指令的結束狀態
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub resources: Option<ResourceUsage>,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: StepKind,
    pub command_line: String,
    pub invoked: bool,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub resources: Option<ResourceUsage>,
}

impl StepReport {
    pub fn skipped(step: &BuildStep) -> Self {
        Self {
            step: step.kind,
            command_line: step.command_line.clone(),
            invoked: false,
            exit_code: None,
            duration_ms: 0,
            error: None,
            resources: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.invoked && (self.error.is_some() || self.exit_code != Some(0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub project: String,
    pub execution_id: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub exit_code: i32,
}

impl BuildReport {
    pub fn invoked_count(&self) -> usize {
        self.steps.iter().filter(|s| s.invoked).count()
    }

    pub fn failed_steps(&self) -> Vec<&StepReport> {
        self.steps.iter().filter(|s| s.failed()).collect()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.steps
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.duration_ms))
    }

    pub fn peak_memory_bytes(&self) -> Option<u64> {
        self.steps
            .iter()
            .filter_map(|s| s.resources.as_ref())
            .map(|r| r.peak_memory_bytes)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banners() {
        assert_eq!(StepKind::Document.banner(), "Creating Documentation...");
        assert_eq!(StepKind::Compile.banner(), "Compiling...");
        assert_eq!(StepKind::Run.to_string(), "run");
    }

    #[test]
    fn test_step_report_failed() {
        let step = BuildStep::new(StepKind::Compile, "javac -d . *.java");
        let skipped = StepReport::skipped(&step);
        assert!(!skipped.failed());

        let nonzero = StepReport {
            invoked: true,
            exit_code: Some(1),
            ..skipped.clone()
        };
        assert!(nonzero.failed());

        let ok = StepReport {
            invoked: true,
            exit_code: Some(0),
            ..skipped
        };
        assert!(!ok.failed());
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}
