use crate::core::plan::BuildPlan;
use crate::domain::model::{duration_ms, BuildReport, BuildStep, StepReport};
use crate::domain::ports::{CommandRunner, StatusReporter};
use crate::utils::error::BuildError;
use chrono::Utc;

pub const DONE: &str = "Done";

/// 工具失敗後的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Ignore the exit status and keep going.
    #[default]
    Continue,
    /// Skip the remaining steps and report exit code 1.
    Stop,
}

pub struct BuildEngine<R: CommandRunner, S: StatusReporter> {
    runner: R,
    reporter: S,
    policy: FailurePolicy,
}

impl<R: CommandRunner, S: StatusReporter> BuildEngine<R, S> {
    pub fn new(runner: R, reporter: S) -> Self {
        Self {
            runner,
            reporter,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn reporter(&self) -> &S {
        &self.reporter
    }

    /// 依序執行每個啟用的步驟
    pub async fn run(&self, plan: &BuildPlan) -> BuildReport {
        let started_at = Utc::now();
        let execution_id = started_at.format("%Y%m%d%H%M%S%3f").to_string();
        tracing::info!("🚀 Starting build {} of {}", execution_id, plan.project());

        let mut steps = Vec::with_capacity(plan.steps().len());
        let mut halted = false;

        for step in plan.steps() {
            if !step.enabled || halted {
                tracing::debug!("⏭️ Not invoking {} step: {}", step.kind, step.command_line);
                steps.push(StepReport::skipped(step));
                continue;
            }

            let report = self.execute_step(step).await;

            if report.failed() && self.policy == FailurePolicy::Stop {
                tracing::error!("❌ {} step failed, skipping remaining steps", step.kind);
                halted = true;
            }
            steps.push(report);
        }

        let exit_code = if halted { 1 } else { 0 };
        let report = BuildReport {
            project: plan.project().to_string(),
            execution_id,
            started_at,
            steps,
            exit_code,
        };

        tracing::info!(
            "✅ Build finished: {} command(s) invoked, {} failed, {}ms",
            report.invoked_count(),
            report.failed_steps().len(),
            report.total_duration_ms()
        );
        if let Some(peak) = report.peak_memory_bytes() {
            tracing::info!("📊 Final Stats - Peak tool memory: {}MB", peak / 1024 / 1024);
        }
        report
    }

    async fn execute_step(&self, step: &BuildStep) -> StepReport {
        self.reporter.status(step.kind.banner());
        tracing::debug!("▶️ {}", step.command_line);

        let mut report = StepReport::skipped(step);
        report.invoked = true;

        match self.runner.run(&step.command_line).await {
            Ok(outcome) => {
                report.exit_code = outcome.exit_code;
                report.duration_ms = duration_ms(outcome.duration);
                if let Some(usage) = &outcome.resources {
                    tracing::info!(
                        "📊 {} step - Peak memory: {}MB, Peak CPU: {:.1}%, Processes: {}, Samples: {}",
                        step.kind,
                        usage.peak_memory_mb(),
                        usage.peak_cpu_usage,
                        usage.peak_process_count,
                        usage.samples
                    );
                }
                report.resources = outcome.resources.clone();
                if outcome.success() {
                    tracing::debug!("{} step exited cleanly in {:?}", step.kind, outcome.duration);
                } else {
                    tracing::warn!(
                        "⚠️ {} step exited with {:?}: {}",
                        step.kind,
                        outcome.exit_code,
                        step.command_line
                    );
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ {} step could not complete: {}", step.kind, e);
                if let BuildError::TimeoutError { elapsed_ms, .. } = &e {
                    report.duration_ms = *elapsed_ms;
                }
                report.error = Some(e.to_string());
            }
        }

        // 不論結果都印出 Done
        self.reporter.status(DONE);

        report
    }

    /// 只列出將會執行的指令
    pub fn dry_run(&self, plan: &BuildPlan) -> Vec<String> {
        tracing::info!("🔍 DRY RUN MODE - no command will be invoked");
        plan.invoked_steps()
            .map(|step| {
                self.reporter.status(&step.command_line);
                step.command_line.clone()
            })
            .collect()
    }
}

impl BuildReport {
    /// 第一個失敗的步驟轉成錯誤
    pub fn first_failure(&self) -> Option<BuildError> {
        self.failed_steps()
            .first()
            .map(|step| BuildError::StepFailedError {
                step: step.step.to_string(),
                exit_code: step.exit_code,
            })
    }
}
