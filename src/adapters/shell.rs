//! Runs command lines through the platform shell.
//!
//! `sh -c` on Unix and `cmd /C` on Windows, so wildcards like `*.java` are
//! expanded by the shell exactly as they would be when typed by hand. The
//! child inherits the terminal; nothing is captured.
//!
//! With a timeout set, Unix children run in their own process group so that
//! everything the shell forked is killed along with it.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::config::toml_config::BuildConfig;
use crate::domain::model::{duration_ms, CommandOutcome};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{BuildError, Result};
use crate::utils::monitor::ProcessTreeMonitor;

const SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    working_directory: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
    timeout: Option<Duration>,
    monitor: bool,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            working_directory: config.working_directory(),
            env_vars: config.env_vars(),
            timeout: config.timeout(),
            monitor: config.monitoring_enabled(),
        }
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 取樣子程序樹的 CPU / 記憶體
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = enabled;
        self
    }

    fn shell_command(command_line: &str) -> Command {
        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        let mut cmd = Command::new(shell);
        cmd.arg(flag).arg(command_line);
        cmd
    }

    async fn wait_sampling(
        child: &mut Child,
        monitor: Option<&mut ProcessTreeMonitor>,
    ) -> std::io::Result<ExitStatus> {
        let Some(monitor) = monitor else {
            return child.wait().await;
        };

        let mut ticker = tokio::time::interval(SAMPLE_INTERVAL);
        loop {
            tokio::select! {
                status = child.wait() => return status,
                _ = ticker.tick() => {
                    monitor.sample();
                }
            }
        }
    }

    /// 逾時後結束整個程序群組，再回收 shell 本身
    async fn kill_tree(child: &mut Child) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            // Safety: `kill` only sends a signal; a negative pid targets the
            // group created by `process_group(0)` at spawn time.
            let ret = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
            if ret != 0 {
                tracing::warn!(
                    "Failed to kill process group {}: {}",
                    pid,
                    std::io::Error::last_os_error()
                );
            }
        }

        if let Err(e) = child.kill().await {
            tracing::warn!("Failed to kill timed out command: {}", e);
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command_line: &str) -> Result<CommandOutcome> {
        let mut cmd = Self::shell_command(command_line);
        // `kill_on_drop(true)` 讓逾時時子程序一併結束
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // 沒有逾時設定時留在前景群組，Ctrl-C 才能傳到工具
        #[cfg(unix)]
        if self.timeout.is_some() {
            cmd.process_group(0);
        }

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        if let Some(dir) = &self.working_directory {
            cmd.current_dir(dir);
        }

        let start = Instant::now();

        let mut child = cmd.spawn().map_err(|source| BuildError::SpawnError {
            command: command_line.to_string(),
            source,
        })?;

        let mut monitor = match (self.monitor, child.id()) {
            (true, Some(pid)) => Some(ProcessTreeMonitor::new(pid)),
            _ => None,
        };

        let status = match self.timeout {
            Some(timeout) => {
                let waited = tokio::time::timeout(
                    timeout,
                    Self::wait_sampling(&mut child, monitor.as_mut()),
                )
                .await;
                match waited {
                    Ok(status) => status,
                    Err(_elapsed) => {
                        Self::kill_tree(&mut child).await;
                        return Err(BuildError::TimeoutError {
                            command: command_line.to_string(),
                            elapsed_ms: duration_ms(start.elapsed()),
                        });
                    }
                }
            }
            None => Self::wait_sampling(&mut child, monitor.as_mut()).await,
        }?;

        Ok(CommandOutcome {
            exit_code: status.code(),
            duration: start.elapsed(),
            resources: monitor.map(ProcessTreeMonitor::finish),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exit_code_is_reported() {
        let outcome = ShellRunner::new().run("exit 42").await.unwrap();
        assert_eq!(outcome.exit_code, Some(42));
        assert!(!outcome.success());
        assert!(outcome.resources.is_none());
    }

    #[tokio::test]
    async fn test_wildcard_expanded_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Network.java"), "class Network {}").unwrap();

        let runner = ShellRunner::new().with_working_directory(dir.path());
        let outcome = runner.run("test -f *.java").await.unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_env_vars_reach_the_child() {
        let runner = ShellRunner::new().with_env("COMPILE_DOC_MARKER", "yes");
        let outcome = runner
            .run(r#"test "$COMPILE_DOC_MARKER" = yes"#)
            .await
            .unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let runner = ShellRunner::new().with_timeout(Duration::from_millis(200));
        let result = runner.run("sleep 30").await;
        assert!(matches!(result, Err(BuildError::TimeoutError { .. })));
    }

    #[tokio::test]
    async fn test_timeout_kills_commands_forked_by_the_shell() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");

        let runner = ShellRunner::new()
            .with_working_directory(dir.path())
            .with_timeout(Duration::from_millis(200));
        // sleep 不是最後一個指令，sh 必須 fork
        let result = runner.run("sleep 1; touch finished").await;
        assert!(matches!(result, Err(BuildError::TimeoutError { .. })));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_missing_working_directory_is_spawn_error() {
        let runner = ShellRunner::new().with_working_directory("/nonexistent/compile-doc-dir");
        let result = runner.run("true").await;
        assert!(matches!(result, Err(BuildError::SpawnError { .. })));
    }

    #[cfg(feature = "cli")]
    #[tokio::test]
    async fn test_monitoring_samples_the_tool_not_the_runner() {
        let runner = ShellRunner::new().with_monitoring(true);
        let outcome = runner.run("sleep 1; true").await.unwrap();

        assert!(outcome.success());
        let usage = outcome.resources.expect("monitoring enabled");
        assert!(usage.samples >= 1);
        // sh 加上 sleep
        assert_eq!(usage.peak_process_count, 2);
        assert!(usage.peak_memory_bytes > 0);
    }
}
