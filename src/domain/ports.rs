use crate::domain::model::CommandOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 執行一行 shell 指令並等待結束
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command_line: &str) -> Result<CommandOutcome>;
}

/// 狀態訊息輸出 (例如 "Compiling...", "Done")
pub trait StatusReporter: Send + Sync {
    fn status(&self, line: &str);
}
