use crate::domain::ports::StatusReporter;

/// 狀態訊息直接印到 stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl StatusReporter for ConsoleReporter {
    fn status(&self, line: &str) {
        println!("{}", line);
    }
}
