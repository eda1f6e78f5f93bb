//! Samples the resource usage of a spawned tool and everything it forks.
//!
//! `sh -c` wraps every command, so the interesting numbers (javadoc,
//! javac, the JVM) live in the wrapper's descendants. Each sample walks
//! the process table and sums every process whose ancestry reaches the
//! root pid.

use crate::domain::model::ResourceUsage;

#[cfg(feature = "cli")]
use std::collections::HashMap;
#[cfg(feature = "cli")]
use sysinfo::{Pid, Process, ProcessesToUpdate, System};

/// 往上追溯父程序的最大層數
#[cfg(feature = "cli")]
const MAX_ANCESTRY_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeSample {
    pub memory_bytes: u64,
    pub cpu_usage: f32,
    pub process_count: usize,
}

#[cfg(feature = "cli")]
pub struct ProcessTreeMonitor {
    system: System,
    root: Pid,
    usage: ResourceUsage,
}

#[cfg(feature = "cli")]
impl ProcessTreeMonitor {
    pub fn new(root_pid: u32) -> Self {
        Self {
            system: System::new(),
            root: Pid::from_u32(root_pid),
            usage: ResourceUsage::default(),
        }
    }

    /// `None` once the root process is gone.
    pub fn sample(&mut self) -> Option<TreeSample> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        let processes = self.system.processes();

        let members: Vec<&Process> = processes
            .iter()
            .filter(|(pid, process)| {
                // Linux 會把執行緒也列成 process，只算一次
                process.thread_kind().is_none() && descends_from(processes, **pid, self.root)
            })
            .map(|(_, process)| process)
            .collect();
        if members.is_empty() {
            return None;
        }

        let sample = TreeSample {
            memory_bytes: members.iter().map(|p| p.memory()).sum(),
            cpu_usage: members.iter().map(|p| p.cpu_usage()).sum(),
            process_count: members.len(),
        };

        self.usage.samples += 1;
        self.usage.peak_memory_bytes = self.usage.peak_memory_bytes.max(sample.memory_bytes);
        self.usage.peak_cpu_usage = self.usage.peak_cpu_usage.max(sample.cpu_usage);
        self.usage.peak_process_count = self.usage.peak_process_count.max(sample.process_count);

        tracing::trace!(
            "📊 pid {} tree: {} process(es), {}KB, CPU {:.1}%",
            self.root,
            sample.process_count,
            sample.memory_bytes / 1024,
            sample.cpu_usage
        );
        Some(sample)
    }

    pub fn finish(self) -> ResourceUsage {
        self.usage
    }
}

#[cfg(feature = "cli")]
fn descends_from(processes: &HashMap<Pid, Process>, pid: Pid, root: Pid) -> bool {
    let mut current = Some(pid);
    for _ in 0..MAX_ANCESTRY_DEPTH {
        match current {
            Some(p) if p == root => return true,
            Some(p) => current = processes.get(&p).and_then(|process| process.parent()),
            None => return false,
        }
    }
    false
}

// 非 CLI 環境提供空實現
#[cfg(not(feature = "cli"))]
pub struct ProcessTreeMonitor;

#[cfg(not(feature = "cli"))]
impl ProcessTreeMonitor {
    pub fn new(_root_pid: u32) -> Self {
        Self
    }

    pub fn sample(&mut self) -> Option<TreeSample> {
        None
    }

    pub fn finish(self) -> ResourceUsage {
        ResourceUsage::default()
    }
}

#[cfg(all(test, unix, feature = "cli"))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_samples_child_process_tree() {
        // sh 先 fork 出 sleep，再等待它
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("sleep 5; true")
            .spawn()
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(300));

        let mut monitor = ProcessTreeMonitor::new(child.id());
        let sample = monitor.sample();

        child.kill().unwrap();
        child.wait().unwrap();

        let sample = sample.expect("child should still be running");
        assert_eq!(sample.process_count, 2);
        assert!(sample.memory_bytes > 0);

        let usage = monitor.finish();
        assert_eq!(usage.samples, 1);
        assert_eq!(usage.peak_process_count, 2);
        assert_eq!(usage.peak_memory_bytes, sample.memory_bytes);
    }

    #[test]
    fn test_exited_root_yields_no_sample() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        let mut monitor = ProcessTreeMonitor::new(pid);
        assert!(monitor.sample().is_none());
        assert_eq!(monitor.finish().samples, 0);
    }
}
