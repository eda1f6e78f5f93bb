#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

// 寫入後立即執行腳本時，並行的 fork 可能造成 ETXTBSY
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

pub fn serial() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// A scratch Java project with stub JDK tools on its own PATH.
pub struct StubProject {
    pub root: TempDir,
    pub bin: PathBuf,
    pub log: PathBuf,
}

impl StubProject {
    /// Every stub records `<tool> <args>` to the log and exits with `exit_code`.
    pub fn new(exit_code: i32) -> Self {
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("bin");
        let src = root.path().join("src");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("Network.java"), "package FullyConnectedNetwork;\n").unwrap();
        std::fs::write(src.join("Perceptron.java"), "package FullyConnectedNetwork;\n").unwrap();

        let log = root.path().join("invocations.log");
        for tool in ["javadoc", "javac", "java"] {
            write_stub(&bin, tool, exit_code);
        }

        Self { root, bin, log }
    }

    pub fn src(&self) -> PathBuf {
        self.root.path().join("src")
    }

    pub fn path_env(&self) -> String {
        let inherited = std::env::var("PATH").unwrap_or_default();
        format!("{}:{}", self.bin.display(), inherited)
    }

    /// Replaces a stub with a custom script body (after the shebang).
    pub fn replace_stub(&self, tool: &str, body: &str) {
        let path = self.bin.join(tool);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn invocations(&self) -> Vec<String> {
        match std::fs::read_to_string(&self.log) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn write_stub(bin: &Path, tool: &str, exit_code: i32) {
    let path = bin.join(tool);
    let script = format!(
        "#!/bin/sh\necho \"{} $*\" >> \"$STUB_LOG\"\nexit {}\n",
        tool, exit_code
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
