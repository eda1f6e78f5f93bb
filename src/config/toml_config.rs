use crate::core::build::FailurePolicy;
use crate::utils::error::{BuildError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROJECT_NAME: &str = "FullyConnectedNetwork";
pub const DEFAULT_ENTRY_POINT: &str = "FullyConnectedNetwork.Network";

#[cfg(windows)]
pub const DEFAULT_DOC_DIR: &str = ".\\FullyConnectedNetworkDocumentation";
#[cfg(not(windows))]
pub const DEFAULT_DOC_DIR: &str = "./FullyConnectedNetworkDocumentation";

const MAX_TIMEOUT_SECONDS: u64 = 24 * 60 * 60;
const FAILURE_POLICIES: [&str; 2] = ["continue", "stop"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub error_handling: ErrorHandlingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    pub environment: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    pub doc_dir: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            entry_point: default_entry_point(),
            doc_dir: None,
        }
    }
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

fn default_entry_point() -> String {
    DEFAULT_ENTRY_POINT.to_string()
}

/// 覆寫預設的指令字串
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandsConfig {
    pub document: Option<String>,
    pub compile: Option<String>,
    pub run: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub working_directory: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub run_after_compile: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    pub on_step_failure: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl BuildConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BuildError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，解析後才替換環境變數
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| BuildError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        config.substitute_env_vars()?;
        Ok(config)
    }

    /// 替換字串欄位中的環境變數 (例如 ${JAVA_HOME})，找不到的變數保持原樣
    fn substitute_env_vars(&mut self) -> Result<()> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            BuildError::ConfigValidationError {
                field: "environment_substitution".to_string(),
                message: e.to_string(),
            }
        })?;

        let expand = |value: &mut String| {
            let replaced = re
                .replace_all(value.as_str(), |caps: &regex::Captures| {
                    let var_name = &caps[1];
                    std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
                })
                .into_owned();
            *value = replaced;
        };

        expand(&mut self.project.name);
        expand(&mut self.project.entry_point);

        let optional = [
            &mut self.project.doc_dir,
            &mut self.commands.document,
            &mut self.commands.compile,
            &mut self.commands.run,
            &mut self.execution.working_directory,
        ];
        for value in optional.into_iter().flatten() {
            expand(value);
        }

        if let Some(env) = &mut self.environment {
            for value in env.values_mut() {
                expand(value);
            }
        }

        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("project.name", &self.project.name)?;
        validation::validate_non_empty_string("project.entry_point", &self.project.entry_point)?;
        validation::validate_shell_argument("project.entry_point", &self.project.entry_point)?;

        if let Some(doc_dir) = &self.project.doc_dir {
            validation::validate_path("project.doc_dir", doc_dir)?;
            validation::validate_shell_argument("project.doc_dir", doc_dir)?;
        }

        let overrides = [
            ("commands.document", &self.commands.document),
            ("commands.compile", &self.commands.compile),
            ("commands.run", &self.commands.run),
        ];
        for (field, command) in overrides {
            if let Some(command) = command {
                validation::validate_non_empty_string(field, command)?;
            }
        }

        if let Some(dir) = &self.execution.working_directory {
            validation::validate_path("execution.working_directory", dir)?;
        }

        if let Some(timeout) = self.execution.timeout_seconds {
            validation::validate_range(
                "execution.timeout_seconds",
                timeout,
                1,
                MAX_TIMEOUT_SECONDS,
            )?;
        }

        if let Some(policy) = &self.error_handling.on_step_failure {
            validation::validate_one_of(
                "error_handling.on_step_failure",
                policy,
                &FAILURE_POLICIES,
            )?;
        }

        if let Some(env) = &self.environment {
            for key in env.keys() {
                validation::validate_non_empty_string("environment", key)?;
            }
        }

        Ok(())
    }

    pub fn doc_dir(&self) -> &str {
        self.project.doc_dir.as_deref().unwrap_or(DEFAULT_DOC_DIR)
    }

    pub fn document_command(&self) -> String {
        match &self.commands.document {
            Some(command) => command.clone(),
            None => format!("javadoc -d {} *.java -html5", quote_arg(self.doc_dir())),
        }
    }

    pub fn compile_command(&self) -> String {
        match &self.commands.compile {
            Some(command) => command.clone(),
            None => "javac -verbose -d . *.java".to_string(),
        }
    }

    pub fn run_command(&self) -> String {
        match &self.commands.run {
            Some(command) => command.clone(),
            None => format!("java {}", quote_arg(&self.project.entry_point)),
        }
    }

    pub fn run_after_compile(&self) -> bool {
        self.execution.run_after_compile.unwrap_or(false)
    }

    /// 未設定或 "continue" 時忽略工具失敗
    pub fn failure_policy(&self) -> FailurePolicy {
        match self.error_handling.on_step_failure.as_deref() {
            Some("stop") => FailurePolicy::Stop,
            _ => FailurePolicy::Continue,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.execution.timeout_seconds.map(Duration::from_secs)
    }

    pub fn working_directory(&self) -> Option<PathBuf> {
        self.execution.working_directory.as_ref().map(PathBuf::from)
    }

    /// 依名稱排序，子程序的環境變數順序固定
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = self
            .environment
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        vars.sort();
        vars
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

/// 依目標 shell 加上引號，`validate_shell_argument` 已排除無法引用的值
fn quote_arg(value: &str) -> Cow<'_, str> {
    if cfg!(windows) {
        if value.is_empty() || value.chars().any(|c| c.is_whitespace() || "&|<>^()".contains(c)) {
            Cow::Owned(format!("\"{}\"", value))
        } else {
            Cow::Borrowed(value)
        }
    } else {
        shlex::try_quote(value).unwrap_or(Cow::Borrowed(value))
    }
}

impl Validate for BuildConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
