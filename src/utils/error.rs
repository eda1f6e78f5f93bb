use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to start '{command}': {source}")]
    SpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' timed out after {elapsed_ms}ms")]
    TimeoutError { command: String, elapsed_ms: u64 },

    #[error("Step '{step}' failed with exit code {exit_code:?}")]
    StepFailedError {
        step: String,
        exit_code: Option<i32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Process,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BuildError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BuildError::ConfigValidationError { .. }
            | BuildError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            BuildError::SpawnError { .. }
            | BuildError::TimeoutError { .. }
            | BuildError::StepFailedError { .. } => ErrorCategory::Process,
            BuildError::IoError(_) | BuildError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BuildError::TimeoutError { .. } => ErrorSeverity::Medium,
            BuildError::StepFailedError { .. } | BuildError::SpawnError { .. } => {
                ErrorSeverity::High
            }
            BuildError::ConfigValidationError { .. } | BuildError::InvalidConfigValueError { .. } => {
                ErrorSeverity::High
            }
            BuildError::IoError(_) | BuildError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BuildError::ConfigValidationError { .. } => {
                "Check the build file for TOML syntax errors".to_string()
            }
            BuildError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the build file or on the command line", field)
            }
            BuildError::SpawnError { .. } => {
                "Make sure the JDK tools (javadoc, javac, java) are installed and on PATH"
                    .to_string()
            }
            BuildError::TimeoutError { .. } => {
                "Increase --timeout or execution.timeout_seconds".to_string()
            }
            BuildError::StepFailedError { .. } => {
                "Inspect the tool output above, or drop --strict to ignore tool failures"
                    .to_string()
            }
            BuildError::IoError(_) => "Check file permissions and available disk space".to_string(),
            BuildError::SerializationError(_) => "Report this as a bug".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BuildError::ConfigValidationError { message, .. } => {
                format!("Could not read the build file: {}", message)
            }
            BuildError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            BuildError::SpawnError { command, .. } => {
                format!("Could not start '{}'", command)
            }
            BuildError::TimeoutError { command, .. } => {
                format!("'{}' took too long and was stopped", command)
            }
            BuildError::StepFailedError { step, exit_code } => match exit_code {
                Some(code) => format!("{} failed (exit code {})", step, code),
                None => format!("{} was terminated by a signal", step),
            },
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
