use crate::config::toml_config::BuildConfig;
use crate::domain::model::{BuildStep, StepKind};

/// 固定順序: 產生文件 -> 編譯 -> 執行 (預設不執行)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    project: String,
    steps: Vec<BuildStep>,
}

impl BuildPlan {
    pub fn standard() -> Self {
        Self::from_config(&BuildConfig::default())
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        let document = BuildStep::new(StepKind::Document, config.document_command());
        let compile = BuildStep::new(StepKind::Compile, config.compile_command());
        let mut run = BuildStep::new(StepKind::Run, config.run_command());
        if !config.run_after_compile() {
            run = run.disabled();
        }

        Self {
            project: config.project.name.clone(),
            steps: vec![document, compile, run],
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    pub fn invoked_steps(&self) -> impl Iterator<Item = &BuildStep> {
        self.steps.iter().filter(|step| step.enabled)
    }

    pub fn step(&self, kind: StepKind) -> Option<&BuildStep> {
        self.steps.iter().find(|step| step.kind == kind)
    }
}

impl Default for BuildPlan {
    fn default() -> Self {
        Self::standard()
    }
}
