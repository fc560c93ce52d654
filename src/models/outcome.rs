// file: src/models/outcome.rs
// description: recon-all invocations and per-subject results of a longitudinal run
// reference: internal data structures

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ReconStage {
    /// Within-subject template built from every timepoint.
    Base {
        base: String,
        timepoints: Vec<String>,
    },
    Longitudinal {
        timepoint: String,
        base: String,
    },
}

impl ReconStage {
    /// Folder `recon-all` writes into for this stage, relative to the subjects dir.
    pub fn output_folder(&self) -> String {
        match self {
            ReconStage::Base { base, .. } => base.clone(),
            ReconStage::Longitudinal { timepoint, base } => format!("{}.long.{}", timepoint, base),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ReconStage::Base { .. } => "base".to_string(),
            ReconStage::Longitudinal { timepoint, .. } => format!("long {}", timepoint),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconInvocation {
    pub subject: String,
    pub subjects_dir: PathBuf,
    #[serde(flatten)]
    pub stage: ReconStage,
    pub extra_args: Vec<String>,
}

impl ReconInvocation {
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();

        match &self.stage {
            ReconStage::Base { base, timepoints } => {
                args.push("-base".to_string());
                args.push(base.clone());
                for tp in timepoints {
                    args.push("-tp".to_string());
                    args.push(tp.clone());
                }
            }
            ReconStage::Longitudinal { timepoint, base } => {
                args.push("-long".to_string());
                args.push(timepoint.clone());
                args.push(base.clone());
            }
        }

        args.push("-all".to_string());
        args.push("-sd".to_string());
        args.push(self.subjects_dir.display().to_string());
        args.extend(self.extra_args.iter().cloned());
        args
    }

    pub fn output_dir(&self) -> PathBuf {
        self.subjects_dir.join(self.stage.output_folder())
    }

    pub fn command_line(&self, program: &str) -> String {
        let mut parts = vec![program.to_string()];
        parts.extend(self.args());
        parts.join(" ")
    }
}

impl fmt::Display for ReconInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.subject, self.stage.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedFolder {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubjectOutcome {
    Completed,
    Skipped { reason: String },
    Failed { error: String },
}

impl SubjectOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SubjectOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub subject: String,
    pub subject_dir: PathBuf,
    pub sessions: Vec<String>,
    pub outcome: SubjectOutcome,
    pub invocations: Vec<ReconInvocation>,
    pub moved: Vec<MovedFolder>,
    pub duration_ms: u64,
}

impl SubjectReport {
    pub fn new(subject: String, subject_dir: PathBuf) -> Self {
        Self {
            subject,
            subject_dir,
            sessions: Vec::new(),
            outcome: SubjectOutcome::Completed,
            invocations: Vec::new(),
            moved: Vec::new(),
            duration_ms: 0,
        }
    }
}
