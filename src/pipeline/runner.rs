// file: src/pipeline/runner.rs
// description: execution of recon-all invocations as blocking subprocesses
// reference: https://doc.rust-lang.org/std/process/struct.Command.html

use crate::config::ReconConfig;
use crate::error::{Result, WorkflowError};
use crate::models::ReconInvocation;
use std::process::{Command, ExitStatus};
use tracing::info;

/// Runs one reconstruction stage to completion. Implementations block.
pub trait ReconRunner: Send + Sync {
    fn run(&self, invocation: &ReconInvocation) -> Result<()>;

    fn program(&self) -> &str;
}

pub struct SubprocessRunner {
    binary: String,
}

impl SubprocessRunner {
    pub fn new(config: &ReconConfig) -> Self {
        Self {
            binary: config.binary.clone(),
        }
    }
}

impl ReconRunner for SubprocessRunner {
    fn run(&self, invocation: &ReconInvocation) -> Result<()> {
        info!("{}", invocation.command_line(&self.binary));

        let status = Command::new(&self.binary)
            .args(invocation.args())
            .env("SUBJECTS_DIR", &invocation.subjects_dir)
            .status()
            .map_err(|source| WorkflowError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        if !status.success() {
            return Err(WorkflowError::ReconFailed {
                subject: invocation.subject.clone(),
                stage: invocation.stage.label(),
                status: describe_status(status),
            });
        }

        Ok(())
    }

    fn program(&self) -> &str {
        &self.binary
    }
}

/// Logs the command line instead of running it.
pub struct DryRunRunner {
    binary: String,
}

impl DryRunRunner {
    pub fn new(config: &ReconConfig) -> Self {
        Self {
            binary: config.binary.clone(),
        }
    }
}

impl ReconRunner for DryRunRunner {
    fn run(&self, invocation: &ReconInvocation) -> Result<()> {
        info!("[dry-run] {}", invocation.command_line(&self.binary));
        Ok(())
    }

    fn program(&self) -> &str {
        &self.binary
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::ReconStage;
    use std::path::PathBuf;

    fn invocation() -> ReconInvocation {
        ReconInvocation {
            subject: "sub-01".to_string(),
            subjects_dir: PathBuf::from("/tmp"),
            stage: ReconStage::Longitudinal {
                timepoint: "sub-01_ses-01".to_string(),
                base: "sub-01_base".to_string(),
            },
            extra_args: vec![],
        }
    }

    fn runner(binary: &str) -> SubprocessRunner {
        SubprocessRunner::new(&ReconConfig {
            binary: binary.to_string(),
            extra_args: vec![],
            completion_marker: "scripts/recon-all.done".to_string(),
        })
    }

    #[test]
    fn test_successful_exit() {
        assert!(runner("true").run(&invocation()).is_ok());
    }

    #[test]
    fn test_nonzero_exit_names_stage() {
        let err = runner("false").run(&invocation()).unwrap_err();
        match err {
            WorkflowError::ReconFailed {
                subject,
                stage,
                status,
            } => {
                assert_eq!(subject, "sub-01");
                assert_eq!(stage, "long sub-01_ses-01");
                assert_eq!(status, "exit code 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_binary() {
        let err = runner("/nonexistent/recon-all").run(&invocation()).unwrap_err();
        assert!(matches!(err, WorkflowError::Spawn { .. }));
    }
}
