// file: src/pipeline/processor.rs
// description: runs the longitudinal stages for one subject directory
// reference: discovery, symlinks, recon-all base/long, cleanup, reorganization

use crate::config::Config;
use crate::error::{Result, WorkflowError};
use crate::layout::{FolderClassifier, SessionDerivative, SessionScanner, TimepointLinks};
use crate::models::{ReconInvocation, ReconStage, SubjectOutcome, SubjectReport};
use crate::pipeline::reorganize::Reorganizer;
use crate::pipeline::runner::ReconRunner;
use crate::utils::Validator;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Re-run finished stages and replace reorganized folders.
    pub force: bool,
    /// Log commands and moves without touching the filesystem.
    pub dry_run: bool,
}

pub struct SubjectProcessor {
    config: Config,
    runner: Arc<dyn ReconRunner>,
}

impl SubjectProcessor {
    pub fn new(config: Config, runner: Arc<dyn ReconRunner>) -> Self {
        Self { config, runner }
    }

    /// Never fails: errors end up in the report's outcome.
    pub fn process(&self, subject_dir: &Path, options: RunOptions) -> SubjectReport {
        let start = Instant::now();
        let subject = subject_name(subject_dir);
        let mut report = SubjectReport::new(subject.clone(), subject_dir.to_path_buf());

        report.outcome = match self.run_stages(subject_dir, &subject, options, &mut report) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Longitudinal pipeline failed for {}: {}", subject, e);
                SubjectOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    fn run_stages(
        &self,
        subject_dir: &Path,
        subject: &str,
        options: RunOptions,
        report: &mut SubjectReport,
    ) -> Result<SubjectOutcome> {
        Validator::validate_directory(subject_dir)?;
        let subject_dir = fs::canonicalize(subject_dir)
            .map_err(|e| WorkflowError::file_operation(subject_dir, e))?;
        report.subject_dir = subject_dir.clone();

        let cfg = &self.config.longitudinal;
        let scanner = SessionScanner::new(cfg.clone());
        let sessions = scanner.discover(&subject_dir, subject)?;
        report.sessions = sessions.iter().map(|s| s.session.clone()).collect();

        if sessions.len() < cfg.min_sessions {
            info!(
                "Scans for {} have not been processed through freesurfer. Skipping longitudinal pipeline.",
                subject
            );
            return Ok(SubjectOutcome::Skipped {
                reason: format!(
                    "{} session(s) with derivatives, {} required",
                    sessions.len(),
                    cfg.min_sessions
                ),
            });
        }

        let classifier = FolderClassifier::new(subject, cfg.session_prefix.clone());
        let reorganizer = Reorganizer::new(&classifier, cfg);

        let already_done = sessions
            .iter()
            .all(|s| reorganizer.final_long_path(&subject_dir, &s.session).is_dir());
        if already_done && !options.force {
            info!("{} already has longitudinal output for every session", subject);
            return Ok(SubjectOutcome::Skipped {
                reason: "already processed".to_string(),
            });
        }

        let links = if options.dry_run {
            None
        } else {
            Some(TimepointLinks::create(&subject_dir, &classifier, &sessions)?)
        };

        info!("Creating base for {}", subject);
        let base = self.invocation(&subject_dir, &classifier, base_stage(&classifier, &sessions));
        self.run_stage(base, options, report)?;

        for session in &sessions {
            info!("Running longitudinal pipeline for {} {}", subject, session.session);
            let stage = ReconStage::Longitudinal {
                timepoint: classifier.timepoint_name(&session.session),
                base: classifier.base_name(),
            };
            let long = self.invocation(&subject_dir, &classifier, stage);
            self.run_stage(long, options, report)?;
        }

        if let Some(links) = links {
            links.remove()?;
        }

        let moves = if options.dry_run {
            let moves = reorganizer.expected_moves(&subject_dir, &sessions);
            for m in &moves {
                info!("[dry-run] would move {} -> {}", m.from.display(), m.to.display());
            }
            moves
        } else {
            let moves = reorganizer.plan(&subject_dir)?;
            reorganizer.apply(&moves, options.force)?;
            moves
        };
        report.moved = moves;

        Ok(SubjectOutcome::Completed)
    }

    fn run_stage(
        &self,
        invocation: ReconInvocation,
        options: RunOptions,
        report: &mut SubjectReport,
    ) -> Result<()> {
        let marker = invocation
            .output_dir()
            .join(&self.config.recon.completion_marker);

        if !options.force && marker.is_file() {
            warn!(
                "{} already finished ({} exists), not re-running",
                invocation,
                marker.display()
            );
            return Ok(());
        }

        self.runner.run(&invocation)?;
        report.invocations.push(invocation);
        Ok(())
    }

    fn invocation(
        &self,
        subject_dir: &Path,
        classifier: &FolderClassifier,
        stage: ReconStage,
    ) -> ReconInvocation {
        ReconInvocation {
            subject: classifier.subject().to_string(),
            subjects_dir: subject_dir.to_path_buf(),
            stage,
            extra_args: self.config.recon.extra_args.clone(),
        }
    }
}

fn base_stage(classifier: &FolderClassifier, sessions: &[SessionDerivative]) -> ReconStage {
    ReconStage::Base {
        base: classifier.base_name(),
        timepoints: sessions
            .iter()
            .map(|s| classifier.timepoint_name(&s.session))
            .collect(),
    }
}

/// The subject id is the directory's base name.
pub fn subject_name(subject_dir: &Path) -> String {
    let resolved = fs::canonicalize(subject_dir).unwrap_or_else(|_| subject_dir.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| subject_dir.display().to_string())
}
