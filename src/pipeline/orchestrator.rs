// file: src/pipeline/orchestrator.rs
// description: runs the longitudinal stages for many subjects with bounded concurrency
// reference: orchestrates blocking per-subject work on the tokio runtime

use crate::config::Config;
use crate::models::{SubjectOutcome, SubjectReport};
use crate::pipeline::processor::{subject_name, RunOptions, SubjectProcessor};
use crate::pipeline::progress::{ProgressTracker, RunStats};
use crate::pipeline::runner::ReconRunner;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    pub program: String,
    pub dry_run: bool,
    pub stats: RunStats,
    pub subjects: Vec<SubjectReport>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.subjects.iter().any(|s| s.outcome.is_failed())
    }
}

pub struct LongitudinalOrchestrator {
    processor: Arc<SubjectProcessor>,
    program: String,
    max_concurrent_tasks: usize,
    show_progress: bool,
    colored: bool,
}

impl LongitudinalOrchestrator {
    pub fn new(config: Config, runner: Arc<dyn ReconRunner>) -> Self {
        let max_concurrent_tasks = config.longitudinal.parallel_workers.max(1);
        let program = runner.program().to_string();

        Self {
            processor: Arc::new(SubjectProcessor::new(config, runner)),
            program,
            max_concurrent_tasks,
            show_progress: true,
            colored: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Reports come back in the order of `subject_dirs`. A directory given more
    /// than once is processed once.
    pub async fn run(&self, subject_dirs: Vec<PathBuf>, options: RunOptions) -> RunReport {
        let started_at = Utc::now().to_rfc3339();
        let subject_dirs = unique_subject_dirs(subject_dirs);
        info!(
            "Starting longitudinal pipeline for {} subject(s) with {} concurrent task(s)",
            subject_dirs.len(),
            self.max_concurrent_tasks
        );

        if subject_dirs.is_empty() {
            warn!("No subject directories given");
        }

        let progress = Arc::new(if self.show_progress {
            ProgressTracker::with_color(subject_dirs.len(), self.colored)
        } else {
            ProgressTracker::hidden(subject_dirs.len())
        });

        let tasks = subject_dirs.into_iter().map(|dir| {
            let processor = self.processor.clone();
            let progress = progress.clone();

            async move {
                progress.set_message(format!("{}", dir.display()));

                let fallback_dir = dir.clone();
                let processed =
                    tokio::task::spawn_blocking(move || processor.process(&dir, options)).await;

                let report = match processed {
                    Ok(report) => report,
                    Err(e) => {
                        error!("Processing task panicked: {}", e);
                        let mut report =
                            SubjectReport::new(subject_name(&fallback_dir), fallback_dir);
                        report.outcome = SubjectOutcome::Failed {
                            error: format!("task panicked: {}", e),
                        };
                        report
                    }
                };

                progress.record(&report.outcome);
                report
            }
        });

        let subjects: Vec<SubjectReport> = stream::iter(tasks)
            .buffered(self.max_concurrent_tasks)
            .collect()
            .await;

        let stats = progress.get_stats();
        progress.finish();

        let report = RunReport {
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            program: self.program.clone(),
            dry_run: options.dry_run,
            stats,
            subjects,
        };

        self.log_final_stats(&report);
        report
    }

    fn log_final_stats(&self, report: &RunReport) {
        let stats = &report.stats;
        info!("=== Longitudinal Run Summary ===");
        info!("Duration: {} seconds", stats.duration_secs);
        info!("Subjects: {}", stats.subjects_total);
        info!("Completed: {}", stats.completed);
        info!("Skipped: {}", stats.skipped);
        info!("Failed: {}", stats.failed);
        info!("Success rate: {:.2}%", stats.success_rate());

        for subject in &report.subjects {
            match &subject.outcome {
                SubjectOutcome::Completed => info!(
                    "  {}: completed ({} recon-all runs, {} folders moved)",
                    subject.subject,
                    subject.invocations.len(),
                    subject.moved.len()
                ),
                SubjectOutcome::Skipped { reason } => {
                    info!("  {}: skipped ({})", subject.subject, reason)
                }
                SubjectOutcome::Failed { error } => {
                    error!("  {}: failed ({})", subject.subject, error)
                }
            }
        }
        info!("================================");
    }
}

/// Keeps the first occurrence of each directory, compared after canonicalizing.
fn unique_subject_dirs(subject_dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(subject_dirs.len());

    for dir in subject_dirs {
        let resolved = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if seen.insert(resolved) {
            unique.push(dir);
        } else {
            warn!("{} was given more than once, processing it once", dir.display());
        }
    }

    unique
}
