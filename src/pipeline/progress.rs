// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for longitudinal runs
// reference: uses indicatif for progress bars and tracks per-subject outcomes

use crate::models::SubjectOutcome;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub subjects_total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration_secs: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of attempted (non-skipped) subjects that completed.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.completed + self.failed;
        if attempted == 0 {
            return 0.0;
        }
        (self.completed as f64 / attempted as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    total: usize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn with_color(total_subjects: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();
        let main_bar = create_progress_bar(&multi_progress, total_subjects as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);
        Self::from_bars(total_subjects, main_bar, detail_bar)
    }

    pub fn hidden(total_subjects: usize) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let main_bar = multi_progress.add(ProgressBar::new(total_subjects as u64));
        let detail_bar = multi_progress.add(ProgressBar::new(0));
        Self::from_bars(total_subjects, main_bar, detail_bar)
    }

    fn from_bars(total: usize, main_bar: ProgressBar, detail_bar: ProgressBar) -> Self {
        Self {
            main_bar,
            detail_bar,
            total,
            completed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, outcome: &SubjectOutcome) {
        let counter = match outcome {
            SubjectOutcome::Completed => &self.completed,
            SubjectOutcome::Skipped { .. } => &self.skipped,
            SubjectOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.main_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Longitudinal run complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> RunStats {
        RunStats {
            subjects_total: self.total,
            completed: self.completed.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Completed: {} | Skipped: {} | Failed: {}",
            self.completed.load(Ordering::SeqCst),
            self.skipped.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst)
        );
        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} subjects {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} subjects {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}
