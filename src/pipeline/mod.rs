// file: src/pipeline/mod.rs
// description: longitudinal pipeline module exports and public api
// reference: pipeline orchestration

mod orchestrator;
mod processor;
mod progress;
pub mod reorganize;
pub mod runner;

pub use orchestrator::{LongitudinalOrchestrator, RunReport};
pub use processor::{subject_name, RunOptions, SubjectProcessor};
pub use progress::{ProgressTracker, RunStats};
pub use reorganize::Reorganizer;
pub use runner::{DryRunRunner, ReconRunner, SubprocessRunner};
