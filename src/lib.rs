// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod config;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod layout;
pub mod models;
pub mod pipeline;
pub mod tables;
pub mod utils;

pub use config::{Config, LongitudinalConfig, MetadataConfig, ReconConfig, TablesConfig};
pub use error::{Result, WorkflowError};
pub use exporter::ManifestExporter;
pub use extractor::{MetadataExtractor, PipelineKind};
pub use layout::{FolderClassifier, NiftiScanner, OutputFolder, SessionScanner, TimepointLinks};
pub use models::{AcquisitionRecord, ReconInvocation, SubjectOutcome, SubjectReport, Table};
pub use pipeline::{
    DryRunRunner, LongitudinalOrchestrator, ReconRunner, RunOptions, RunReport, RunStats,
    SubprocessRunner,
};
pub use tables::{TableMerger, process_table_file};
pub use utils::Validator;
