// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod acquisition;
pub mod outcome;
pub mod table;

pub use acquisition::{AcquisitionRecord, ACQUISITION_COLUMNS};
pub use outcome::{MovedFolder, ReconInvocation, ReconStage, SubjectOutcome, SubjectReport};
pub use table::Table;
