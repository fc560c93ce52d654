// file: src/extractor/mod.rs
// description: metadata and entity extraction module exports
// reference: internal module structure

pub mod entities;
pub mod patterns;
pub mod sidecar;

pub use entities::{extract_entity, Entity, PipelineKind};
pub use sidecar::{write_records, MetadataExtractor};
