// file: src/models/acquisition.rs
// description: one row of the acquisition metadata table built from a JSON sidecar
// reference: BIDS sidecar keys as exported by dcm2niix

use serde::Serialize;
use std::path::PathBuf;

/// Column order of the metadata table; `serde` renames map fields onto it.
pub const ACQUISITION_COLUMNS: [&str; 11] = [
    "sub",
    "ses",
    "mrtype",
    "description",
    "thickness",
    "sar",
    "TE",
    "TR",
    "flip",
    "direction",
    "field_strength",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AcquisitionRecord {
    pub sub: String,
    pub ses: String,
    pub mrtype: String,
    pub description: String,
    pub thickness: String,
    pub sar: String,
    #[serde(rename = "TE")]
    pub echo_time: String,
    #[serde(rename = "TR")]
    pub repetition_time: String,
    pub flip: String,
    pub direction: String,
    pub field_strength: String,
    #[serde(skip)]
    pub sidecar: PathBuf,
}

impl AcquisitionRecord {
    pub fn new(sub: String, ses: String, sidecar: PathBuf) -> Self {
        Self {
            sub,
            ses,
            sidecar,
            ..Default::default()
        }
    }

    /// Mutable access to a sidecar-derived cell by its column name.
    pub fn column_mut(&mut self, column: &str) -> Option<&mut String> {
        match column {
            "mrtype" => Some(&mut self.mrtype),
            "description" => Some(&mut self.description),
            "thickness" => Some(&mut self.thickness),
            "sar" => Some(&mut self.sar),
            "TE" => Some(&mut self.echo_time),
            "TR" => Some(&mut self.repetition_time),
            "flip" => Some(&mut self.flip),
            "direction" => Some(&mut self.direction),
            "field_strength" => Some(&mut self.field_strength),
            _ => None,
        }
    }
}
