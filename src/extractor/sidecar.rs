// file: src/extractor/sidecar.rs
// description: acquisition metadata extraction from BIDS JSON sidecars
// reference: https://docs.rs/serde_json

use crate::config::MetadataConfig;
use crate::error::{Result, WorkflowError};
use crate::extractor::entities::{extract_entity, Entity};
use crate::extractor::patterns::nifti_stem;
use crate::models::{AcquisitionRecord, ACQUISITION_COLUMNS};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sidecar key for each metadata column, and whether a sidecar must carry it.
const SIDECAR_FIELDS: [(&str, &str, bool); 9] = [
    ("mrtype", "MRAcquisitionType", true),
    ("description", "SeriesDescription", true),
    ("thickness", "SliceThickness", true),
    ("sar", "SAR", true),
    ("TE", "EchoTime", true),
    ("TR", "RepetitionTime", true),
    ("flip", "FlipAngle", true),
    ("direction", "ImageOrientationPatientDICOM", true),
    ("field_strength", "MagneticFieldStrength", false),
];

pub struct MetadataExtractor {
    strict: bool,
}

impl MetadataExtractor {
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            strict: config.strict,
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn extract_all(&self, images: &[PathBuf]) -> Result<Vec<AcquisitionRecord>> {
        let mut records = Vec::with_capacity(images.len());

        for image in images {
            if let Some(record) = self.extract(image)? {
                records.push(record);
            }
        }

        info!(
            "Extracted metadata for {} of {} images",
            records.len(),
            images.len()
        );
        Ok(records)
    }

    /// `Ok(None)` means the image was skipped: no sidecar, or no subject in its path.
    pub fn extract(&self, image: &Path) -> Result<Option<AcquisitionRecord>> {
        let root = image_dir(image);

        let Some(sidecar) = Self::locate_sidecar(image)? else {
            warn!("No JSON sidecar next to {}, skipping", image.display());
            return Ok(None);
        };

        let root_str = root.to_string_lossy();
        let Some(sub) = extract_entity(&root_str, Entity::Subject) else {
            warn!("No sub-<label> in {}, skipping", root.display());
            return Ok(None);
        };
        let ses = extract_entity(&root_str, Entity::Session).unwrap_or_default();

        let fields = Self::read_sidecar(&sidecar)?;
        debug!("Reading {} keys from {}", fields.len(), sidecar.display());

        let mut record = AcquisitionRecord::new(sub, ses, sidecar.clone());
        for (column, key, required) in SIDECAR_FIELDS {
            let value = match fields.get(key) {
                Some(value) => render_value(value),
                None if required && self.strict => {
                    return Err(WorkflowError::MissingField {
                        path: sidecar,
                        field: key.to_string(),
                    });
                }
                None => {
                    if required {
                        warn!("{} has no {}", sidecar.display(), key);
                    }
                    String::new()
                }
            };
            if let Some(cell) = record.column_mut(column) {
                *cell = value;
            }
        }

        Ok(Some(record))
    }

    /// Prefers `<stem>.json`, otherwise the first `.json` in the image's folder by name.
    pub fn locate_sidecar(image: &Path) -> Result<Option<PathBuf>> {
        let root = image_dir(image);

        if let Some(name) = image.file_name().and_then(|n| n.to_str()) {
            let paired = root.join(format!("{}.json", nifti_stem(name)));
            if paired.is_file() {
                return Ok(Some(paired));
            }
        }

        let entries = fs::read_dir(root).map_err(|e| WorkflowError::file_operation(root, e))?;
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        candidates.sort();

        Ok(candidates.into_iter().next())
    }

    fn read_sidecar(path: &Path) -> Result<Map<String, Value>> {
        let content = fs::read_to_string(path).map_err(|e| WorkflowError::file_operation(path, e))?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(WorkflowError::Validation(format!(
                "Sidecar {} is not a JSON object",
                path.display()
            ))),
            Err(source) => Err(WorkflowError::SidecarParse {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

fn image_dir(image: &Path) -> &Path {
    match image.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Strings are written bare; arrays become `[a, b, c]`.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", inner.join(", "))
        }
        other => other.to_string(),
    }
}

pub fn write_records(path: &Path, records: &[AcquisitionRecord]) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| WorkflowError::file_operation(path, e))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    writer.write_record(ACQUISITION_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .map_err(|e| WorkflowError::file_operation(path, e))?;

    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
