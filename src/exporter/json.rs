// file: src/exporter/json.rs
// description: json manifest export for longitudinal runs

use crate::error::{Result, WorkflowError};
use crate::pipeline::RunReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ManifestExporter {
    path: PathBuf,
}

impl ManifestExporter {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| WorkflowError::file_operation(parent, e))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export(&self, report: &RunReport, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        }
        .map_err(|e| WorkflowError::Serialization(e.to_string()))?;

        fs::write(&self.path, json).map_err(|e| WorkflowError::file_operation(&self.path, e))?;

        info!(
            "Run manifest with {} subject(s) written to {}",
            report.subjects.len(),
            self.path.display()
        );
        Ok(())
    }
}
