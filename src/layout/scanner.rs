// file: src/layout/scanner.rs
// description: NIfTI discovery and per-subject session discovery
// reference: https://docs.rs/walkdir

use crate::config::LongitudinalConfig;
use crate::error::{Result, WorkflowError};
use crate::extractor::patterns::is_nifti;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Walks a dataset for images whose file name contains `pattern`.
pub struct NiftiScanner {
    pattern: String,
}

impl NiftiScanner {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn scan_directory(&self, root: &Path) -> Result<Vec<PathBuf>> {
        info!("Scanning {} for *{}*.nii[.gz]", root.display(), self.pattern);
        let mut images = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if name.contains(&self.pattern) && is_nifti(&name) {
                images.push(entry.path().to_path_buf());
            } else {
                debug!("Skipping file: {}", entry.path().display());
            }
        }

        info!("Found {} images", images.len());
        Ok(images)
    }
}

/// One session of a subject with prior cross-sectional output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDerivative {
    pub session: String,
    pub derivative_dir: PathBuf,
}

pub struct SessionScanner {
    config: LongitudinalConfig,
}

impl SessionScanner {
    pub fn new(config: LongitudinalConfig) -> Self {
        Self { config }
    }

    /// Sessions under `subject_dir` holding `<derivatives>/<subject>`, sorted by name.
    pub fn discover(&self, subject_dir: &Path, subject: &str) -> Result<Vec<SessionDerivative>> {
        let entries =
            fs::read_dir(subject_dir).map_err(|e| WorkflowError::file_operation(subject_dir, e))?;

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WorkflowError::file_operation(subject_dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();

            if !name.starts_with(&self.config.session_prefix) || !entry.path().is_dir() {
                continue;
            }

            let derivative_dir = entry
                .path()
                .join(&self.config.derivatives_dir)
                .join(subject);

            if derivative_dir.is_dir() {
                sessions.push(SessionDerivative {
                    session: name,
                    derivative_dir,
                });
            } else {
                debug!(
                    "Session {} of {} has no {}",
                    name,
                    subject,
                    derivative_dir.display()
                );
            }
        }

        sessions.sort_by(|a, b| a.session.cmp(&b.session));
        Ok(sessions)
    }
}
