// file: src/layout/symlinks.rs
// description: timepoint symlinks that expose session derivatives under the subjects dir
// reference: recon-all expects every timepoint as <SUBJECTS_DIR>/<tp>

use crate::error::{Result, WorkflowError};
use crate::layout::classifier::FolderClassifier;
use crate::layout::scanner::SessionDerivative;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Links made for one subject; whatever is still held is removed on drop.
#[derive(Debug, Default)]
pub struct TimepointLinks {
    links: Vec<PathBuf>,
}

impl TimepointLinks {
    /// Creates `<subject_dir>/<subject>_<ses>` for each session. A link that already
    /// points at the right derivative folder is adopted; anything else in the way
    /// is a conflict.
    pub fn create(
        subject_dir: &Path,
        classifier: &FolderClassifier,
        sessions: &[SessionDerivative],
    ) -> Result<Self> {
        let mut created = Self::default();

        for session in sessions {
            let link = subject_dir.join(classifier.timepoint_name(&session.session));

            if let Ok(meta) = fs::symlink_metadata(&link) {
                let same_target = meta.file_type().is_symlink()
                    && fs::read_link(&link).is_ok_and(|t| t == session.derivative_dir);

                if !same_target {
                    return Err(WorkflowError::LayoutConflict {
                        path: link,
                        message: format!(
                            "expected a symlink to {}",
                            session.derivative_dir.display()
                        ),
                    });
                }

                debug!("Reusing existing link {}", link.display());
            } else {
                make_link(&session.derivative_dir, &link)?;
                debug!(
                    "Linked {} -> {}",
                    link.display(),
                    session.derivative_dir.display()
                );
            }

            created.links.push(link);
        }

        info!(
            "Symlinks created for {} ({} sessions) in {}",
            classifier.subject(),
            created.links.len(),
            subject_dir.display()
        );
        Ok(created)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.links
    }

    pub fn remove(mut self) -> Result<()> {
        self.remove_all()
    }

    fn remove_all(&mut self) -> Result<()> {
        let mut first_error = None;

        for link in self.links.drain(..) {
            if let Err(e) = remove_link(&link) {
                warn!("Failed to remove symlink {}: {}", link.display(), e);
                first_error.get_or_insert(WorkflowError::file_operation(&link, e));
            } else {
                debug!("Removed symlink {}", link.display());
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for TimepointLinks {
    fn drop(&mut self) {
        if !self.links.is_empty() {
            let _ = self.remove_all();
        }
    }
}

#[cfg(unix)]
fn make_link(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link).map_err(|e| WorkflowError::file_operation(link, e))
}

#[cfg(windows)]
fn make_link(target: &Path, link: &Path) -> Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
        .map_err(|e| WorkflowError::file_operation(link, e))
}

#[cfg(unix)]
fn remove_link(link: &Path) -> std::io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_link(link: &Path) -> std::io::Result<()> {
    fs::remove_dir(link)
}
