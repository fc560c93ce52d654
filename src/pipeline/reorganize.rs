// file: src/pipeline/reorganize.rs
// description: moves recon-all base and longitudinal folders into derivatives/longitudinal
// reference: session derivative layout <ses>/derivatives/<subject>

use crate::config::LongitudinalConfig;
use crate::error::{Result, WorkflowError};
use crate::layout::{FolderClassifier, OutputFolder, SessionDerivative};
use crate::models::MovedFolder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct Reorganizer<'a> {
    classifier: &'a FolderClassifier,
    config: &'a LongitudinalConfig,
}

impl<'a> Reorganizer<'a> {
    pub fn new(classifier: &'a FolderClassifier, config: &'a LongitudinalConfig) -> Self {
        Self { classifier, config }
    }

    /// `<subject_dir>/<ses>/derivatives/longitudinal` for a session, or the
    /// subject-level one for the base template.
    pub fn destination_dir(&self, subject_dir: &Path, folder: &OutputFolder) -> PathBuf {
        let root = match folder {
            OutputFolder::Base => subject_dir.to_path_buf(),
            OutputFolder::Longitudinal { session } => subject_dir.join(session),
        };
        root.join(&self.config.derivatives_dir)
            .join(&self.config.longitudinal_dir)
    }

    /// Where a session's longitudinal folder ends up once reorganized.
    pub fn final_long_path(&self, subject_dir: &Path, session: &str) -> PathBuf {
        let folder = OutputFolder::Longitudinal {
            session: session.to_string(),
        };
        self.destination_dir(subject_dir, &folder)
            .join(self.classifier.long_name(session))
    }

    pub fn plan(&self, subject_dir: &Path) -> Result<Vec<MovedFolder>> {
        let entries =
            fs::read_dir(subject_dir).map_err(|e| WorkflowError::file_operation(subject_dir, e))?;

        let mut moves = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WorkflowError::file_operation(subject_dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| WorkflowError::file_operation(entry.path(), e))?;

            // symlinks report their own type here, so timepoint links never move
            if !file_type.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let Some(folder) = self.classifier.classify(&name) else {
                continue;
            };

            moves.push(MovedFolder {
                from: entry.path(),
                to: self.destination_dir(subject_dir, &folder).join(&name),
            });
        }

        moves.sort_by(|a, b| a.from.cmp(&b.from));
        debug!("Planned {} moves in {}", moves.len(), subject_dir.display());
        Ok(moves)
    }

    /// Moves a full run over `sessions` would produce, whether or not the
    /// folders exist yet. Used when nothing is actually run.
    pub fn expected_moves(
        &self,
        subject_dir: &Path,
        sessions: &[SessionDerivative],
    ) -> Vec<MovedFolder> {
        let mut moves = vec![MovedFolder {
            from: subject_dir.join(self.classifier.base_name()),
            to: self
                .destination_dir(subject_dir, &OutputFolder::Base)
                .join(self.classifier.base_name()),
        }];

        for session in sessions {
            let name = self.classifier.long_name(&session.session);
            moves.push(MovedFolder {
                from: subject_dir.join(&name),
                to: self.final_long_path(subject_dir, &session.session),
            });
        }

        moves.sort_by(|a, b| a.from.cmp(&b.from));
        moves
    }

    /// With `force` an existing destination is replaced; otherwise it is a conflict.
    pub fn apply(&self, moves: &[MovedFolder], force: bool) -> Result<()> {
        for m in moves {
            if fs::symlink_metadata(&m.to).is_ok() {
                if !force {
                    return Err(WorkflowError::LayoutConflict {
                        path: m.to.clone(),
                        message: format!("destination exists, not moving {}", m.from.display()),
                    });
                }
                info!("Replacing {}", m.to.display());
                fs::remove_dir_all(&m.to).map_err(|e| WorkflowError::file_operation(&m.to, e))?;
            }

            if let Some(parent) = m.to.parent() {
                fs::create_dir_all(parent).map_err(|e| WorkflowError::file_operation(parent, e))?;
            }

            fs::rename(&m.from, &m.to).map_err(|e| WorkflowError::file_operation(&m.from, e))?;
            info!("Moved {} -> {}", m.from.display(), m.to.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let subject_dir = temp.path().join("sub-01");
        for name in [
            "sub-01_base",
            "sub-01_ses-01.long.sub-01_base",
            "sub-01_ses-02.long.sub-01_base",
            "sub-02_base",
            "fsaverage",
        ] {
            fs::create_dir_all(subject_dir.join(name).join("scripts")).unwrap();
        }
        (temp, subject_dir)
    }

    #[test]
    fn test_plan_targets_session_and_subject_dirs() {
        let (_temp, subject_dir) = setup();
        let config = Config::default_config().longitudinal;
        let classifier = FolderClassifier::new("sub-01", "ses-");
        let reorganizer = Reorganizer::new(&classifier, &config);

        let moves = reorganizer.plan(&subject_dir).unwrap();
        let targets: Vec<PathBuf> = moves.iter().map(|m| m.to.clone()).collect();

        assert_eq!(
            targets,
            vec![
                subject_dir.join("derivatives/longitudinal/sub-01_base"),
                subject_dir.join("ses-01/derivatives/longitudinal/sub-01_ses-01.long.sub-01_base"),
                subject_dir.join("ses-02/derivatives/longitudinal/sub-01_ses-02.long.sub-01_base"),
            ]
        );
    }

    #[test]
    fn test_apply_moves_folders() {
        let (_temp, subject_dir) = setup();
        let config = Config::default_config().longitudinal;
        let classifier = FolderClassifier::new("sub-01", "ses-");
        let reorganizer = Reorganizer::new(&classifier, &config);

        let moves = reorganizer.plan(&subject_dir).unwrap();
        reorganizer.apply(&moves, false).unwrap();

        assert!(!subject_dir.join("sub-01_base").exists());
        assert!(subject_dir.join("sub-02_base").exists());
        assert!(reorganizer.final_long_path(&subject_dir, "ses-02").join("scripts").is_dir());
    }

    #[test]
    fn test_apply_conflict_without_force() {
        let (_temp, subject_dir) = setup();
        let config = Config::default_config().longitudinal;
        let classifier = FolderClassifier::new("sub-01", "ses-");
        let reorganizer = Reorganizer::new(&classifier, &config);
        fs::create_dir_all(subject_dir.join("derivatives/longitudinal/sub-01_base")).unwrap();

        let moves = reorganizer.plan(&subject_dir).unwrap();
        let err = reorganizer.apply(&moves, false).unwrap_err();
        assert!(matches!(err, WorkflowError::LayoutConflict { .. }));

        reorganizer.apply(&moves, true).unwrap();
        assert!(subject_dir.join("derivatives/longitudinal/sub-01_base/scripts").is_dir());
    }

    #[test]
    fn test_expected_moves_match_real_plan() {
        let (_temp, subject_dir) = setup();
        let config = Config::default_config().longitudinal;
        let classifier = FolderClassifier::new("sub-01", "ses-");
        let reorganizer = Reorganizer::new(&classifier, &config);
        let sessions: Vec<SessionDerivative> = ["ses-01", "ses-02"]
            .iter()
            .map(|ses| SessionDerivative {
                session: ses.to_string(),
                derivative_dir: subject_dir.join(ses).join("derivatives/sub-01"),
            })
            .collect();

        let expected = reorganizer.expected_moves(&subject_dir, &sessions);
        let planned = reorganizer.plan(&subject_dir).unwrap();

        assert_eq!(expected, planned);
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_ignores_symlinks() {
        let (_temp, subject_dir) = setup();
        let config = Config::default_config().longitudinal;
        let classifier = FolderClassifier::new("sub-01", "ses-");
        let target = subject_dir.join("sub-02_base");
        fs::remove_dir_all(subject_dir.join("sub-01_base")).unwrap();
        std::os::unix::fs::symlink(&target, subject_dir.join("sub-01_base")).unwrap();

        let moves = Reorganizer::new(&classifier, &config).plan(&subject_dir).unwrap();
        assert_eq!(moves.len(), 2);
    }
}
