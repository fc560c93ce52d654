// file: src/layout/classifier.rs
// description: naming contract for recon-all timepoint, base and longitudinal folders
// reference: recon-all longitudinal stream naming (<tp>.long.<base>)

use crate::extractor::patterns::LONG_FOLDER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFolder {
    /// `<subject>_base`
    Base,
    /// `<subject>_<session>.long.<subject>_base`
    Longitudinal { session: String },
}

pub struct FolderClassifier {
    subject: String,
    session_prefix: String,
}

impl FolderClassifier {
    pub fn new(subject: impl Into<String>, session_prefix: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            session_prefix: session_prefix.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn base_name(&self) -> String {
        format!("{}_base", self.subject)
    }

    pub fn timepoint_name(&self, session: &str) -> String {
        format!("{}_{}", self.subject, session)
    }

    pub fn long_name(&self, session: &str) -> String {
        format!("{}.long.{}", self.timepoint_name(session), self.base_name())
    }

    /// Folders of other subjects, or that merely contain `_base`/`.long.`, are `None`.
    pub fn classify(&self, name: &str) -> Option<OutputFolder> {
        if name == self.base_name() {
            return Some(OutputFolder::Base);
        }

        let caps = LONG_FOLDER.captures(name)?;
        if caps["base"] != self.base_name() {
            return None;
        }

        let session = caps["timepoint"]
            .strip_prefix(&self.subject)?
            .strip_prefix('_')?;

        let label = session.strip_prefix(&self.session_prefix)?;
        if label.is_empty() {
            return None;
        }

        Some(OutputFolder::Longitudinal {
            session: session.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> FolderClassifier {
        FolderClassifier::new("sub-01", "ses-")
    }

    #[test]
    fn test_names() {
        let c = classifier();
        assert_eq!(c.base_name(), "sub-01_base");
        assert_eq!(c.timepoint_name("ses-02"), "sub-01_ses-02");
        assert_eq!(c.long_name("ses-02"), "sub-01_ses-02.long.sub-01_base");
    }

    #[test]
    fn test_classify_base_and_long() {
        let c = classifier();
        assert_eq!(c.classify("sub-01_base"), Some(OutputFolder::Base));
        assert_eq!(
            c.classify("sub-01_ses-02.long.sub-01_base"),
            Some(OutputFolder::Longitudinal {
                session: "ses-02".to_string()
            })
        );
    }

    #[test]
    fn test_classify_rejects_lookalikes() {
        let c = classifier();
        assert_eq!(c.classify("sub-01_ses-01"), None);
        assert_eq!(c.classify("sub-02_base"), None);
        assert_eq!(c.classify("sub-01_base_old"), None);
        assert_eq!(c.classify("sub-02_ses-01.long.sub-02_base"), None);
        assert_eq!(c.classify("sub-01_ses-01.long.sub-01_base2"), None);
        assert_eq!(c.classify("sub-01_ses-.long.sub-01_base"), None);
        assert_eq!(c.classify("sub-011_ses-01.long.sub-01_base"), None);
    }
}
