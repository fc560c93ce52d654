// file: src/extractor/entities.rs
// description: BIDS entity lookup and pipeline classification of table labels
// reference: BIDS naming conventions (sub-<label>, ses-<label>)

use crate::extractor::patterns::{SESSION_ENTITY, SUBJECT_ENTITY};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Subject,
    Session,
}

/// Returns the first `sub-*` or `ses-*` label found anywhere in `text`.
pub fn extract_entity(text: &str, entity: Entity) -> Option<String> {
    let pattern = match entity {
        Entity::Subject => &*SUBJECT_ENTITY,
        Entity::Session => &*SESSION_ENTITY,
    };
    pattern.find(text).map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    Longitudinal,
    CrossSectional,
    Base,
}

impl PipelineKind {
    /// `long` anywhere wins; otherwise anything without `_base` is cross-sectional.
    pub fn classify(label: &str) -> Self {
        if label.contains("long") {
            PipelineKind::Longitudinal
        } else if !label.contains("_base") {
            PipelineKind::CrossSectional
        } else {
            PipelineKind::Base
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Longitudinal => "longitudinal",
            PipelineKind::CrossSectional => "cross-sectional",
            PipelineKind::Base => "base",
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
