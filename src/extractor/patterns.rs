// file: src/extractor/patterns.rs
// description: compiled regex patterns for BIDS entities and recon-all folder names
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // BIDS entities
    pub static ref SUBJECT_ENTITY: Regex = Regex::new(
        r"sub-[a-zA-Z0-9]+"
    ).expect("SUBJECT_ENTITY regex is valid");

    pub static ref SESSION_ENTITY: Regex = Regex::new(
        r"ses-[a-zA-Z0-9]+"
    ).expect("SESSION_ENTITY regex is valid");

    // recon-all longitudinal output: <timepoint>.long.<base>
    pub static ref LONG_FOLDER: Regex = Regex::new(
        r"^(?P<timepoint>[^.]+)\.long\.(?P<base>.+)$"
    ).expect("LONG_FOLDER regex is valid");

    // NIfTI images, optionally gzipped
    pub static ref NIFTI_FILE: Regex = Regex::new(
        r"(?i)\.nii(\.gz)?$"
    ).expect("NIFTI_FILE regex is valid");
}

pub fn is_nifti(file_name: &str) -> bool {
    NIFTI_FILE.is_match(file_name)
}

/// Strips `.nii` / `.nii.gz` from a file name.
pub fn nifti_stem(file_name: &str) -> &str {
    match NIFTI_FILE.find(file_name) {
        Some(m) => &file_name[..m.start()],
        None => file_name,
    }
}
