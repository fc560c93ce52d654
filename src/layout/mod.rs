// file: src/layout/mod.rs
// description: subject directory layout module exports
// reference: internal module structure

pub mod classifier;
pub mod scanner;
pub mod symlinks;

pub use classifier::{FolderClassifier, OutputFolder};
pub use scanner::{NiftiScanner, SessionDerivative, SessionScanner};
pub use symlinks::TimepointLinks;
