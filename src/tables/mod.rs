// file: src/tables/mod.rs
// description: measurement table module exports
// reference: internal module structure

pub mod io;
pub mod merge;
pub mod reshape;

pub use io::{read_table, write_table};
pub use merge::{right_join, MergeSummary, TableMerger};
pub use reshape::{process_table_file, reshape_measures};
