// file: src/tables/merge.rs
// description: right-joins every measurement table in a folder on the key columns
// reference: folder-level merge producing all_measures.csv

use crate::config::TablesConfig;
use crate::error::{Result, WorkflowError};
use crate::models::Table;
use crate::tables::io::{read_table, write_table};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub files_merged: usize,
    pub rows: usize,
    pub columns: usize,
    pub duplicates_dropped: usize,
}

pub struct TableMerger {
    keys: Vec<String>,
    delimiter: u8,
    merged_file_name: String,
}

impl TableMerger {
    pub fn new(config: &TablesConfig) -> Result<Self> {
        Ok(Self {
            keys: config.key_columns.clone(),
            delimiter: config.delimiter_byte()?,
            merged_file_name: config.merged_file_name.clone(),
        })
    }

    /// Returns `None` when the folder holds no `.csv` files.
    pub fn merge_folder(&self, folder: &Path) -> Result<Option<MergeSummary>> {
        if !folder.is_dir() {
            return Err(WorkflowError::Validation(format!(
                "The folder '{}' does not exist or is not a directory.",
                folder.display()
            )));
        }

        let inputs = self.collect_inputs(folder)?;
        if inputs.is_empty() {
            warn!("No .csv tables in {}", folder.display());
            return Ok(None);
        }

        info!("Merging {} tables from {}", inputs.len(), folder.display());
        let mut merged = self.merge_files(&inputs)?;

        let duplicates_dropped = merged.dedup_by_keys(&self.keys, &folder.display().to_string())?;
        if duplicates_dropped > 0 {
            info!("Dropped {} duplicate rows", duplicates_dropped);
        }

        let output = self.output_path(folder);
        if output.exists() {
            debug!("Removing previous {}", output.display());
            fs::remove_file(&output).map_err(|e| WorkflowError::file_operation(&output, e))?;
        }
        write_table(&output, &merged, self.delimiter)?;

        info!(
            "Wrote {} rows x {} columns to {}",
            merged.len(),
            merged.width(),
            output.display()
        );

        Ok(Some(MergeSummary {
            output,
            files_merged: inputs.len(),
            rows: merged.len(),
            columns: merged.width(),
            duplicates_dropped,
        }))
    }

    pub fn collect_inputs(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(folder).map_err(|e| WorkflowError::file_operation(folder, e))?;

        let mut inputs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WorkflowError::file_operation(folder, e))?;
            let path = entry.path();
            let is_csv = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".csv"));

            if is_csv && path.is_file() {
                inputs.push(path);
            }
        }

        inputs.sort();
        Ok(inputs)
    }

    pub fn merge_files(&self, inputs: &[PathBuf]) -> Result<Table> {
        let Some((first, rest)) = inputs.split_first() else {
            return Err(WorkflowError::Validation("No tables to merge".to_string()));
        };

        let first_source = first.display().to_string();
        let mut merged = read_table(first, self.delimiter)?;
        for key in &self.keys {
            merged.require_column(key, &first_source)?;
        }

        for path in rest {
            let right = read_table(path, self.delimiter)?;
            merged = right_join(&merged, &right, &self.keys, &path.display().to_string())?;
            debug!(
                "After {}: {} rows x {} columns",
                path.display(),
                merged.len(),
                merged.width()
            );
        }

        Ok(merged)
    }

    /// `all_measures.csv` lands next to the folder, not inside it.
    pub fn output_path(&self, folder: &Path) -> PathBuf {
        let parent = match folder.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        parent.join(&self.merged_file_name)
    }
}

/// Right join of `left` and `right` on `keys`.
///
/// Every right row yields one output row per matching left row (or one row with
/// empty left cells when nothing matches), in right-table order. Key cells come
/// from the right row. Columns are the left columns followed by right-only
/// columns; a non-key column present on both sides is kept once, taking the left
/// cell unless it is empty.
pub fn right_join(left: &Table, right: &Table, keys: &[String], right_source: &str) -> Result<Table> {
    let left_keys = keys
        .iter()
        .map(|k| left.require_column(k, "merged table"))
        .collect::<Result<Vec<_>>>()?;
    let right_keys = keys
        .iter()
        .map(|k| right.require_column(k, right_source))
        .collect::<Result<Vec<_>>>()?;

    let mut headers = left.headers.clone();
    let mut placement = Vec::with_capacity(right.width());
    for name in &right.headers {
        match left.column_index(name) {
            Some(pos) => placement.push(pos),
            None => {
                placement.push(headers.len());
                headers.push(name.clone());
            }
        }
    }

    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (i, row) in left.rows.iter().enumerate() {
        index.entry(left.key_of(row, &left_keys)).or_default().push(i);
    }

    let mut joined = Table::new(headers);
    let width = joined.width();
    let empty_left = vec![String::new(); left.width()];

    for right_row in &right.rows {
        let key = right.key_of(right_row, &right_keys);
        let matches: Vec<&Vec<String>> = match index.get(&key) {
            Some(rows) => rows.iter().map(|&i| &left.rows[i]).collect(),
            None => vec![&empty_left],
        };

        for left_row in matches {
            let mut row = left_row.clone();
            row.resize(width, String::new());

            for (j, value) in right_row.iter().enumerate() {
                let pos = placement[j];
                let is_key = right_keys.contains(&j);
                if is_key || pos >= left.width() || row[pos].is_empty() {
                    row[pos] = value.clone();
                }
            }

            joined.push_row(row);
        }
    }

    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn keys() -> Vec<String> {
        strings(&["sub", "ses", "pipeline"])
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(strings(headers));
        for row in rows {
            t.push_row(strings(row));
        }
        t
    }

    #[test]
    fn test_right_join_follows_right_rows() {
        let left = table(
            &["sub", "ses", "pipeline", "hippo"],
            &[
                &["sub-01", "ses-01", "cross-sectional", "4000"],
                &["sub-02", "ses-01", "cross-sectional", "4100"],
            ],
        );
        let right = table(
            &["sub", "ses", "pipeline", "thickness"],
            &[
                &["sub-02", "ses-01", "cross-sectional", "2.4"],
                &["sub-03", "ses-01", "cross-sectional", "2.6"],
            ],
        );

        let joined = right_join(&left, &right, &keys(), "right.csv").unwrap();

        assert_eq!(
            joined.headers,
            strings(&["sub", "ses", "pipeline", "hippo", "thickness"])
        );
        assert_eq!(
            joined.rows,
            vec![
                strings(&["sub-02", "ses-01", "cross-sectional", "4100", "2.4"]),
                strings(&["sub-03", "ses-01", "cross-sectional", "", "2.6"]),
            ]
        );
    }

    #[test]
    fn test_overlapping_column_kept_once_preferring_left() {
        let left = table(
            &["sub", "ses", "pipeline", "eTIV"],
            &[&["sub-01", "ses-01", "base", "1500"]],
        );
        let right = table(
            &["sub", "ses", "pipeline", "eTIV", "wm"],
            &[
                &["sub-01", "ses-01", "base", "1499", "10"],
                &["sub-04", "ses-01", "base", "1600", "11"],
            ],
        );

        let joined = right_join(&left, &right, &keys(), "right.csv").unwrap();

        assert_eq!(joined.headers, strings(&["sub", "ses", "pipeline", "eTIV", "wm"]));
        assert_eq!(joined.rows[0], strings(&["sub-01", "ses-01", "base", "1500", "10"]));
        assert_eq!(joined.rows[1], strings(&["sub-04", "ses-01", "base", "1600", "11"]));
    }

    #[test]
    fn test_multiple_left_matches_expand() {
        let left = table(
            &["sub", "ses", "pipeline", "run"],
            &[
                &["sub-01", "ses-01", "base", "a"],
                &["sub-01", "ses-01", "base", "b"],
            ],
        );
        let right = table(
            &["sub", "ses", "pipeline", "x"],
            &[&["sub-01", "ses-01", "base", "1"]],
        );

        let joined = right_join(&left, &right, &keys(), "right.csv").unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.rows[0][3], "a");
        assert_eq!(joined.rows[1][3], "b");
    }

    #[test]
    fn test_missing_key_column_names_file() {
        let left = table(&["sub", "ses", "pipeline"], &[]);
        let right = table(&["sub", "ses"], &[]);

        let err = right_join(&left, &right, &keys(), "bad.csv").unwrap_err();
        assert!(err.to_string().contains("bad.csv"));
        assert!(err.to_string().contains("pipeline"));
    }

    #[test]
    fn test_merge_folder_writes_next_to_folder() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("measures");
        fs::create_dir(&folder).unwrap();
        fs::write(
            folder.join("a_aseg.csv"),
            "sub\tses\tpipeline\thippo\nsub-01\tses-01\tbase\t4000\nsub-01\tses-02\tbase\t4010\n",
        )
        .unwrap();
        fs::write(
            folder.join("b_aparc.csv"),
            "sub\tses\tpipeline\tthick\nsub-01\tses-01\tbase\t2.5\nsub-01\tses-01\tbase\t2.7\n",
        )
        .unwrap();
        fs::write(folder.join("notes.txt"), "ignored").unwrap();
        fs::write(temp.path().join("all_measures.csv"), "stale").unwrap();

        let merger = TableMerger::new(&Config::default_config().tables).unwrap();
        let summary = merger.merge_folder(&folder).unwrap().unwrap();

        assert_eq!(summary.output, temp.path().join("all_measures.csv"));
        assert_eq!(summary.files_merged, 2);
        assert_eq!(summary.duplicates_dropped, 1);
        assert_eq!(
            fs::read_to_string(&summary.output).unwrap(),
            "sub\tses\tpipeline\thippo\tthick\nsub-01\tses-01\tbase\t4000\t2.5\n"
        );
    }

    #[test]
    fn test_merge_folder_without_tables() {
        let temp = TempDir::new().unwrap();
        let merger = TableMerger::new(&Config::default_config().tables).unwrap();

        assert!(merger.merge_folder(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_merge_folder_rejects_missing_folder() {
        let merger = TableMerger::new(&Config::default_config().tables).unwrap();
        let err = merger.merge_folder(Path::new("/nonexistent/measures")).unwrap_err();
        assert!(err.to_string().contains("does not exist or is not a directory"));
    }

    #[test]
    fn test_output_path_for_relative_folder() {
        let merger = TableMerger::new(&Config::default_config().tables).unwrap();
        assert_eq!(
            merger.output_path(Path::new("measures/")),
            PathBuf::from("./all_measures.csv")
        );
        assert_eq!(
            merger.output_path(Path::new("/data/study/measures")),
            PathBuf::from("/data/study/all_measures.csv")
        );
    }
}
