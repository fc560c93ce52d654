// file: src/tables/reshape.rs
// description: turns a recon-all stats table keyed by folder name into a (sub, ses, pipeline) table
// reference: column layout expected by the merge step

use crate::error::{Result, WorkflowError};
use crate::extractor::entities::{extract_entity, Entity, PipelineKind};
use crate::models::Table;
use crate::tables::io::{read_table, write_table};
use std::path::Path;
use tracing::{info, warn};

pub const SUBJECT_COLUMN: &str = "subject";

const KEY_COLUMNS: [&str; 3] = ["sub", "ses", "pipeline"];

/// The first column is treated as the folder label (`subject`); it is replaced by
/// `sub`, `ses` and `pipeline`, which lead the remaining columns.
pub fn reshape_measures(table: Table, source: &str) -> Result<Table> {
    if table.headers.is_empty() {
        return Err(WorkflowError::Table {
            file: source.to_string(),
            message: "table has no columns".to_string(),
        });
    }

    let mut headers: Vec<String> = KEY_COLUMNS.iter().map(|k| k.to_string()).collect();

    // derived keys replace same-named source columns
    let kept: Vec<usize> = (1..table.headers.len())
        .filter(|&i| !KEY_COLUMNS.contains(&table.headers[i].as_str()))
        .collect();
    if kept.len() + 1 < table.headers.len() {
        warn!("{}: existing sub/ses/pipeline columns are replaced", source);
    }
    headers.extend(kept.iter().map(|&i| table.headers[i].clone()));

    let mut reshaped = Table::new(headers);

    for row in table.rows {
        let label = row.first().cloned().unwrap_or_default();

        let mut out = Vec::with_capacity(reshaped.width());
        out.push(extract_entity(&label, Entity::Subject).unwrap_or_default());
        out.push(extract_entity(&label, Entity::Session).unwrap_or_default());
        out.push(PipelineKind::classify(&label).as_str().to_string());
        out.extend(kept.iter().map(|&i| row.get(i).cloned().unwrap_or_default()));
        reshaped.push_row(out);
    }

    Ok(reshaped)
}

/// Rewrites `input` in place unless `output` is given.
pub fn process_table_file(input: &Path, output: Option<&Path>, delimiter: u8) -> Result<Table> {
    let source = input.display().to_string();
    let table = read_table(input, delimiter)?;

    info!(
        "Reshaping {} ({} rows, '{}' read as the {} column)",
        source,
        table.len(),
        table.headers.first().map(String::as_str).unwrap_or_default(),
        SUBJECT_COLUMN
    );

    let reshaped = reshape_measures(table, &source)?;
    let destination = output.unwrap_or(input);
    write_table(destination, &reshaped, delimiter)?;

    info!("Wrote reshaped table to {}", destination.display());
    Ok(reshaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_reshape_moves_keys_to_front() {
        let mut table = Table::new(strings(&["Measure:volume", "Left-Hippocampus", "eTIV"]));
        table.push_row(strings(&["sub-01_ses-01", "4012", "1500000"]));
        table.push_row(strings(&["sub-01_ses-01.long.sub-01_base", "4020", "1500010"]));
        table.push_row(strings(&["sub-01_base", "4015", "1500005"]));

        let reshaped = reshape_measures(table, "aseg.csv").unwrap();

        assert_eq!(
            reshaped.headers,
            strings(&["sub", "ses", "pipeline", "Left-Hippocampus", "eTIV"])
        );
        assert_eq!(
            reshaped.rows,
            vec![
                strings(&["sub-01", "ses-01", "cross-sectional", "4012", "1500000"]),
                strings(&["sub-01", "ses-01", "longitudinal", "4020", "1500010"]),
                strings(&["sub-01", "", "base", "4015", "1500005"]),
            ]
        );
    }

    #[test]
    fn test_reshape_replaces_existing_key_columns() {
        let mut table = Table::new(strings(&["label", "ses", "volume", "pipeline"]));
        table.push_row(strings(&["sub-03_ses-02", "stale", "812", "old"]));

        let reshaped = reshape_measures(table, "aseg.csv").unwrap();

        assert_eq!(reshaped.headers, strings(&["sub", "ses", "pipeline", "volume"]));
        assert_eq!(
            reshaped.rows,
            vec![strings(&["sub-03", "ses-02", "cross-sectional", "812"])]
        );
    }

    #[test]
    fn test_reshape_rejects_empty_header() {
        let err = reshape_measures(Table::default(), "empty.csv").unwrap_err();
        assert!(err.to_string().contains("empty.csv"));
    }

    #[test]
    fn test_process_file_in_place() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("aparc.csv");
        fs::write(
            &path,
            "lh.aparc.thickness\tlh_bankssts_thickness\nsub-02_ses-03\t2.51\n",
        )
        .unwrap();

        process_table_file(&path, None, b'\t').unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "sub\tses\tpipeline\tlh_bankssts_thickness\nsub-02\tses-03\tcross-sectional\t2.51\n"
        );
    }

    #[test]
    fn test_process_file_to_separate_output() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.csv");
        let output = temp.path().join("out.csv");
        fs::write(&input, "label\tx\nsub-01_base\t1\n").unwrap();

        let table = process_table_file(&input, Some(&output), b'\t').unwrap();

        assert_eq!(table.rows[0][2], "base");
        assert_eq!(fs::read_to_string(&input).unwrap(), "label\tx\nsub-01_base\t1\n");
        assert!(output.exists());
    }
}
