// file: src/tables/io.rs
// description: delimited table reading and writing
// reference: https://docs.rs/csv

use crate::error::{Result, WorkflowError};
use crate::models::Table;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::path::Path;
use tracing::debug;

pub fn read_table(path: &Path, delimiter: u8) -> Result<Table> {
    let file = File::open(path).map_err(|e| WorkflowError::file_operation(path, e))?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut table = Table::new(headers);
    let width = table.width();

    for (index, record) in reader.records().enumerate() {
        let record = record?;

        if record.len() > width {
            return Err(WorkflowError::Table {
                file: path.display().to_string(),
                message: format!(
                    "row {} has {} fields but the header has {}",
                    index + 2,
                    record.len(),
                    width
                ),
            });
        }

        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        row.resize(width, String::new());
        table.push_row(row);
    }

    debug!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.width(),
        path.display()
    );
    Ok(table)
}

pub fn write_table(path: &Path, table: &Table, delimiter: u8) -> Result<()> {
    let file = File::create(path).map_err(|e| WorkflowError::file_operation(path, e))?;

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(file);

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| WorkflowError::file_operation(path, e))?;

    debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
