// file: src/models/table.rs
// description: in-memory string table with named columns
// reference: internal data structures

use crate::error::{Result, WorkflowError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like `column_index` but reports the table's `source` when absent.
    pub fn require_column(&self, name: &str, source: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| WorkflowError::MissingColumn {
                file: source.to_string(),
                column: name.to_string(),
            })
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn key_of(&self, row: &[String], key_indices: &[usize]) -> Vec<String> {
        key_indices.iter().map(|&i| row[i].clone()).collect()
    }

    /// Keeps the first row for each distinct value of `keys`.
    pub fn dedup_by_keys(&mut self, keys: &[String], source: &str) -> Result<usize> {
        let indices = keys
            .iter()
            .map(|k| self.require_column(k, source))
            .collect::<Result<Vec<_>>>()?;

        let before = self.rows.len();
        let mut seen = std::collections::HashSet::new();
        let rows = std::mem::take(&mut self.rows);
        for row in rows {
            let key: Vec<String> = indices.iter().map(|&i| row[i].clone()).collect();
            if seen.insert(key) {
                self.rows.push(row);
            }
        }

        Ok(before - self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_require_column_reports_source() {
        let table = Table::new(strings(&["sub", "ses"]));
        assert_eq!(table.require_column("ses", "a.csv").unwrap(), 1);

        let err = table.require_column("pipeline", "a.csv").unwrap_err();
        assert!(err.to_string().contains("a.csv"));
        assert!(err.to_string().contains("pipeline"));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut table = Table::new(strings(&["sub", "ses", "value"]));
        table.push_row(strings(&["sub-01", "ses-01", "1"]));
        table.push_row(strings(&["sub-01", "ses-02", "2"]));
        table.push_row(strings(&["sub-01", "ses-01", "3"]));

        let removed = table
            .dedup_by_keys(&strings(&["sub", "ses"]), "test")
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][2], "1");
        assert_eq!(table.rows[1][2], "2");
    }
}
