//! In-memory, read-only dataset loaded once at startup.
//!
//! Mirrors the columns of the CDC "Nutrition, Physical Activity, and
//! Obesity" survey subset the original implementation was built against:
//! rows that fail to parse their numeric columns are skipped and logged,
//! not treated as a fatal load error.

pub mod compute;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("dataset at {path} has no header row")]
    MissingHeader { path: String },
}

/// One row of the source CSV, with the columns the compute layer needs.
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub index: usize,
    pub year_start: i32,
    pub year_end: i32,
    pub location_abbr: String,
    pub location_desc: String,
    pub datasource: String,
    pub classification: String,
    pub topic: String,
    pub question: String,
    pub data_value: Option<f64>,
    pub stratification_category1: String,
    pub stratification1: String,
}

/// The full, immutable in-memory table.
pub struct Dataset {
    entries: Vec<TableEntry>,
}

// Column indices in the source CSV, matching the original ingestor.
const COL_YEAR_START: usize = 1;
const COL_YEAR_END: usize = 2;
const COL_LOCATION_ABBR: usize = 3;
const COL_LOCATION_DESC: usize = 4;
const COL_DATASOURCE: usize = 5;
const COL_CLASSIFICATION: usize = 6;
const COL_TOPIC: usize = 7;
const COL_QUESTION: usize = 8;
const COL_DATA_VALUE: usize = 11;
const COL_STRAT_CATEGORY1: usize = 30;
const COL_STRAT1: usize = 31;
const MIN_COLUMNS: usize = COL_STRAT1 + 1;

impl Dataset {
    /// Load and parse the dataset from a CSV file at `path`.
    pub fn load(path: &str) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|source| DatasetError::Open {
                path: path.to_string(),
                source,
            })?;

        if reader.headers().is_err() {
            return Err(DatasetError::MissingHeader {
                path: path.to_string(),
            });
        }

        let mut entries = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(row = i, error = %e, "skipping unreadable CSV row");
                    continue;
                }
            };
            match parse_row(i, &record) {
                Some(entry) => entries.push(entry),
                None => warn!(row = i, "skipping row due to malformed columns"),
            }
        }

        Ok(Self { entries })
    }

    /// Build a dataset directly from already-parsed rows. Used by tests and
    /// by any future non-CSV data source.
    pub fn from_entries(entries: Vec<TableEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }
}

fn parse_row(index: usize, record: &csv::StringRecord) -> Option<TableEntry> {
    if record.len() < MIN_COLUMNS {
        return None;
    }
    let year_start: i32 = record.get(COL_YEAR_START)?.parse().ok()?;
    let year_end: i32 = record.get(COL_YEAR_END)?.parse().ok()?;
    let data_value_raw = record.get(COL_DATA_VALUE)?;
    let data_value = if data_value_raw.trim().is_empty() {
        None
    } else {
        Some(data_value_raw.parse::<f64>().ok()?)
    };

    Some(TableEntry {
        index,
        year_start,
        year_end,
        location_abbr: record.get(COL_LOCATION_ABBR)?.to_string(),
        location_desc: record.get(COL_LOCATION_DESC)?.to_string(),
        datasource: record.get(COL_DATASOURCE)?.to_string(),
        classification: record.get(COL_CLASSIFICATION)?.to_string(),
        topic: record.get(COL_TOPIC)?.to_string(),
        question: record.get(COL_QUESTION)?.to_string(),
        data_value,
        stratification_category1: record.get(COL_STRAT_CATEGORY1)?.to_string(),
        stratification1: record.get(COL_STRAT1)?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_row(location: &str, question: &str, value: &str) -> String {
        let mut cols = vec!["idx".to_string(); 32];
        cols[COL_YEAR_START] = "2015".into();
        cols[COL_YEAR_END] = "2015".into();
        cols[COL_LOCATION_ABBR] = location.chars().take(2).collect();
        cols[COL_LOCATION_DESC] = location.to_string();
        cols[COL_DATASOURCE] = "BRFSS".into();
        cols[COL_CLASSIFICATION] = "Obesity / Weight Status".into();
        cols[COL_TOPIC] = "Obesity".into();
        cols[COL_QUESTION] = question.to_string();
        cols[COL_DATA_VALUE] = value.to_string();
        cols[COL_STRAT_CATEGORY1] = "Total".into();
        cols[COL_STRAT1] = "Total".into();
        cols.join(",")
    }

    fn header() -> String {
        (0..32)
            .map(|i| format!("col{i}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn loads_and_skips_malformed_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", header()).unwrap();
        writeln!(file, "{}", sample_row("Alabama", "Q1", "30.5")).unwrap();
        writeln!(file, "{}", sample_row("Alaska", "Q1", "")).unwrap();
        writeln!(file, "not,enough,columns").unwrap();
        file.flush().unwrap();

        let dataset = Dataset::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(dataset.entries().len(), 2);
        assert_eq!(dataset.entries()[0].data_value, Some(30.5));
        assert_eq!(dataset.entries()[1].data_value, None);
    }
}
