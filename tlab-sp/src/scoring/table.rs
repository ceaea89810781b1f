//! Two-column label tables (predictions and answer key)

use serde::Serialize;
use tlab_common::store::Row;

/// Column names every label table must have, in order
pub const EXPECTED_COLUMNS: [&str; 2] = ["trip_id", "label"];

/// One labeled trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledTrip {
    pub trip_id: String,
    pub label: String,
}

/// A table as uploaded or stored: a header plus string rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl LabelTable {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Parse CSV text whose first record is the header
    pub fn from_csv(text: &str) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Row>, csv::Error>>()?;

        Ok(Self { columns, rows })
    }

    /// Build from worksheet rows (header first)
    pub fn from_rows(rows: &[Row]) -> Self {
        match rows.split_first() {
            Some((header, data)) => Self {
                columns: header.clone(),
                rows: data.to_vec(),
            },
            None => Self::default(),
        }
    }

    /// Worksheet rows, header first
    pub fn to_rows(&self) -> Vec<Row> {
        std::iter::once(self.columns.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_expected_columns(&self) -> bool {
        self.columns.iter().map(String::as_str).eq(EXPECTED_COLUMNS)
    }

    /// Rows read as (trip_id, label); missing cells read as empty
    pub fn trips(&self) -> Vec<LabeledTrip> {
        self.rows
            .iter()
            .map(|row| LabeledTrip {
                trip_id: row.first().cloned().unwrap_or_default(),
                label: row.get(1).cloned().unwrap_or_default(),
            })
            .collect()
    }
}
