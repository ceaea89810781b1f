//! Backing store abstractions
//!
//! The labeling services persist to either a document store (flat collections
//! of JSON documents) or a spreadsheet (named worksheets of ordered rows). Both
//! are reached through these traits so the services stay independent of the
//! concrete backend; `crate::db` provides the SQLite implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Result;

/// Result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The write happened
    Inserted,
    /// An entry with the same key already existed; nothing was written
    Conflict,
}

/// A stored document and its id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Flat document collections
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of `collection`, in insertion order
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>>;

    /// Store `body` under `id`
    async fn insert(&self, collection: &str, id: &str, body: &Value) -> Result<()>;

    /// Store `body` under `id` unless another document of `collection` was
    /// stored with the same `unique_key`. Check and write are atomic.
    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        body: &Value,
        unique_key: &str,
    ) -> Result<InsertOutcome>;
}

/// A spreadsheet row: one string per cell
pub type Row = Vec<String>;

/// How written cell values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueInputOption {
    /// Stored as typed
    Raw,
    /// Parsed as if typed by a user (formulas are evaluated)
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueInputOption::Raw => "raw",
            ValueInputOption::UserEntered => "user_entered",
        }
    }
}

/// Formatting options for row insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOptions {
    pub value_input: ValueInputOption,
    /// Copy formatting from the row above instead of the row below
    pub inherit_from_before: bool,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            value_input: ValueInputOption::Raw,
            inherit_from_before: false,
        }
    }
}

/// Named worksheets of ordered rows
///
/// Row positions are 1-based; row 1 is the header.
#[async_trait]
pub trait Spreadsheet: Send + Sync {
    /// Titles of all worksheets, in creation order
    async fn worksheet_titles(&self) -> Result<Vec<String>>;

    /// All rows of `sheet` in position order, header included
    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Row>>;

    /// Insert `row` at `position`, shifting rows at and below it down by one
    async fn insert_row(
        &self,
        sheet: &str,
        position: usize,
        row: &[String],
        options: InsertOptions,
    ) -> Result<()>;

    /// Insert `row` unless a data row (below the header) already holds the
    /// same value in `key_column`.
    ///
    /// The default reads then writes and is not atomic; backends with
    /// transactions override it.
    async fn insert_row_unless_present(
        &self,
        sheet: &str,
        position: usize,
        row: &[String],
        options: InsertOptions,
        key_column: usize,
    ) -> Result<InsertOutcome> {
        let key = row.get(key_column).map(String::as_str).unwrap_or_default();
        let rows = self.read_all_rows(sheet).await?;
        let present = rows
            .iter()
            .skip(1)
            .any(|existing| existing.get(key_column).map(String::as_str) == Some(key));
        if present {
            return Ok(InsertOutcome::Conflict);
        }
        self.insert_row(sheet, position, row, options).await?;
        Ok(InsertOutcome::Inserted)
    }

    /// Create worksheet `title` holding `rows`; `Conflict` if the title is taken
    async fn add_worksheet(&self, title: &str, rows: &[Row]) -> Result<InsertOutcome>;
}

/// Rows below the header as header-keyed records
///
/// Short rows yield empty strings for their missing cells.
pub fn records(rows: &[Row]) -> Vec<BTreeMap<String, String>> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };
    data.iter()
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_records_keyed_by_header() {
        let rows = vec![
            row(&["trip_id", "label"]),
            row(&["A", "Chute"]),
            row(&["B"]),
        ];
        let records = records(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["label"], "Chute");
        assert_eq!(records[1]["trip_id"], "B");
        assert_eq!(records[1]["label"], "");
    }

    #[test]
    fn test_records_of_empty_sheet() {
        assert!(records(&[]).is_empty());
        assert!(records(&[row(&["trip_id"])]).is_empty());
    }
}
