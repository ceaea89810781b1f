//! Format check of uploaded predictions against the answer key
//!
//! Checks run in a fixed order and the first failure is reported:
//! columns, row count, missing trips, unexpected trips, unexpected labels.

use std::collections::BTreeSet;
use thiserror::Error;

use super::table::LabelTable;

/// Why an upload does not match the answer key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatMismatch {
    #[error(
        "Wrong columns. Expected [trip_id, label], got [{}]. Please upload a CSV file with the correct format.",
        .found.join(", ")
    )]
    WrongColumns { found: Vec<String> },

    #[error(
        "Wrong number of rows. Expected {expected}, got {found}. Please upload a CSV file with the correct format."
    )]
    WrongRowCount { expected: usize, found: usize },

    #[error("Missing trips: {}. Please upload a CSV file with all trips.", join(.0))]
    MissingTrips(BTreeSet<String>),

    #[error(
        "Non expected trips: {}. Please upload a CSV file with only trips from test dataset.",
        join(.0)
    )]
    NonExpectedTrips(BTreeSet<String>),

    #[error(
        "Unexpected labels: {}. Please upload a CSV file with only labels from test dataset: {}.",
        join(.labels),
        join(.expected)
    )]
    UnexpectedLabels {
        labels: BTreeSet<String>,
        expected: BTreeSet<String>,
    },
}

impl FormatMismatch {
    /// Stable snake_case code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            FormatMismatch::WrongColumns { .. } => "wrong_columns",
            FormatMismatch::WrongRowCount { .. } => "wrong_row_count",
            FormatMismatch::MissingTrips(_) => "missing_trips",
            FormatMismatch::NonExpectedTrips(_) => "non_expected_trips",
            FormatMismatch::UnexpectedLabels { .. } => "unexpected_labels",
        }
    }
}

fn join(set: &BTreeSet<String>) -> String {
    format!(
        "{{{}}}",
        set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    )
}

/// Check `predictions` against `answer_key`
pub fn check_csv_format(
    predictions: &LabelTable,
    answer_key: &LabelTable,
) -> Result<(), FormatMismatch> {
    if !predictions.has_expected_columns() {
        return Err(FormatMismatch::WrongColumns {
            found: predictions.columns().to_vec(),
        });
    }

    if predictions.len() != answer_key.len() {
        return Err(FormatMismatch::WrongRowCount {
            expected: answer_key.len(),
            found: predictions.len(),
        });
    }

    let predicted = predictions.trips();
    let expected = answer_key.trips();

    let trips: BTreeSet<String> = predicted.iter().map(|t| t.trip_id.clone()).collect();
    let expected_trips: BTreeSet<String> = expected.iter().map(|t| t.trip_id.clone()).collect();

    let missing: BTreeSet<String> = expected_trips.difference(&trips).cloned().collect();
    if !missing.is_empty() {
        return Err(FormatMismatch::MissingTrips(missing));
    }

    let non_expected: BTreeSet<String> = trips.difference(&expected_trips).cloned().collect();
    if !non_expected.is_empty() {
        return Err(FormatMismatch::NonExpectedTrips(non_expected));
    }

    let labels: BTreeSet<String> = predicted.iter().map(|t| t.label.clone()).collect();
    let expected_labels: BTreeSet<String> = expected.iter().map(|t| t.label.clone()).collect();
    let unexpected: BTreeSet<String> = labels.difference(&expected_labels).cloned().collect();
    if !unexpected.is_empty() {
        return Err(FormatMismatch::UnexpectedLabels {
            labels: unexpected,
            expected: expected_labels,
        });
    }

    Ok(())
}
