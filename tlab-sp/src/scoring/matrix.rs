//! Confusion matrix and score

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use super::table::LabeledTrip;

/// A prediction joined with the answer for the same trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedLabel {
    pub trip_id: String,
    pub label_student: String,
    pub label_result: String,
}

/// Inner join of predictions and answers on `trip_id`
///
/// Output follows prediction order; a trip present several times on either
/// side yields every combination.
pub fn merge(predictions: &[LabeledTrip], answers: &[LabeledTrip]) -> Vec<MergedLabel> {
    let mut by_trip: HashMap<&str, Vec<&str>> = HashMap::new();
    for answer in answers {
        by_trip
            .entry(answer.trip_id.as_str())
            .or_default()
            .push(answer.label.as_str());
    }

    predictions
        .iter()
        .flat_map(|prediction| {
            by_trip
                .get(prediction.trip_id.as_str())
                .into_iter()
                .flatten()
                .map(move |answer| MergedLabel {
                    trip_id: prediction.trip_id.clone(),
                    label_student: prediction.label.clone(),
                    label_result: answer.to_string(),
                })
        })
        .collect()
}

/// Counts of (student label, answer label) pairs
///
/// Rows are the distinct student labels, columns the distinct answer labels,
/// both sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    pub fn from_merged(merged: &[MergedLabel]) -> Self {
        let rows: Vec<String> = merged
            .iter()
            .map(|m| m.label_student.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: Vec<String> = merged
            .iter()
            .map(|m| m.label_result.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut counts = vec![vec![0u64; columns.len()]; rows.len()];
        for pair in merged {
            // Both labels come from the sets above
            if let (Ok(r), Ok(c)) = (
                rows.binary_search(&pair.label_student),
                columns.binary_search(&pair.label_result),
            ) {
                counts[r][c] += 1;
            }
        }

        Self {
            rows,
            columns,
            counts,
        }
    }

    /// Count for a (student label, answer label) pair
    pub fn count(&self, student: &str, result: &str) -> u64 {
        let row = self.rows.iter().position(|l| l == student);
        let column = self.columns.iter().position(|l| l == result);
        match (row, column) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Pairs where the student label equals the answer label
    pub fn diagonal(&self) -> u64 {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(r, label)| {
                self.columns
                    .binary_search(label)
                    .ok()
                    .map(|c| self.counts[r][c])
            })
            .sum()
    }

    pub fn off_diagonal(&self) -> u64 {
        self.total() - self.diagonal()
    }

    /// `(1 - off_diagonal / total) * 100` rounded to 2 decimals; `None` when empty
    pub fn score(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let score = (1.0 - self.off_diagonal() as f64 / total as f64) * 100.0;
        Some(round2(score))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
