//! Scoring of uploaded predictions
//!
//! Pure functions over label tables: the format check an upload must pass,
//! the join with the answer key, and the confusion matrix with its score.

pub mod format;
pub mod matrix;
pub mod table;

pub use format::{check_csv_format, FormatMismatch};
pub use matrix::{merge, ConfusionMatrix, MergedLabel};
pub use table::{LabelTable, LabeledTrip, EXPECTED_COLUMNS};

use serde::Serialize;

/// Everything shown to a participant about their upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub predictions: Vec<LabeledTrip>,
    pub confusion_matrix: ConfusionMatrix,
    pub score: Option<f64>,
}

/// Score `predictions` against `answer_key`
pub fn evaluate(predictions: &LabelTable, answer_key: &LabelTable) -> Evaluation {
    let predicted = predictions.trips();
    let merged = merge(&predicted, &answer_key.trips());
    let confusion_matrix = ConfusionMatrix::from_merged(&merged);
    let score = confusion_matrix.score();

    Evaluation {
        predictions: predicted,
        confusion_matrix,
        score,
    }
}
