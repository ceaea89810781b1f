//! Prediction upload and evaluation endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::scoring::{check_csv_format, evaluate, Evaluation, LabelTable};
use crate::AppState;

use super::ParticipantToken;

/// GET /api/predictions
///
/// The stored upload scored against the answer key; 404 before any upload.
pub async fn get_predictions(
    State(state): State<AppState>,
    Extension(ParticipantToken(token)): Extension<ParticipantToken>,
) -> ApiResult<Json<Evaluation>> {
    let predictions = state
        .workbook
        .predictions(&token)
        .await?
        .ok_or_else(|| ApiError::NotFound("No predictions submitted yet".to_string()))?;
    let answer_key = state.workbook.answer_key().await?;

    Ok(Json(evaluate(&predictions, &answer_key)))
}

/// POST /api/predictions (body: CSV with columns trip_id,label)
///
/// One upload per token. 201 with the evaluation, 409 if already uploaded,
/// 400 for unparseable CSV, 422 when the format check fails.
pub async fn upload_predictions(
    State(state): State<AppState>,
    Extension(ParticipantToken(token)): Extension<ParticipantToken>,
    body: String,
) -> ApiResult<(StatusCode, Json<Evaluation>)> {
    if state.workbook.has_predictions(&token).await? {
        return Err(ApiError::AlreadySubmitted);
    }

    let predictions = LabelTable::from_csv(&body)?;
    let answer_key = state.workbook.answer_key().await?;

    if let Err(mismatch) = check_csv_format(&predictions, &answer_key) {
        warn!("Upload for '{}' rejected: {}", token, mismatch.code());
        return Err(mismatch.into());
    }

    state.workbook.store_predictions(&token, &predictions).await?;
    let evaluation = evaluate(&predictions, &answer_key);
    info!(
        "Stored {} predictions for '{}' (score {:?})",
        predictions.len(),
        token,
        evaluation.score
    );

    Ok((StatusCode::CREATED, Json(evaluation)))
}
