//! Tandem quick form endpoints (document store)

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::submission::{LabelRecord, TandemSubmission};
use crate::AppState;

use super::outcome_response;

#[derive(Debug, Deserialize)]
pub struct TandemLabelsQuery {
    pub trip_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TandemLabelsResponse {
    pub collection: String,
    pub records: Vec<LabelRecord>,
}

/// GET /api/tandem/labels[?trip_id=]
pub async fn list_tandem_labels(
    State(state): State<AppState>,
    Query(query): Query<TandemLabelsQuery>,
) -> ApiResult<Json<TandemLabelsResponse>> {
    let mut records = state
        .document_labels
        .load_records(state.documents.as_ref())
        .await?;

    if let Some(trip_id) = query.trip_id.as_deref().filter(|t| !t.is_empty()) {
        records.retain(|record| record.trip_id == trip_id);
    }

    Ok(Json(TandemLabelsResponse {
        collection: state.document_labels.collection().to_string(),
        records,
    }))
}

/// POST /api/tandem/labels
///
/// 200 accepted, 409 duplicate, 422 invalid, 500 write not verified.
pub async fn submit_tandem_label(
    State(state): State<AppState>,
    payload: Result<Json<TandemSubmission>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(submission) = payload?;
    let outcome = state
        .document_labels
        .submit(state.documents.as_ref(), &submission)
        .await?;

    Ok(outcome_response(outcome, |record| {
        format!(
            "Label {} added successfully to trip {}",
            record.label, record.trip_id
        )
    }))
}
