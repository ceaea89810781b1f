//! Full trip form endpoints (spreadsheet), behind the login gate

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::submission::sheet::{check_form, FormCheck};
use crate::submission::TripLabelSubmission;
use crate::AppState;

use super::outcome_response;

/// Prefill parameters of the shared form link
#[derive(Debug, Deserialize)]
pub struct TripFormQuery {
    #[serde(default)]
    pub trip_id: String,
    #[serde(default)]
    pub env: String,
}

/// GET /api/trips/form?login=&trip_id=&env=
pub async fn check_trip_form(Query(query): Query<TripFormQuery>) -> Json<FormCheck> {
    Json(check_form(&query.trip_id, &query.env))
}

/// POST /api/trips/labels?login=
///
/// 200 accepted, 409 duplicate, 422 invalid, 500 write not verified.
pub async fn submit_trip_labels(
    State(state): State<AppState>,
    payload: Result<Json<TripLabelSubmission>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(submission) = payload?;
    let outcome = state
        .sheet_labels
        .submit(state.sheet.as_ref(), &submission)
        .await?;

    Ok(outcome_response(outcome, |receipt| {
        format!("Trip {} labeled, thank you", receipt.trip_id)
    }))
}
