//! HTTP API handlers for tlab-lf

pub mod auth;
pub mod health;
pub mod labels;
pub mod tandem;
pub mod trips;

pub use auth::login_gate;
pub use health::health_routes;
pub use labels::get_label_catalog;
pub use tandem::{list_tandem_labels, submit_tandem_label};
pub use trips::{check_trip_form, submit_trip_labels};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::submission::{RejectionReason, SubmissionOutcome};

/// HTTP status of a rejected submission
pub fn rejection_status(reason: &RejectionReason) -> StatusCode {
    match reason {
        RejectionReason::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RejectionReason::Duplicate(_) => StatusCode::CONFLICT,
        RejectionReason::WriteVerificationFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The single terminal message of a submission attempt
pub fn outcome_response<R: Serialize>(
    outcome: SubmissionOutcome<R>,
    accepted_message: impl FnOnce(&R) -> String,
) -> Response {
    match outcome {
        SubmissionOutcome::Accepted(record) => {
            let body = json!({
                "status": "accepted",
                "message": accepted_message(&record),
                "record": record,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        SubmissionOutcome::Rejected(reason) => {
            let body = json!({
                "status": "rejected",
                "reason": reason.code(),
                "message": reason.to_string(),
            });
            (rejection_status(&reason), Json(body)).into_response()
        }
    }
}
