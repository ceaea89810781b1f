//! Full trip form backed by a spreadsheet
//!
//! One row per trip, newest first: rows are inserted at position 2, right
//! under the header. A trip that already has a row cannot be labeled again
//! through the form; corrections are made in the spreadsheet itself.

use serde::{Deserialize, Serialize};
use tlab_common::labels::{deserialize_optional, LabelDimension};
use tlab_common::store::{InsertOptions, InsertOutcome, Row, Spreadsheet, ValueInputOption};
use tlab_common::validation::{
    validate_detail, validate_environment, validate_trip_id, ValidationError,
};
use tlab_common::{AssistanceQuality, Environment, FallLabel, Result, TandemLabel};
use tracing::{debug, info, warn};

use super::{DuplicateScope, RejectionReason, SubmissionContext, SubmissionOutcome};

/// Header row of the label worksheet
pub const LABEL_SHEET_HEADER: [&str; 10] = [
    "trip_id",
    "env",
    "url",
    "label_tandem",
    "label_chute",
    "assistance",
    "user",
    "details",
    "checked",
    "created_at",
];

/// New rows go right under the header
pub const INSERT_POSITION: usize = 2;

const TRIP_ID_COLUMN: usize = 0;

/// Values posted by the full trip form
///
/// Blank select boxes arrive as `""` and mean "not filled in".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripLabelSubmission {
    pub trip_id: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub tandem: Option<TandemLabel>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub fall: Option<FallLabel>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub assistance: Option<AssistanceQuality>,
    #[serde(default)]
    pub details: String,
}

impl TripLabelSubmission {
    /// True when any selected label is a catch-all
    pub fn requires_detail(&self) -> bool {
        self.tandem.is_some_and(|l| l.requires_detail())
            || self.fall.is_some_and(|l| l.requires_detail())
            || self.assistance.is_some_and(|l| l.requires_detail())
    }
}

/// Confirmation of an accepted trip label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReceipt {
    /// Row position the label was written to
    pub record_id: usize,
    pub trip_id: String,
    pub environment: Option<Environment>,
    pub created_at: String,
}

/// A form field the trip form would flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl From<ValidationError> for FieldIssue {
    fn from(err: ValidationError) -> Self {
        Self {
            field: err.field(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Prefilled values of the trip form and what it would flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormCheck {
    pub trip_id: String,
    pub environment: String,
    pub issues: Vec<FieldIssue>,
    pub can_submit: bool,
}

/// Check the prefilled trip form values
///
/// Empty fields are not flagged (the form is simply not filled in yet), but an
/// empty trip id still prevents submission.
pub fn check_form(trip_id: &str, environment: &str) -> FormCheck {
    let mut issues = Vec::new();
    if !trip_id.is_empty() {
        if let Err(e) = validate_trip_id(trip_id) {
            issues.push(FieldIssue::from(e));
        }
    }
    if let Err(e) = validate_environment(environment) {
        issues.push(FieldIssue::from(e));
    }

    FormCheck {
        trip_id: trip_id.to_string(),
        environment: environment.to_string(),
        can_submit: issues.is_empty() && !trip_id.is_empty(),
        issues,
    }
}

/// Submission workflow of the full trip form
#[derive(Debug, Clone)]
pub struct SheetLabelService {
    worksheet: String,
    admin_domain: String,
}

impl SheetLabelService {
    pub fn new(worksheet: impl Into<String>, admin_domain: impl Into<String>) -> Self {
        Self {
            worksheet: worksheet.into(),
            admin_domain: admin_domain.into(),
        }
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub fn header_row() -> Row {
        LABEL_SHEET_HEADER.iter().map(|cell| cell.to_string()).collect()
    }

    /// Create the label worksheet, or give an existing empty one its header
    pub async fn ensure_worksheet<S>(&self, sheet: &S) -> Result<()>
    where
        S: Spreadsheet + ?Sized,
    {
        let header = Self::header_row();
        match sheet.add_worksheet(&self.worksheet, &[header.clone()]).await? {
            InsertOutcome::Inserted => {
                info!("Created label worksheet '{}'", self.worksheet);
            }
            InsertOutcome::Conflict => {
                if sheet.read_all_rows(&self.worksheet).await?.is_empty() {
                    sheet
                        .insert_row(&self.worksheet, 1, &header, InsertOptions::default())
                        .await?;
                    info!("Added header to empty label worksheet '{}'", self.worksheet);
                } else {
                    debug!("Label worksheet '{}' already present", self.worksheet);
                }
            }
        }
        Ok(())
    }

    /// Link to the trip in the admin console, built from the row's own cells
    pub fn hyperlink_formula(&self) -> String {
        format!(
            r#"=HYPERLINK(CONCATENATE("https://admin.", B{row},".{domain}/trips/",A{row}),"URL")"#,
            row = INSERT_POSITION,
            domain = self.admin_domain
        )
    }

    fn build_row(
        &self,
        trip_id: &str,
        environment: Option<Environment>,
        submission: &TripLabelSubmission,
        created_at: &str,
    ) -> Row {
        vec![
            trip_id.to_string(),
            environment.map(|e| e.as_str()).unwrap_or_default().to_string(),
            self.hyperlink_formula(),
            label_cell(submission.tandem),
            label_cell(submission.fall),
            label_cell(submission.assistance),
            submission.user_name.trim().to_string(),
            submission.details.clone(),
            "FALSE".to_string(),
            created_at.to_string(),
        ]
    }

    async fn refresh<S>(&self, context: &mut SubmissionContext<'_, S, Row>) -> Result<()>
    where
        S: Spreadsheet + ?Sized,
    {
        let rows = context.store().read_all_rows(&self.worksheet).await?;
        context.replace_snapshot(rows);
        Ok(())
    }

    /// Validate, check for duplicates, insert and verify one trip row
    pub async fn submit<S>(
        &self,
        sheet: &S,
        submission: &TripLabelSubmission,
    ) -> Result<SubmissionOutcome<SheetReceipt>>
    where
        S: Spreadsheet + ?Sized,
    {
        let trip_id = match validate_trip_id(&submission.trip_id) {
            Ok(trip_id) => trip_id,
            Err(e) => return Ok(reject(&submission.trip_id, e.into())),
        };
        let environment = match validate_environment(&submission.environment) {
            Ok(environment) => environment,
            Err(e) => return Ok(reject(trip_id.as_str(), e.into())),
        };
        if let Err(e) = validate_detail(submission.requires_detail(), &submission.details) {
            return Ok(reject(trip_id.as_str(), e.into()));
        }

        let mut context = SubmissionContext::new(sheet);
        self.refresh(&mut context).await?;

        if contains_trip(context.snapshot(), trip_id.as_str()) {
            return Ok(reject(
                trip_id.as_str(),
                RejectionReason::Duplicate(DuplicateScope::Trip),
            ));
        }

        let created_at = tlab_common::time::sheet_timestamp();
        let row = self.build_row(trip_id.as_str(), environment, submission, &created_at);
        let options = InsertOptions {
            value_input: ValueInputOption::UserEntered,
            inherit_from_before: true,
        };

        let outcome = context
            .store()
            .insert_row_unless_present(&self.worksheet, INSERT_POSITION, &row, options, TRIP_ID_COLUMN)
            .await?;
        if outcome == InsertOutcome::Conflict {
            return Ok(reject(
                trip_id.as_str(),
                RejectionReason::Duplicate(DuplicateScope::Trip),
            ));
        }

        self.refresh(&mut context).await?;
        if !contains_trip(context.snapshot(), trip_id.as_str()) {
            return Ok(reject(
                trip_id.as_str(),
                RejectionReason::WriteVerificationFailed,
            ));
        }

        info!(
            "Trip {} labeled in worksheet '{}' (tandem={:?}, fall={:?}, assistance={:?})",
            trip_id, self.worksheet, submission.tandem, submission.fall, submission.assistance
        );
        Ok(SubmissionOutcome::Accepted(SheetReceipt {
            record_id: INSERT_POSITION,
            trip_id: trip_id.to_string(),
            environment,
            created_at,
        }))
    }
}

fn label_cell<L: LabelDimension>(label: Option<L>) -> String {
    label.map(|l| l.as_str()).unwrap_or_default().to_string()
}

/// Whether a data row (below the header) is keyed by `trip_id`
fn contains_trip(rows: &[Row], trip_id: &str) -> bool {
    rows.iter()
        .skip(1)
        .any(|row| row.get(TRIP_ID_COLUMN).map(String::as_str) == Some(trip_id))
}

fn reject<R>(trip_id: &str, reason: RejectionReason) -> SubmissionOutcome<R> {
    warn!("Rejected trip form for '{}': {}", trip_id, reason.code());
    SubmissionOutcome::Rejected(reason)
}
