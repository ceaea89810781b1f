//! Duplicate-safe label submission
//!
//! Both forms follow the same workflow: validate the submitted values, load
//! the labels already recorded, reject duplicates, write the new record with a
//! conditional write, then re-read the store and confirm the record is there.
//!
//! Rejections are ordinary values ([`SubmissionOutcome::Rejected`]); only
//! storage failures surface as `Err`.

pub mod document;
pub mod sheet;

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tlab_common::validation::ValidationError;

pub use document::{DocumentLabelService, LabelRecord, TandemSubmission};
pub use sheet::{SheetLabelService, SheetReceipt, TripLabelSubmission};

/// Request-scoped state of one submission
///
/// Holds the store handle and the records returned by the most recent fetch.
/// A context lives for one request only; nothing is shared between sessions.
pub struct SubmissionContext<'a, S: ?Sized, R> {
    store: &'a S,
    snapshot: Vec<R>,
}

impl<'a, S: ?Sized, R> SubmissionContext<'a, S, R> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            snapshot: Vec::new(),
        }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Records of the last fetch (empty before the first one)
    pub fn snapshot(&self) -> &[R] {
        &self.snapshot
    }

    pub fn replace_snapshot(&mut self, records: Vec<R>) {
        self.snapshot = records;
    }
}

/// Terminal result of a submission attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome<R> {
    Accepted(R),
    Rejected(RejectionReason),
}

impl<R> SubmissionOutcome<R> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted(_))
    }
}

/// What a duplicate collides with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateScope {
    /// Same trip and same label (document store)
    Category,
    /// Same trip, any label (spreadsheet)
    Trip,
}

impl fmt::Display for DuplicateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateScope::Category => f.write_str("This trip id already has this label"),
            DuplicateScope::Trip => f.write_str(
                "This trip has already been labeled. Edit the spreadsheet directly or contact the data team",
            ),
        }
    }
}

/// Why a submission was turned down
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{0}")]
    Duplicate(DuplicateScope),

    #[error("The label was written but could not be found when reading it back")]
    WriteVerificationFailed,
}

impl RejectionReason {
    /// Stable snake_case code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::Invalid(err) => err.code(),
            RejectionReason::Duplicate(_) => "duplicate",
            RejectionReason::WriteVerificationFailed => "write_verification_failed",
        }
    }
}
