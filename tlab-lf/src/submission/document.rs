//! Tandem quick form backed by a document store
//!
//! Each label is one document of the configured collection. A trip may carry
//! several tandem labels, but never the same label twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tlab_common::ids::generate_record_id;
use tlab_common::labels::LabelDimension;
use tlab_common::store::{Document, DocumentStore, InsertOutcome};
use tlab_common::validation::{validate_detail, validate_trip_id};
use tlab_common::{Result, TandemLabel};
use tracing::{info, warn};

use super::{DuplicateScope, RejectionReason, SubmissionContext, SubmissionOutcome};

/// Values posted by the tandem quick form
#[derive(Debug, Clone, Deserialize)]
pub struct TandemSubmission {
    pub trip_id: String,
    pub label: TandemLabel,
    #[serde(default)]
    pub details: String,
}

/// A recorded tandem label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRecord {
    /// Document id
    pub record_id: String,
    pub trip_id: String,
    pub label: TandemLabel,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Stored document body; the record id is the document id
#[derive(Debug, Serialize, Deserialize)]
struct LabelDocument {
    trip_id: String,
    label: TandemLabel,
    #[serde(default)]
    details: String,
    created_at: DateTime<Utc>,
}

impl LabelRecord {
    fn from_document(document: Document) -> Option<Self> {
        match serde_json::from_value::<LabelDocument>(document.body) {
            Ok(body) => Some(Self {
                record_id: document.id,
                trip_id: body.trip_id,
                label: body.label,
                details: body.details,
                created_at: body.created_at,
            }),
            Err(e) => {
                warn!("Skipping malformed label document {}: {}", document.id, e);
                None
            }
        }
    }

    fn to_document(&self) -> LabelDocument {
        LabelDocument {
            trip_id: self.trip_id.clone(),
            label: self.label,
            details: self.details.clone(),
            created_at: self.created_at,
        }
    }
}

/// Key under which the store rejects a second identical trip label
fn unique_key(trip_id: &str, label: TandemLabel) -> String {
    format!("{}:{}", trip_id, label.as_str())
}

/// Submission workflow of the tandem quick form
#[derive(Debug, Clone)]
pub struct DocumentLabelService {
    collection: String,
}

impl DocumentLabelService {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Every well-formed label record of the collection, in insertion order
    pub async fn load_records<S>(&self, store: &S) -> Result<Vec<LabelRecord>>
    where
        S: DocumentStore + ?Sized,
    {
        let documents = store.list_all(&self.collection).await?;
        Ok(documents
            .into_iter()
            .filter_map(LabelRecord::from_document)
            .collect())
    }

    async fn refresh<S>(&self, context: &mut SubmissionContext<'_, S, LabelRecord>) -> Result<()>
    where
        S: DocumentStore + ?Sized,
    {
        let records = self.load_records(context.store()).await?;
        context.replace_snapshot(records);
        Ok(())
    }

    /// Validate, check for duplicates, write and verify one tandem label
    pub async fn submit<S>(
        &self,
        store: &S,
        submission: &TandemSubmission,
    ) -> Result<SubmissionOutcome<LabelRecord>>
    where
        S: DocumentStore + ?Sized,
    {
        let trip_id = match validate_trip_id(&submission.trip_id) {
            Ok(trip_id) => trip_id,
            Err(e) => return Ok(reject(&submission.trip_id, e.into())),
        };
        if let Err(e) = validate_detail(submission.label.requires_detail(), &submission.details) {
            return Ok(reject(trip_id.as_str(), e.into()));
        }

        let mut context = SubmissionContext::new(store);
        self.refresh(&mut context).await?;

        let already_labeled = context
            .snapshot()
            .iter()
            .any(|record| record.trip_id == trip_id.as_str() && record.label == submission.label);
        if already_labeled {
            return Ok(reject(
                trip_id.as_str(),
                RejectionReason::Duplicate(DuplicateScope::Category),
            ));
        }

        let record = LabelRecord {
            record_id: generate_record_id(),
            trip_id: trip_id.to_string(),
            label: submission.label,
            details: submission.details.clone(),
            created_at: tlab_common::time::now(),
        };
        let body = serde_json::to_value(record.to_document())?;

        let outcome = context
            .store()
            .insert_unique(
                &self.collection,
                &record.record_id,
                &body,
                &unique_key(&record.trip_id, record.label),
            )
            .await?;
        if outcome == InsertOutcome::Conflict {
            // Lost the race to a concurrent submission of the same label
            return Ok(reject(
                trip_id.as_str(),
                RejectionReason::Duplicate(DuplicateScope::Category),
            ));
        }

        self.refresh(&mut context).await?;
        let verified = context
            .snapshot()
            .iter()
            .any(|r| r.record_id == record.record_id && r.trip_id == record.trip_id);
        if !verified {
            return Ok(reject(
                trip_id.as_str(),
                RejectionReason::WriteVerificationFailed,
            ));
        }

        info!(
            "Label {} added to trip {} (record {})",
            record.label, record.trip_id, record.record_id
        );
        Ok(SubmissionOutcome::Accepted(record))
    }
}

fn reject<R>(trip_id: &str, reason: RejectionReason) -> SubmissionOutcome<R> {
    warn!("Rejected label for trip '{}': {}", trip_id, reason.code());
    SubmissionOutcome::Rejected(reason)
}
