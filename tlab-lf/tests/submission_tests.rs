//! Submission workflow tests
//!
//! Run both label forms against in-memory SQLite stores, plus a few
//! misbehaving stores to exercise lost writes, stale reads and outages.
//! Concurrent submissions run against a file database so writers really
//! overlap on separate connections.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tlab_common::db::{init_database, init_in_memory, SqliteDocumentStore, SqliteSpreadsheet};
use tlab_common::store::{Document, InsertOptions, InsertOutcome, Row};
use tlab_common::validation::ValidationError;
use tlab_common::{
    AssistanceQuality, DocumentStore, Error, FallLabel, Result, Spreadsheet, TandemLabel,
};
use tlab_lf::submission::{
    DocumentLabelService, DuplicateScope, RejectionReason, SheetLabelService, SubmissionOutcome,
    TandemSubmission, TripLabelSubmission,
};

const TRIP_A: &str = "AAAAAAAAAAAAAAAAAAAA";
const TRIP_B: &str = "BBBBBBBBBBBBBBBBBBBB";
const TRIP_C: &str = "CCCCCCCCCCCCCCCCCCCC";

fn tandem(trip_id: &str, label: TandemLabel, details: &str) -> TandemSubmission {
    TandemSubmission {
        trip_id: trip_id.to_string(),
        label,
        details: details.to_string(),
    }
}

fn trip_form(trip_id: &str) -> TripLabelSubmission {
    TripLabelSubmission {
        trip_id: trip_id.to_string(),
        environment: "prod".to_string(),
        tandem: Some(TandemLabel::Solo),
        ..Default::default()
    }
}

fn rejection<R>(outcome: SubmissionOutcome<R>) -> RejectionReason {
    match outcome {
        SubmissionOutcome::Rejected(reason) => reason,
        SubmissionOutcome::Accepted(_) => panic!("expected a rejection"),
    }
}

async fn document_store() -> SqliteDocumentStore {
    SqliteDocumentStore::new(init_in_memory().await.expect("in-memory database"))
}

async fn label_sheet(service: &SheetLabelService) -> SqliteSpreadsheet {
    let sheet = SqliteSpreadsheet::new(init_in_memory().await.unwrap(), "labels");
    service.ensure_worksheet(&sheet).await.unwrap();
    sheet
}

// =============================================================================
// Misbehaving stores
// =============================================================================

/// Accepts every write and never returns it
struct ForgetfulDocuments;

#[async_trait]
impl DocumentStore for ForgetfulDocuments {
    async fn list_all(&self, _collection: &str) -> Result<Vec<Document>> {
        Ok(Vec::new())
    }

    async fn insert(&self, _collection: &str, _id: &str, _body: &Value) -> Result<()> {
        Ok(())
    }

    async fn insert_unique(
        &self,
        _collection: &str,
        _id: &str,
        _body: &Value,
        _unique_key: &str,
    ) -> Result<InsertOutcome> {
        Ok(InsertOutcome::Inserted)
    }
}

/// Worksheet that keeps only its header; relies on the default conditional insert
struct ForgetfulSheet;

#[async_trait]
impl Spreadsheet for ForgetfulSheet {
    async fn worksheet_titles(&self) -> Result<Vec<String>> {
        Ok(vec!["labels".to_string()])
    }

    async fn read_all_rows(&self, _sheet: &str) -> Result<Vec<Row>> {
        Ok(vec![SheetLabelService::header_row()])
    }

    async fn insert_row(
        &self,
        _sheet: &str,
        _position: usize,
        _row: &[String],
        _options: InsertOptions,
    ) -> Result<()> {
        Ok(())
    }

    async fn add_worksheet(&self, _title: &str, _rows: &[Row]) -> Result<InsertOutcome> {
        Ok(InsertOutcome::Conflict)
    }
}

/// Serves one stale (empty) listing, then behaves like the wrapped store
struct StaleFirstRead {
    inner: SqliteDocumentStore,
    served_stale: AtomicBool,
}

#[async_trait]
impl DocumentStore for StaleFirstRead {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        if !self.served_stale.swap(true, Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        self.inner.list_all(collection).await
    }

    async fn insert(&self, collection: &str, id: &str, body: &Value) -> Result<()> {
        self.inner.insert(collection, id, body).await
    }

    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        body: &Value,
        unique_key: &str,
    ) -> Result<InsertOutcome> {
        self.inner.insert_unique(collection, id, body, unique_key).await
    }
}

/// Every call fails as if the backend were down
struct UnreachableDocuments;

#[async_trait]
impl DocumentStore for UnreachableDocuments {
    async fn list_all(&self, _collection: &str) -> Result<Vec<Document>> {
        Err(Error::StorageUnavailable("connection refused".to_string()))
    }

    async fn insert(&self, _collection: &str, _id: &str, _body: &Value) -> Result<()> {
        Err(Error::StorageUnavailable("connection refused".to_string()))
    }

    async fn insert_unique(
        &self,
        _collection: &str,
        _id: &str,
        _body: &Value,
        _unique_key: &str,
    ) -> Result<InsertOutcome> {
        Err(Error::StorageUnavailable("connection refused".to_string()))
    }
}

// =============================================================================
// Tandem quick form (document store)
// =============================================================================

#[tokio::test]
async fn test_tandem_accept_then_duplicate() {
    let store = document_store().await;
    let service = DocumentLabelService::new("Label");

    let first = service
        .submit(&store, &tandem(TRIP_A, TandemLabel::Solo, ""))
        .await
        .unwrap();
    let record = match first {
        SubmissionOutcome::Accepted(record) => record,
        other => panic!("expected acceptance, got {:?}", other),
    };
    assert_eq!(record.trip_id, TRIP_A);
    assert_eq!(record.record_id.len(), 20);

    let second = service
        .submit(&store, &tandem(TRIP_A, TandemLabel::Solo, ""))
        .await
        .unwrap();
    assert_eq!(
        rejection(second),
        RejectionReason::Duplicate(DuplicateScope::Category)
    );
    assert_eq!(store.list_all("Label").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_tandem_other_label_same_trip_accepted() {
    let store = document_store().await;
    let service = DocumentLabelService::new("Label");

    for label in [TandemLabel::Solo, TandemLabel::PartialTandem] {
        let outcome = service
            .submit(&store, &tandem(TRIP_A, label, ""))
            .await
            .unwrap();
        assert!(outcome.is_accepted());
    }

    let records = service.load_records(&store).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].label, TandemLabel::PartialTandem);
}

#[tokio::test]
async fn test_tandem_bad_length_writes_nothing() {
    let store = document_store().await;
    let service = DocumentLabelService::new("Label");

    for trip_id in ["short", "", "AAAAAAAAAAAAAAAAAAAAA"] {
        let outcome = service
            .submit(&store, &tandem(trip_id, TandemLabel::Solo, ""))
            .await
            .unwrap();
        assert_eq!(rejection(outcome).code(), "invalid_id_length");
    }
    assert!(store.list_all("Label").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tandem_other_needs_details() {
    let store = document_store().await;
    let service = DocumentLabelService::new("Label");

    for details in ["", "   "] {
        let outcome = service
            .submit(&store, &tandem(TRIP_A, TandemLabel::Other, details))
            .await
            .unwrap();
        assert_eq!(
            rejection(outcome),
            RejectionReason::Invalid(ValidationError::MissingDetail)
        );
    }
    assert!(store.list_all("Label").await.unwrap().is_empty());

    let outcome = service
        .submit(&store, &tandem(TRIP_A, TandemLabel::Other, "bike swapped"))
        .await
        .unwrap();
    assert!(outcome.is_accepted());
}

#[tokio::test]
async fn test_tandem_length_checked_before_details() {
    let service = DocumentLabelService::new("Label");
    let outcome = service
        .submit(&UnreachableDocuments, &tandem("short", TandemLabel::Other, ""))
        .await
        .unwrap();
    // Validation never touches the store
    assert_eq!(rejection(outcome).code(), "invalid_id_length");
}

#[tokio::test]
async fn test_tandem_lost_write_not_verified() {
    let service = DocumentLabelService::new("Label");
    let outcome = service
        .submit(&ForgetfulDocuments, &tandem(TRIP_A, TandemLabel::Tandem, ""))
        .await
        .unwrap();
    assert_eq!(rejection(outcome), RejectionReason::WriteVerificationFailed);
}

#[tokio::test]
async fn test_tandem_race_reported_as_duplicate() {
    let inner = document_store().await;
    let service = DocumentLabelService::new("Label");
    let accepted = service
        .submit(&inner, &tandem(TRIP_A, TandemLabel::Solo, ""))
        .await
        .unwrap();
    assert!(accepted.is_accepted());

    // The duplicate check reads a snapshot that misses the first record
    let racing = StaleFirstRead {
        inner,
        served_stale: AtomicBool::new(false),
    };
    let outcome = service
        .submit(&racing, &tandem(TRIP_A, TandemLabel::Solo, ""))
        .await
        .unwrap();
    assert_eq!(
        rejection(outcome),
        RejectionReason::Duplicate(DuplicateScope::Category)
    );
    assert_eq!(racing.inner.list_all("Label").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_tandem_storage_failure_is_error() {
    let service = DocumentLabelService::new("Label");
    let err = service
        .submit(&UnreachableDocuments, &tandem(TRIP_A, TandemLabel::Solo, ""))
        .await
        .unwrap_err();
    assert!(err.is_storage_failure());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tandem_concurrent_submissions_single_winner() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("tlab.db")).await.unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(pool));
    let service = Arc::new(DocumentLabelService::new("Label"));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .submit(store.as_ref(), &tandem(TRIP_B, TandemLabel::Tandem, ""))
                .await
                .unwrap()
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            SubmissionOutcome::Accepted(_) => accepted += 1,
            SubmissionOutcome::Rejected(reason) => {
                assert_eq!(reason, RejectionReason::Duplicate(DuplicateScope::Category))
            }
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(store.list_all("Label").await.unwrap().len(), 1);
}

// =============================================================================
// Full trip form (spreadsheet)
// =============================================================================

#[tokio::test]
async fn test_sheet_rows_inserted_under_header_newest_first() {
    let service = SheetLabelService::new("labels", "fifteen.eu");
    let sheet = label_sheet(&service).await;

    for trip_id in [TRIP_A, TRIP_B] {
        let outcome = service.submit(&sheet, &trip_form(trip_id)).await.unwrap();
        match outcome {
            SubmissionOutcome::Accepted(receipt) => assert_eq!(receipt.record_id, 2),
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    let rows = sheet.read_all_rows("labels").await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], SheetLabelService::header_row());
    assert_eq!(rows[1][0], TRIP_B);
    assert_eq!(rows[2][0], TRIP_A);
    assert_eq!(rows[1][1], "prod");
    assert_eq!(rows[1][3], "Solo");
    assert_eq!(rows[1][8], "FALSE");
}

#[tokio::test]
async fn test_sheet_second_submission_for_trip_is_duplicate() {
    let service = SheetLabelService::new("labels", "fifteen.eu");
    let sheet = label_sheet(&service).await;

    assert!(service
        .submit(&sheet, &trip_form(TRIP_A))
        .await
        .unwrap()
        .is_accepted());

    let different_labels = TripLabelSubmission {
        trip_id: TRIP_A.to_string(),
        tandem: None,
        fall: Some(FallLabel::Fall),
        assistance: Some(AssistanceQuality::Bad),
        ..Default::default()
    };
    let outcome = service.submit(&sheet, &different_labels).await.unwrap();
    assert_eq!(
        rejection(outcome),
        RejectionReason::Duplicate(DuplicateScope::Trip)
    );
    assert_eq!(sheet.read_all_rows("labels").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_sheet_validation_order() {
    let service = SheetLabelService::new("labels", "fifteen.eu");
    let sheet = label_sheet(&service).await;

    let everything_wrong = TripLabelSubmission {
        trip_id: "short".to_string(),
        environment: "local".to_string(),
        fall: Some(FallLabel::Other),
        ..Default::default()
    };
    let outcome = service.submit(&sheet, &everything_wrong).await.unwrap();
    assert_eq!(rejection(outcome).code(), "invalid_id_length");

    let bad_env = TripLabelSubmission {
        trip_id: TRIP_C.to_string(),
        ..everything_wrong.clone()
    };
    let outcome = service.submit(&sheet, &bad_env).await.unwrap();
    assert_eq!(rejection(outcome).code(), "invalid_environment");

    let missing_detail = TripLabelSubmission {
        environment: String::new(),
        ..bad_env
    };
    let outcome = service.submit(&sheet, &missing_detail).await.unwrap();
    assert_eq!(rejection(outcome).code(), "missing_detail");

    assert_eq!(sheet.read_all_rows("labels").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sheet_optional_fields_left_blank() {
    let service = SheetLabelService::new("labels", "fifteen.eu");
    let sheet = label_sheet(&service).await;

    let minimal = TripLabelSubmission {
        trip_id: TRIP_C.to_string(),
        ..Default::default()
    };
    let outcome = service.submit(&sheet, &minimal).await.unwrap();
    match outcome {
        SubmissionOutcome::Accepted(receipt) => assert_eq!(receipt.environment, None),
        other => panic!("expected acceptance, got {:?}", other),
    }

    let rows = sheet.read_all_rows("labels").await.unwrap();
    assert_eq!(rows[1][1], "");
    assert_eq!(rows[1][3], "");
    assert_eq!(rows[1][6], "");
}

#[tokio::test]
async fn test_sheet_lost_write_not_verified() {
    let service = SheetLabelService::new("labels", "fifteen.eu");
    let outcome = service
        .submit(&ForgetfulSheet, &trip_form(TRIP_A))
        .await
        .unwrap();
    assert_eq!(rejection(outcome), RejectionReason::WriteVerificationFailed);
}

#[tokio::test]
async fn test_ensure_worksheet_is_idempotent() {
    let service = SheetLabelService::new("labels", "fifteen.eu");
    let sheet = label_sheet(&service).await;
    service.submit(&sheet, &trip_form(TRIP_A)).await.unwrap();

    service.ensure_worksheet(&sheet).await.unwrap();

    let rows = sheet.read_all_rows("labels").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], SheetLabelService::header_row());
}

#[tokio::test]
async fn test_ensure_worksheet_adds_header_to_empty_sheet() {
    let service = SheetLabelService::new("labels", "fifteen.eu");
    let sheet = SqliteSpreadsheet::new(init_in_memory().await.unwrap(), "labels");
    sheet.add_worksheet("labels", &[]).await.unwrap();

    service.ensure_worksheet(&sheet).await.unwrap();

    assert_eq!(
        sheet.read_all_rows("labels").await.unwrap(),
        vec![SheetLabelService::header_row()]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sheet_concurrent_submissions_single_winner() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("tlab.db")).await.unwrap();
    let service = Arc::new(SheetLabelService::new("labels", "fifteen.eu"));
    let sheet: Arc<dyn Spreadsheet> = Arc::new(SqliteSpreadsheet::new(pool, "labels"));
    service.ensure_worksheet(sheet.as_ref()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let sheet = Arc::clone(&sheet);
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .submit(sheet.as_ref(), &trip_form(TRIP_C))
                .await
                .unwrap()
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            SubmissionOutcome::Accepted(_) => accepted += 1,
            SubmissionOutcome::Rejected(reason) => {
                assert_eq!(reason, RejectionReason::Duplicate(DuplicateScope::Trip))
            }
        }
    }
    assert_eq!(accepted, 1);

    let rows = sheet.read_all_rows("labels").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], TRIP_C);
}
