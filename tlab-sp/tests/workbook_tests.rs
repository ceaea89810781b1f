//! Student workbook tests on a file database
//!
//! Uploads from the same participant race on separate pooled connections;
//! only one may be stored.

use std::sync::Arc;
use tlab_common::db::{init_database, SqliteSpreadsheet};
use tlab_common::Spreadsheet;
use tlab_sp::error::ApiError;
use tlab_sp::scoring::LabelTable;
use tlab_sp::workbook::StudentWorkbook;

const ANSWER_KEY: &str = "trip_id,label\nT1,Chute\nT2,Pas de chute\n";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_store_one() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("tlab.db")).await.unwrap();
    let sheet: Arc<dyn Spreadsheet> = Arc::new(SqliteSpreadsheet::new(pool, "students"));
    let workbook = StudentWorkbook::new(Arc::clone(&sheet), "result");
    workbook
        .import_answer_key(&LabelTable::from_csv(ANSWER_KEY).unwrap())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let workbook = workbook.clone();
        handles.push(tokio::spawn(async move {
            let label = if i % 2 == 0 { "Chute" } else { "Pas de chute" };
            let csv = format!("trip_id,label\nT1,{}\nT2,{}\n", label, label);
            let table = LabelTable::from_csv(&csv).unwrap();
            workbook.store_predictions("team-a", &table).await
        }));
    }

    let mut stored = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => stored += 1,
            Err(ApiError::AlreadySubmitted) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(stored, 1);

    let titles = sheet.worksheet_titles().await.unwrap();
    assert_eq!(titles, vec!["result".to_string(), "team-a".to_string()]);
    let upload = workbook.predictions("team-a").await.unwrap().unwrap();
    assert_eq!(upload.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_answer_key_imports_load_once() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("tlab.db")).await.unwrap();
    let workbook = StudentWorkbook::new(Arc::new(SqliteSpreadsheet::new(pool, "students")), "result");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let workbook = workbook.clone();
        handles.push(tokio::spawn(async move {
            workbook
                .import_answer_key(&LabelTable::from_csv(ANSWER_KEY).unwrap())
                .await
        }));
    }

    let mut loaded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => loaded += 1,
            Err(ApiError::AnswerKeyExists(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(loaded, 1);
    assert_eq!(workbook.answer_key().await.unwrap().len(), 2);
}
