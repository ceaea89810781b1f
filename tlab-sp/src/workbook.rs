//! Student spreadsheet access
//!
//! The student spreadsheet holds the answer key in one worksheet and each
//! participant's upload in a worksheet named after their token.

use std::sync::Arc;
use tlab_common::store::InsertOutcome;
use tlab_common::{Error, Spreadsheet};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::scoring::{LabelTable, EXPECTED_COLUMNS};

#[derive(Clone)]
pub struct StudentWorkbook {
    sheet: Arc<dyn Spreadsheet>,
    result_worksheet: String,
}

impl StudentWorkbook {
    pub fn new(sheet: Arc<dyn Spreadsheet>, result_worksheet: impl Into<String>) -> Self {
        Self {
            sheet,
            result_worksheet: result_worksheet.into(),
        }
    }

    pub fn result_worksheet(&self) -> &str {
        &self.result_worksheet
    }

    /// The answer key; `AnswerKeyMissing` until it has been imported
    pub async fn answer_key(&self) -> ApiResult<LabelTable> {
        let rows = match self.sheet.read_all_rows(&self.result_worksheet).await {
            Ok(rows) => rows,
            Err(Error::NotFound(_)) => return Err(ApiError::AnswerKeyMissing),
            Err(e) => return Err(e.into()),
        };

        let table = LabelTable::from_rows(&rows);
        check_answer_key_columns(&table)?;
        Ok(table)
    }

    /// Store the answer key; fails if one is already loaded
    pub async fn import_answer_key(&self, table: &LabelTable) -> ApiResult<()> {
        check_answer_key_columns(table)?;

        match self
            .sheet
            .add_worksheet(&self.result_worksheet, &table.to_rows())
            .await?
        {
            InsertOutcome::Inserted => {
                info!(
                    "Loaded answer key with {} trips into '{}'",
                    table.len(),
                    self.result_worksheet
                );
                Ok(())
            }
            InsertOutcome::Conflict => Err(ApiError::AnswerKeyExists(self.result_worksheet.clone())),
        }
    }

    pub async fn has_predictions(&self, token: &str) -> ApiResult<bool> {
        let titles = self.sheet.worksheet_titles().await?;
        Ok(titles.iter().any(|title| title == token))
    }

    /// Stored upload of `token`, if any
    pub async fn predictions(&self, token: &str) -> ApiResult<Option<LabelTable>> {
        match self.sheet.read_all_rows(token).await {
            Ok(rows) => Ok(Some(LabelTable::from_rows(&rows))),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store the upload of `token`; `AlreadySubmitted` if one exists
    pub async fn store_predictions(&self, token: &str, table: &LabelTable) -> ApiResult<()> {
        match self.sheet.add_worksheet(token, &table.to_rows()).await? {
            InsertOutcome::Inserted => Ok(()),
            InsertOutcome::Conflict => Err(ApiError::AlreadySubmitted),
        }
    }
}

fn check_answer_key_columns(table: &LabelTable) -> ApiResult<()> {
    if table.has_expected_columns() {
        return Ok(());
    }
    Err(ApiError::MalformedAnswerKey(format!(
        "expected columns [{}], found [{}]",
        EXPECTED_COLUMNS.join(", "),
        table.columns().join(", ")
    )))
}
