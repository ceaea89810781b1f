//! SQLite-backed spreadsheet
//!
//! One `SqliteSpreadsheet` is one spreadsheet: a namespace of worksheets in the
//! `worksheets` table whose rows live in `sheet_rows`. Writes that depend on
//! the current rows run in a `BEGIN IMMEDIATE` transaction, so the check and
//! the write see the same sheet. The transaction rolls back when dropped
//! before commit, which covers cancelled requests.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};

use crate::store::{InsertOptions, InsertOutcome, Row, Spreadsheet};
use crate::{Error, Result};

/// Takes the write lock up front: concurrent check-then-write callers wait on
/// the busy timeout rather than failing on a stale read snapshot
const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

#[derive(Clone)]
pub struct SqliteSpreadsheet {
    pool: SqlitePool,
    spreadsheet: String,
}

impl SqliteSpreadsheet {
    pub fn new(pool: SqlitePool, spreadsheet: impl Into<String>) -> Self {
        Self {
            pool,
            spreadsheet: spreadsheet.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.spreadsheet
    }

    async fn ensure_worksheet(&self, conn: &mut SqliteConnection, sheet: &str) -> Result<()> {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM worksheets WHERE spreadsheet = ? AND title = ?")
                .bind(&self.spreadsheet)
                .bind(sheet)
                .fetch_optional(&mut *conn)
                .await?;
        match exists {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!(
                "worksheet '{}' in spreadsheet '{}'",
                sheet, self.spreadsheet
            ))),
        }
    }

    async fn insert_locked(
        &self,
        conn: &mut SqliteConnection,
        sheet: &str,
        position: usize,
        row: &[String],
        options: InsertOptions,
    ) -> Result<()> {
        self.ensure_worksheet(conn, sheet).await?;

        let row_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sheet_rows WHERE spreadsheet = ? AND title = ?",
        )
        .bind(&self.spreadsheet)
        .bind(sheet)
        .fetch_one(&mut *conn)
        .await?;

        let position = position as i64;
        if position < 1 || position > row_count + 1 {
            return Err(Error::InvalidInput(format!(
                "row position {} outside 1..={} of worksheet '{}'",
                position,
                row_count + 1,
                sheet
            )));
        }

        sqlx::query(
            "UPDATE sheet_rows SET position = position + 1 WHERE spreadsheet = ? AND title = ? AND position >= ?",
        )
        .bind(&self.spreadsheet)
        .bind(sheet)
        .bind(position)
        .execute(&mut *conn)
        .await?;

        insert_cells(conn, &self.spreadsheet, sheet, position, row, options).await
    }

    async fn key_present(
        &self,
        conn: &mut SqliteConnection,
        sheet: &str,
        key_column: usize,
        key: &str,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM sheet_rows
            WHERE spreadsheet = ? AND title = ? AND position > 1
              AND json_extract(cells, ?) = ?
            "#,
        )
        .bind(&self.spreadsheet)
        .bind(sheet)
        .bind(format!("$[{}]", key_column))
        .bind(key)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count > 0)
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_unless_present_locked(
        &self,
        conn: &mut SqliteConnection,
        sheet: &str,
        position: usize,
        row: &[String],
        options: InsertOptions,
        key_column: usize,
        key: &str,
    ) -> Result<InsertOutcome> {
        if self.key_present(conn, sheet, key_column, key).await? {
            return Ok(InsertOutcome::Conflict);
        }
        self.insert_locked(conn, sheet, position, row, options).await?;
        Ok(InsertOutcome::Inserted)
    }

    async fn add_worksheet_locked(
        &self,
        conn: &mut SqliteConnection,
        title: &str,
        rows: &[Row],
    ) -> Result<InsertOutcome> {
        let created = sqlx::query(
            "INSERT INTO worksheets (spreadsheet, title) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(&self.spreadsheet)
        .bind(title)
        .execute(&mut *conn)
        .await?;
        if created.rows_affected() == 0 {
            return Ok(InsertOutcome::Conflict);
        }

        for (index, row) in rows.iter().enumerate() {
            insert_cells(
                conn,
                &self.spreadsheet,
                title,
                index as i64 + 1,
                row,
                InsertOptions::default(),
            )
            .await?;
        }
        Ok(InsertOutcome::Inserted)
    }
}

async fn insert_cells(
    conn: &mut SqliteConnection,
    spreadsheet: &str,
    sheet: &str,
    position: i64,
    row: &[String],
    options: InsertOptions,
) -> Result<()> {
    let cells = serde_json::to_string(row)?;
    sqlx::query(
        r#"
        INSERT INTO sheet_rows (spreadsheet, title, position, cells, value_input, inherit_from_before)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(spreadsheet)
    .bind(sheet)
    .bind(position)
    .bind(&cells)
    .bind(options.value_input.as_str())
    .bind(options.inherit_from_before)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl Spreadsheet for SqliteSpreadsheet {
    async fn worksheet_titles(&self) -> Result<Vec<String>> {
        let titles: Vec<String> = sqlx::query_scalar(
            "SELECT title FROM worksheets WHERE spreadsheet = ? ORDER BY rowid ASC",
        )
        .bind(&self.spreadsheet)
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Row>> {
        let mut conn = self.pool.acquire().await?;
        self.ensure_worksheet(&mut conn, sheet).await?;

        let cells: Vec<String> = sqlx::query_scalar(
            "SELECT cells FROM sheet_rows WHERE spreadsheet = ? AND title = ? ORDER BY position ASC",
        )
        .bind(&self.spreadsheet)
        .bind(sheet)
        .fetch_all(&mut *conn)
        .await?;

        cells
            .iter()
            .map(|json| {
                serde_json::from_str::<Row>(json).map_err(|e| {
                    Error::Internal(format!("Corrupt row in worksheet '{}': {}", sheet, e))
                })
            })
            .collect()
    }

    async fn insert_row(
        &self,
        sheet: &str,
        position: usize,
        row: &[String],
        options: InsertOptions,
    ) -> Result<()> {
        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await?;
        self.insert_locked(&mut *tx, sheet, position, row, options)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_row_unless_present(
        &self,
        sheet: &str,
        position: usize,
        row: &[String],
        options: InsertOptions,
        key_column: usize,
    ) -> Result<InsertOutcome> {
        let key = row.get(key_column).cloned().unwrap_or_default();
        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await?;
        let outcome = self
            .insert_unless_present_locked(&mut *tx, sheet, position, row, options, key_column, &key)
            .await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn add_worksheet(&self, title: &str, rows: &[Row]) -> Result<InsertOutcome> {
        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await?;
        let outcome = self.add_worksheet_locked(&mut *tx, title, rows).await?;
        tx.commit().await?;
        Ok(outcome)
    }
}
