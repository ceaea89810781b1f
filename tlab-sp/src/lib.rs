//! tlab-sp library - Student Project service
//!
//! Participants upload CSV predictions once; each upload is checked against
//! the answer key, stored in its own worksheet and scored with a confusion
//! matrix.

use axum::Router;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tlab_common::config::StudentProjectConfig;
use tlab_common::db::SqliteSpreadsheet;
use tlab_common::Spreadsheet;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

pub mod api;
pub mod error;
pub mod scoring;
pub mod workbook;

use workbook::StudentWorkbook;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub workbook: StudentWorkbook,
    /// Accepted participant tokens
    pub tokens: Arc<HashSet<String>>,
}

impl AppState {
    /// Create application state over an arbitrary spreadsheet
    ///
    /// A token equal to the answer key worksheet name is dropped: its upload
    /// would collide with the answer key.
    pub fn new(sheet: Arc<dyn Spreadsheet>, config: &StudentProjectConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .filter(|token| {
                let clashes = **token == config.result_worksheet;
                if clashes {
                    warn!("Ignoring token '{}': it names the answer key worksheet", token);
                }
                !clashes
            })
            .cloned()
            .collect();

        Self {
            workbook: StudentWorkbook::new(sheet, config.result_worksheet.clone()),
            tokens: Arc::new(tokens),
        }
    }

    /// Create application state over the SQLite spreadsheet of `pool`
    pub fn with_sqlite(pool: SqlitePool, config: &StudentProjectConfig) -> Self {
        let sheet = Arc::new(SqliteSpreadsheet::new(pool, config.spreadsheet.clone()));
        Self::new(sheet, config)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    let protected = Router::new()
        .route(
            "/api/predictions",
            get(api::get_predictions).post(api::upload_predictions),
        )
        .layer(middleware::from_fn_with_state(state.clone(), api::token_gate));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
