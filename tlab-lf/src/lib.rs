//! tlab-lf library - Label Forms service
//!
//! Two labeling front ends over one submission workflow:
//! - the tandem quick form, persisted to a document collection
//! - the full trip form, persisted to a spreadsheet and gated by a login secret

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tlab_common::config::LabelFormsConfig;
use tlab_common::db::{SqliteDocumentStore, SqliteSpreadsheet};
use tlab_common::{DocumentStore, Spreadsheet};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod error;
pub mod submission;

use submission::{DocumentLabelService, SheetLabelService};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Backing store of the tandem quick form
    pub documents: Arc<dyn DocumentStore>,
    /// Backing spreadsheet of the full trip form
    pub sheet: Arc<dyn Spreadsheet>,
    pub document_labels: Arc<DocumentLabelService>,
    pub sheet_labels: Arc<SheetLabelService>,
    /// Expected `login` query parameter; empty refuses every trip form request
    pub login: Arc<String>,
}

impl AppState {
    /// Create application state over arbitrary stores
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        sheet: Arc<dyn Spreadsheet>,
        config: &LabelFormsConfig,
    ) -> Self {
        Self {
            documents,
            sheet,
            document_labels: Arc::new(DocumentLabelService::new(config.collection.clone())),
            sheet_labels: Arc::new(SheetLabelService::new(
                config.worksheet.clone(),
                config.admin_domain.clone(),
            )),
            login: Arc::new(config.login.clone()),
        }
    }

    /// Create application state over the SQLite stores of `pool`
    pub fn with_sqlite(pool: SqlitePool, config: &LabelFormsConfig) -> Self {
        let documents = Arc::new(SqliteDocumentStore::new(pool.clone()));
        let sheet = Arc::new(SqliteSpreadsheet::new(pool, config.spreadsheet.clone()));
        Self::new(documents, sheet, config)
    }
}

/// Build application router
///
/// Trip form routes sit behind the login gate; health, the label catalog and
/// the tandem quick form do not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    let gated = Router::new()
        .route("/api/trips/form", get(api::check_trip_form))
        .route("/api/trips/labels", axum::routing::post(api::submit_trip_labels))
        .layer(middleware::from_fn_with_state(state.clone(), api::login_gate));

    let public = Router::new()
        .route("/api/labels", get(api::get_label_catalog))
        .route(
            "/api/tandem/labels",
            get(api::list_tandem_labels).post(api::submit_tandem_label),
        )
        .merge(api::health_routes());

    Router::new()
        .merge(gated)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
