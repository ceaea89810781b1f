//! Label catalog endpoint

use axum::Json;
use serde::Serialize;
use tlab_common::labels::{catalog, DimensionCatalog};
use tlab_common::Environment;

#[derive(Debug, Serialize)]
pub struct LabelCatalogResponse {
    pub dimensions: Vec<DimensionCatalog>,
    pub environments: Vec<&'static str>,
}

/// GET /api/labels
///
/// Every labeling dimension with its members, their explanations and which
/// of them require details, plus the accepted environments.
pub async fn get_label_catalog() -> Json<LabelCatalogResponse> {
    Json(LabelCatalogResponse {
        dimensions: catalog(),
        environments: Environment::ALL.iter().map(|env| env.as_str()).collect(),
    })
}
