//! Validation predicates for submitted form values
//!
//! Pure functions; the submission services decide the order they run in.

use thiserror::Error;

use crate::trip::{Environment, TripId};

/// A form value that cannot be accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid trip id length: expected 20 characters, got {length}")]
    InvalidIdLength { length: usize },

    #[error(
        "Invalid environment '{value}'. Allowed values are staging, preprod, prod, partners, omega and sigma"
    )]
    InvalidEnvironment { value: String },

    #[error("Details are required when the selected label is Autre")]
    MissingDetail,
}

impl ValidationError {
    /// Stable snake_case code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidIdLength { .. } => "invalid_id_length",
            ValidationError::InvalidEnvironment { .. } => "invalid_environment",
            ValidationError::MissingDetail => "missing_detail",
        }
    }

    /// Form field the error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidIdLength { .. } => "trip_id",
            ValidationError::InvalidEnvironment { .. } => "environment",
            ValidationError::MissingDetail => "details",
        }
    }
}

/// Trip id must be exactly 20 characters
pub fn validate_trip_id(raw: &str) -> Result<TripId, ValidationError> {
    TripId::parse(raw).map_err(|length| ValidationError::InvalidIdLength { length })
}

/// Empty means "not provided"; anything else must be a known environment
pub fn validate_environment(raw: &str) -> Result<Option<Environment>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Environment::parse(raw)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidEnvironment {
            value: raw.to_string(),
        })
}

/// Detail must be non-blank when any selected label is a catch-all
pub fn validate_detail(detail_required: bool, detail: &str) -> Result<(), ValidationError> {
    if detail_required && detail.trim().is_empty() {
        Err(ValidationError::MissingDetail)
    } else {
        Ok(())
    }
}
