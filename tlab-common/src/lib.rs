//! # TLAB Common Library
//!
//! Shared code for the trip labeling services:
//! - Label taxonomy (tandem, fall, assistance quality) and environments
//! - Validation predicates for submitted form values
//! - Document store and spreadsheet traits with SQLite implementations
//! - Configuration loading
//! - Identifier and timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod labels;
pub mod store;
pub mod time;
pub mod trip;
pub mod validation;

pub use error::{Error, Result};
pub use labels::{AssistanceQuality, FallLabel, LabelDimension, TandemLabel};
pub use store::{DocumentStore, InsertOutcome, Spreadsheet};
pub use trip::{Environment, TripId};
