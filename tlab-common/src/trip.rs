//! Trip identifiers and deployment environments

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trip ids are issued upstream and always 20 characters long
pub const TRIP_ID_LENGTH: usize = 20;

/// Opaque trip identifier with a checked length
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    /// Accept `raw` if it is exactly [`TRIP_ID_LENGTH`] characters, else return its length
    pub fn parse(raw: &str) -> Result<Self, usize> {
        let length = raw.chars().count();
        if length == TRIP_ID_LENGTH {
            Ok(Self(raw.to_string()))
        } else {
            Err(length)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deployment environment a trip was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Staging,
    Preprod,
    Prod,
    Partners,
    Omega,
    Sigma,
}

impl Environment {
    pub const ALL: [Environment; 6] = [
        Environment::Staging,
        Environment::Preprod,
        Environment::Prod,
        Environment::Partners,
        Environment::Omega,
        Environment::Sigma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Staging => "staging",
            Environment::Preprod => "preprod",
            Environment::Prod => "prod",
            Environment::Partners => "partners",
            Environment::Omega => "omega",
            Environment::Sigma => "sigma",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|env| env.as_str() == raw)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
