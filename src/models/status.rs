//! Progress updates for a running place search

use serde::{Deserialize, Serialize};

use super::Place;

/// Status of a place search as seen by the presentation layer.
///
/// A search emits any number of `Loading` updates followed by exactly one
/// terminal `Success` or `Error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    Loading { reason: String },
    Success { places: Vec<Place> },
    Error { message: String },
}

impl FetchStatus {
    pub fn loading<S: Into<String>>(reason: S) -> Self {
        Self::Loading {
            reason: reason.into(),
        }
    }
}

impl From<crate::Result<Vec<Place>>> for FetchStatus {
    fn from(result: crate::Result<Vec<Place>>) -> Self {
        match result {
            Ok(places) => FetchStatus::Success { places },
            Err(e) => FetchStatus::Error {
                message: e.user_message(),
            },
        }
    }
}
