//! Uniform response envelope returned by every facade operation.
//!
//! The API transport maps `status_code` directly onto its own status; `data`
//! is the operation payload on success, or structured error details (such as
//! the offending field) on failure. Nothing in the engine raises past this
//! shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use super::error::DomainError;

/// `{statusCode, message, data}` wrapper around every operation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    status_code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl Envelope {
    /// Build a success envelope with the given status and payload.
    ///
    /// A payload that fails to serialise is reported as an internal error
    /// envelope rather than a panic; the engine never raises past here.
    pub fn success<T: Serialize>(status_code: u16, message: impl Into<String>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                status_code,
                message: message.into(),
                data: Some(value),
            },
            Err(err) => {
                error!(error = %err, "response payload failed to serialise");
                Self::from_error(&DomainError::internal("failed to encode response payload"))
            }
        }
    }

    /// Build a failure envelope from a domain error.
    pub fn from_error(err: &DomainError) -> Self {
        Self {
            status_code: err.code().status_code(),
            message: err.message().to_owned(),
            data: err.details().cloned(),
        }
    }

    /// Transport status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Human-readable outcome description.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Operation payload, if any.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Whether the envelope reports a success status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
