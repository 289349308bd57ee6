//! Engine-level error taxonomy.
//!
//! Every failure the engine can surface to a caller is one of five
//! categories. Validation and gate failures are produced directly by the
//! services; store and cache transport failures are mapped to `Internal` at
//! the port boundary. Errors never escape the orchestration facade: they are
//! folded into the response envelope instead.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Stable machine-readable category describing why an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or out-of-range input; the offending field is named in the
    /// error details where one exists.
    InvalidArgument,
    /// Role or ownership check failed.
    Forbidden,
    /// A referenced entity is absent.
    NotFound,
    /// State-gate or uniqueness violation, including lost races on
    /// conditional writes.
    Conflict,
    /// Store, cache, or publish failure not attributable to caller input.
    Internal,
}

impl ErrorCode {
    /// Transport status the facade reports for this category.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }
}

/// Error payload carried through the engine and into the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl DomainError {
    /// Create a new error with the given category and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Error category.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to the caller.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary structured details, if any.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Name the offending input field in the error details.
    pub fn with_field(self, field: &str) -> Self {
        self.with_details(json!({ "field": field }))
    }

    /// Convenience constructor for [`ErrorCode::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(ErrorCode::InvalidArgument, 400)]
    #[case(ErrorCode::Forbidden, 403)]
    #[case(ErrorCode::NotFound, 404)]
    #[case(ErrorCode::Conflict, 409)]
    #[case(ErrorCode::Internal, 500)]
    fn codes_map_to_transport_status(#[case] code: ErrorCode, #[case] status: u16) {
        assert_eq!(code.status_code(), status);
    }

    #[rstest]
    fn with_field_names_the_offending_input() {
        let err = DomainError::invalid_argument("fare must be a positive number").with_field("fare");
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.details(), Some(&json!({ "field": "fare" })));
    }

    #[rstest]
    fn display_uses_the_message() {
        let err = DomainError::conflict("ride is not available for booking");
        assert_eq!(err.to_string(), "ride is not available for booking");
    }
}
