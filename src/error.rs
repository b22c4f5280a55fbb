use thiserror::Error;

use crate::money::ParseMoneyError;

/// The only domain error: the request did not describe a well-formed invoice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedInputError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("field `{field}` entry {index} ({token:?}): {source}")]
    InvalidNumber {
        field: &'static str,
        index: usize,
        token: String,
        source: ParseMoneyError,
    },
}

impl MalformedInputError {
    /// Short machine-readable code for boundary responses.
    pub fn code(&self) -> &'static str {
        match self {
            MalformedInputError::MissingField { .. } => "missing_field",
            MalformedInputError::LengthMismatch { .. } => "length_mismatch",
            MalformedInputError::InvalidNumber { .. } => "invalid_number",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            MalformedInputError::MissingField { field }
            | MalformedInputError::LengthMismatch { field, .. }
            | MalformedInputError::InvalidNumber { field, .. } => *field,
        }
    }
}
