//! Error types for figure construction

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FigError {
    #[error("invalid shape for `{arg}`: {expected}")]
    InvalidShape { arg: &'static str, expected: String },

    #[error("length mismatch for `{arg}`: expected {expected}, got {actual}")]
    LengthMismatch {
        arg: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid color specification: {0}")]
    ColorSpec(String),

    #[error("invalid color entry at index {index}: {reason}")]
    ColorEntry { index: usize, reason: String },

    #[error("invalid value for `{arg}`: {reason}")]
    InvalidValue { arg: &'static str, reason: String },

    #[error("draw call rejected: {0}")]
    Draw(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, error_stack::Report<FigError>>;

impl FigError {
    pub(crate) fn shape(arg: &'static str, expected: impl Into<String>) -> Self {
        Self::InvalidShape {
            arg,
            expected: expected.into(),
        }
    }

    pub(crate) fn value(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            arg,
            reason: reason.into(),
        }
    }
}
