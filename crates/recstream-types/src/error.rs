use thiserror::Error;

/// Errors produced while decoding record fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("unknown record category: {0}")]
    UnknownCategory(String),
}

impl TypeError {
    /// Shorthand for an [`TypeError::InvalidField`] error.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result alias for field decoding.
pub type TypeResult<T> = Result<T, TypeError>;
