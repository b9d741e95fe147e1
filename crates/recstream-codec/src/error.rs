use recstream_types::TypeError;
use thiserror::Error;

/// Errors from decoding or encoding a single record.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not well-formed JSON, or reading them failed.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Field(#[from] TypeError),

    /// A known variant whose fields do not match its schema.
    #[error("invalid `{category}` record: {source}")]
    Invalid {
        category: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown record category: {0}")]
    UnknownCategory(String),

    #[error("expected a record object, found {0}")]
    NotAnObject(&'static str),

    #[error("invalid codec configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;
