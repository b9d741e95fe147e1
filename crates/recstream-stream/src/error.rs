use recstream_codec::CodecError;
use thiserror::Error;

/// Errors from pulling or closing a record stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The record at the current position could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] CodecError),

    /// The bytes framing the records are broken: the top-level value is
    /// neither an array nor an object, or a separator is missing or extra.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// A previous pull failed; the stream must be closed and discarded.
    #[error("stream is unusable after an earlier failure")]
    Poisoned,

    /// A per-record transform failed.
    #[error("record transform failed: {0}")]
    Transform(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// One or more sub-streams failed to close. Every sub-stream was still
    /// given the chance to close.
    #[error("failed to close {} sub-stream(s): {}", .0.len(), first_message(.0))]
    Close(Vec<StreamError>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// Wrap any error raised by a transform.
    pub fn transform(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transform(err.into())
    }
}

fn first_message(errors: &[StreamError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

/// Result alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
