use recstream_codec::CodecError;
use recstream_stream::StreamError;
use thiserror::Error;

/// Errors from encoding a record stream.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("upstream stream failed: {0}")]
    Stream(#[from] StreamError),

    #[error("record encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An earlier read failed. The encoder has to be closed and discarded.
    #[error("encoder is unusable after an earlier failure")]
    Poisoned,
}

impl From<EncodeError> for std::io::Error {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Io(io) => io,
            other => std::io::Error::other(other),
        }
    }
}

pub type EncodeResult<T> = Result<T, EncodeError>;
