//! Lazy encoder turning a record stream back into a JSON array.
//!
//! [`RecordEncoder`] implements [`std::io::Read`], so the encoded array can
//! be piped into anything that consumes bytes (a file, a socket,
//! `std::io::copy`) without materializing the whole document.

pub mod encoder;
pub mod error;

pub use encoder::{encode_to_vec, RecordEncoder};
pub use error::{EncodeError, EncodeResult};
