//! Schema-aware record codec.
//!
//! - [`RecordCodec`]: decodes one record from a reader or value, and encodes
//!   one record into a self-contained JSON chunk
//! - [`CodecConfig`]: discriminator field, unknown-category policy, layout
//!
//! Tokenizing is serde_json's streaming deserializer. The codec never looks
//! past a single record. Stream-level concerns (array framing, lookahead,
//! closing) live in `recstream-stream` and `recstream-encoder`.

pub mod codec;
pub mod config;
pub mod error;

pub use codec::RecordCodec;
pub use config::{CodecConfig, UnknownCategoryPolicy};
pub use error::{CodecError, CodecResult};
