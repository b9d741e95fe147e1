//! Pull-based record streams.
//!
//! Every stream implements [`RecordStream`]: pull one record at a time,
//! optionally filtered by kind, then close. Streams compose by wrapping.
//!
//! - [`ArrayStream`]: decodes a JSON array (or one bare object) from bytes
//! - [`MemoryStream`]: records already in memory
//! - [`MergedStream`]: concatenation of sub-streams
//! - [`TypedStream`]: restricts a stream to one kind
//! - [`TransformStream`]: applies a [`RecordTransform`] to every record
//! - [`Records`]: `Iterator` adapter with one-record lookahead
//!
//! # Example
//!
//! ```
//! use recstream_codec::RecordCodec;
//! use recstream_stream::{ArrayStream, RecordStream};
//! use recstream_types::RecordKind;
//!
//! let bytes = br#"[{"category":"system","names":["a"]},
//!                  {"category":"system.chemical","names":["b"]}]"#;
//! let mut stream = ArrayStream::from_slice(bytes, RecordCodec::default()).unwrap();
//! let chemical = stream.pull_typed(RecordKind::ChemicalSystem).unwrap().unwrap();
//! assert_eq!(chemical.names(), ["b".to_string()]);
//! assert!(stream.pull().unwrap().is_none());
//! stream.close().unwrap();
//! ```

pub mod array;
pub mod error;
pub mod iter;
pub mod memory;
pub mod merge;
pub mod traits;
pub mod transform;

pub use array::{ArrayStream, StreamState};
pub use error::{StreamError, StreamResult};
pub use iter::Records;
pub use memory::MemoryStream;
pub use merge::MergedStream;
pub use traits::RecordStream;
pub use transform::{RecordTransform, TransformStream, TypedStream};
