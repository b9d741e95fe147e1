//! Record model for recstream.
//!
//! A record is one node of a document tree: a category tag selecting its
//! variant, typed fields, child records, and extension fields that the
//! schema does not know about but which must survive a round trip.
//!
//! # Key Types
//!
//! - [`RecordKind`]: the variant hierarchy and its category tags
//! - [`Record`]: closed tagged union over the variants, plus an unknown arm
//! - [`Scalar`], [`Pages`], [`Name`] and the other leaf values
//!
//! Every body and leaf type is bound to JSON with serde. [`field`] holds the
//! `deserialize_with` helpers for the looser parts of the wire format.

pub mod error;
pub mod field;
pub mod kind;
pub mod record;
pub mod value;

pub use error::{TypeError, TypeResult};
pub use field::{decode_field, json_type_name, Extensions};
pub use kind::RecordKind;
pub use record::{Alloy, ChemicalSystem, Record, System, UnknownRecord};
pub use value::{
    Composition, Identifier, License, Name, Pages, ProcessStep, Property, Reference, Scalar,
    ScalarValue,
};
