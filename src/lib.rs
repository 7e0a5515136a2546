//! Reading and writing PLY files in a streaming fashion.
//!
//! PLY ("Polygon File Format") files consist of an ASCII header describing
//! a [`Schema`] (a list of elements, each with a list of typed properties)
//! followed by a body with all instances of those elements. The body is
//! encoded either as ASCII text or as binary data in little or big endian.
//!
//! This crate offers three levels of abstraction:
//!
//! - Streaming: the [`read::Reader`] pushes every decoded value into a
//!   [`Target`] and the [`write::Writer`] pulls every value from a
//!   [`Source`]. Nothing but the current instance is held in memory.
//! - In memory: [`PlyData`] holds a schema plus all instances. It can be
//!   read with [`read::read`] and written with any writer function.
//! - Object binding: the [`bind`] module maps properties directly to fields
//!   of your own types.
//!
//! ```
//! use plyx::{Error, write::Config};
//!
//! fn to_binary(ascii: &[u8]) -> Result<Vec<u8>, Error> {
//!     let data = plyx::read::read(ascii)?;
//!     Config::binary().write_to_memory(&data)
//! }
//! ```
//!
//! All fallible operations return [`Error`]. Diagnostics that don't lead to
//! an error (e.g. ignored values) are emitted via the `log` crate.


pub mod bind;
pub mod error;
pub mod mem;
pub mod read;
pub mod schema;
pub mod source;
pub mod target;
pub mod types;
pub mod write;

pub use self::{
    error::{Error, ErrorCategory, ErrorKind},
    mem::{Instance, MemTarget, PlyData, Property},
    schema::{ElementDef, PropertyDef, PropertyType, Schema},
    source::{Record, Source},
    target::{InstancePos, NullTarget, PropertyPos, Target},
    types::{Encoding, ScalarType, ValueKind},
};
