//! Everything related to reading PLY files.
//!
//! Reading happens in two steps. [`Reader::new`] parses the header and gives
//! you the [`Schema`] and the instance counts. Afterwards, the body is read
//! in a single pass with [`Reader::read_content`], which pushes all values
//! into a [`Target`], or with [`Reader::read`], which collects everything
//! into a [`PlyData`].
//!
//! # Format details
//!
//! - The header is ASCII, regardless of the body encoding. Lines can be
//!   terminated with `"\n"` or `"\r\n"`.
//! - In ASCII bodies each instance is on its own line. Empty lines are
//!   skipped, additional values at the end of a line are ignored.
//! - List lengths are always treated as unsigned integers of the width of
//!   their declared type, even if that type is signed. A list with a `char`
//!   length can thus have up to 255 elements.

use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
};

use byteorder::{BigEndian, LittleEndian};
use log::{debug, trace};

use crate::{
    error::Error,
    mem::{MemTarget, PlyData},
    schema::{ElementDef, PropertyType, Schema},
    target::{InstancePos, PropertyPos, Target},
    types::{Encoding, ScalarType},
};
use self::{
    ascii::AsciiDecoder,
    binary::BinaryDecoder,
    header::{parse_header, Header},
};

mod ascii;
mod binary;
mod header;



// ===========================================================================
// ===== Definition of `Reader`
// ===========================================================================

/// Decodes one PLY stream: the header on construction, the body later.
///
/// The reader wraps the given `io::Read` in a `BufReader` and thus may read
/// past the end of the PLY data. It never closes anything: pass `&mut file`
/// if you want to keep using the file afterwards.
#[derive(Debug)]
pub struct Reader<R: io::Read> {
    buf: BufReader<R>,
    header: Header,
}

impl Reader<File> {
    /// Opens the file at `path` (buffered) and parses its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(File::open(path)?)
    }
}

impl<R: io::Read> Reader<R> {
    /// Parses the header from `reader`. The body is left untouched until one
    /// of the reading methods is called. See [`Reader::open`] for files.
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut buf = BufReader::new(reader);
        let header = parse_header(&mut buf)?;

        Ok(Self { buf, header })
    }

    /// The schema described by the header.
    pub fn schema(&self) -> &Schema {
        &self.header.schema
    }

    /// The number of instances of each element, in schema order.
    pub fn counts(&self) -> &[u64] {
        &self.header.counts
    }

    /// The encoding of the body.
    pub fn encoding(&self) -> Encoding {
        self.header.encoding
    }

    /// Consumes the reader and returns the schema.
    pub fn into_schema(self) -> Schema {
        self.header.schema
    }

    /// Reads the whole body and pushes every value into `target`.
    ///
    /// Errors returned by `target` abort reading and are returned unchanged.
    pub fn read_content<T: Target>(mut self, target: &mut T) -> Result<(), Error> {
        let header = &self.header;
        let buf = &mut self.buf;

        match header.encoding {
            Encoding::Ascii => {
                drive(&mut AsciiDecoder::new(buf), &header.schema, &header.counts, target)?;
            }
            Encoding::BinaryBigEndian => {
                let mut decoder = BinaryDecoder::<_, BigEndian>::new(buf);
                drive(&mut decoder, &header.schema, &header.counts, target)?;
            }
            Encoding::BinaryLittleEndian => {
                let mut decoder = BinaryDecoder::<_, LittleEndian>::new(buf);
                drive(&mut decoder, &header.schema, &header.counts, target)?;
            }
        }

        debug!(
            "read PLY body ({}, {} instances)",
            header.encoding,
            header.counts.iter().sum::<u64>(),
        );
        Ok(())
    }

    /// Reads the whole body into a [`PlyData`].
    pub fn read(self) -> Result<PlyData, Error> {
        let mut target = MemTarget::new();
        self.read_content(&mut target)?;
        Ok(target.into_data())
    }
}

/// Reads a complete PLY file from `reader` into memory.
pub fn read(reader: impl io::Read) -> Result<PlyData, Error> {
    Reader::new(reader)?.read()
}

/// Reads only the header of a PLY file and returns its schema.
pub fn read_schema(reader: impl io::Read) -> Result<Schema, Error> {
    Reader::new(reader).map(Reader::into_schema)
}


// ===========================================================================
// ===== Body decoding
// ===========================================================================

/// Abstracts over the three body encodings.
///
/// The `ScalarType` arguments are the declared types; the binary decoders
/// only need the kind (implied by the method), ASCII uses it for error
/// messages.
pub(crate) trait Decode {
    /// Prepares reading the instance at `pos`. `count` is the number of
    /// instances the header declared for this element.
    fn start_instance(&mut self, pos: InstancePos<'_>, count: u64) -> Result<(), Error>;

    fn read_char(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<i8, Error>;
    fn read_short(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<i16, Error>;
    fn read_int(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<i32, Error>;
    fn read_float(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<f32, Error>;
    fn read_double(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<f64, Error>;

    /// Reads the length of a list.
    fn read_len(&mut self, pos: PropertyPos<'_>, len_type: ScalarType) -> Result<usize, Error>;

    fn end_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error>;
}

/// Buffers for list values, kept outside of the loop to retain allocations.
#[derive(Debug, Default)]
struct ListBufs {
    char: Vec<i8>,
    short: Vec<i16>,
    int: Vec<i32>,
    float: Vec<f32>,
    double: Vec<f64>,
}

/// Connects the Rust types values are carried in with the corresponding
/// decoder and target methods.
trait ScalarValue: Copy {
    fn decode(d: &mut impl Decode, pos: PropertyPos<'_>, ty: ScalarType) -> Result<Self, Error>;
    fn handle(t: &mut impl Target, pos: PropertyPos<'_>, v: Self) -> Result<(), Error>;
    fn handle_list(t: &mut impl Target, pos: PropertyPos<'_>, v: &[Self]) -> Result<(), Error>;
    fn buf(bufs: &mut ListBufs) -> &mut Vec<Self>;
}

macro_rules! impl_scalar_value {
    ($ty:ident, $read:ident, $handle:ident, $handle_list:ident, $buf:ident) => {
        impl ScalarValue for $ty {
            fn decode(
                d: &mut impl Decode,
                pos: PropertyPos<'_>,
                ty: ScalarType,
            ) -> Result<Self, Error> {
                d.$read(pos, ty)
            }
            fn handle(t: &mut impl Target, pos: PropertyPos<'_>, v: Self) -> Result<(), Error> {
                t.$handle(pos, v)
            }
            fn handle_list(
                t: &mut impl Target,
                pos: PropertyPos<'_>,
                v: &[Self],
            ) -> Result<(), Error> {
                t.$handle_list(pos, v)
            }
            fn buf(bufs: &mut ListBufs) -> &mut Vec<Self> {
                &mut bufs.$buf
            }
        }
    }
}

impl_scalar_value!(i8, read_char, handle_char, handle_char_list, char);
impl_scalar_value!(i16, read_short, handle_short, handle_short_list, short);
impl_scalar_value!(i32, read_int, handle_int, handle_int_list, int);
impl_scalar_value!(f32, read_float, handle_float, handle_float_list, float);
impl_scalar_value!(f64, read_double, handle_double, handle_double_list, double);

/// Reads one property and passes it to the target.
type PropReader<D, T> = fn(&mut D, &mut T, PropertyPos<'_>, &mut ListBufs) -> Result<(), Error>;

fn read_scalar<D: Decode, T: Target, P: ScalarValue>(
    d: &mut D,
    t: &mut T,
    pos: PropertyPos<'_>,
    _: &mut ListBufs,
) -> Result<(), Error> {
    let v = P::decode(d, pos, pos.property.ty().scalar_type())?;
    P::handle(t, pos, v)
}

fn read_list<D: Decode, T: Target, P: ScalarValue>(
    d: &mut D,
    t: &mut T,
    pos: PropertyPos<'_>,
    bufs: &mut ListBufs,
) -> Result<(), Error> {
    let (len_type, scalar_type) = match pos.property.ty() {
        PropertyType::List { len_type, scalar_type } => (len_type, scalar_type),
        PropertyType::Scalar(ty) => (ty, ty),
    };

    let len = d.read_len(pos, len_type)?;
    let buf = P::buf(bufs);
    buf.clear();

    // We don't reserve `len` upfront, as it comes straight from the file.
    for _ in 0..len {
        buf.push(P::decode(d, pos, scalar_type)?);
    }

    P::handle_list(t, pos, buf)
}

/// Returns the function that reads a property of type `ty`. Since the type
/// system is closed, this is total: every property type has a reader.
fn prop_reader<D: Decode, T: Target>(ty: PropertyType) -> PropReader<D, T> {
    macro_rules! make_fn_ptr {
        ($fun:ident, $scalar_type:expr) => {
            match $scalar_type.kind() {
                crate::types::ValueKind::Char => $fun::<D, T, i8>,
                crate::types::ValueKind::Short => $fun::<D, T, i16>,
                crate::types::ValueKind::Int => $fun::<D, T, i32>,
                crate::types::ValueKind::Float => $fun::<D, T, f32>,
                crate::types::ValueKind::Double => $fun::<D, T, f64>,
            }
        }
    }

    match ty {
        PropertyType::Scalar(scalar_type) => make_fn_ptr!(read_scalar, scalar_type),
        PropertyType::List { scalar_type, .. } => make_fn_ptr!(read_list, scalar_type),
    }
}

/// Walks the schema and drives `decoder` and `target` in lockstep.
fn drive<D: Decode, T: Target>(
    decoder: &mut D,
    schema: &Schema,
    counts: &[u64],
    target: &mut T,
) -> Result<(), Error> {
    target.set_schema(schema)?;

    let mut bufs = ListBufs::default();
    for (element_index, (element, &count)) in schema.elements().iter().zip(counts).enumerate() {
        let readers = element.property_defs()
            .iter()
            .map(|p| prop_reader::<D, T>(p.ty()))
            .collect::<Vec<_>>();

        target.start_list(element_index, element, count)?;
        read_instances(decoder, target, element_index, element, count, &readers, &mut bufs)?;
        target.end_list(element_index, element)?;

        trace!("read {} instances of element '{}'", count, element.name());
    }

    Ok(())
}

fn read_instances<D: Decode, T: Target>(
    decoder: &mut D,
    target: &mut T,
    element_index: usize,
    element: &ElementDef,
    count: u64,
    readers: &[PropReader<D, T>],
    bufs: &mut ListBufs,
) -> Result<(), Error> {
    for instance_index in 0..count {
        let pos = InstancePos { element_index, element, instance_index };
        decoder.start_instance(pos, count)?;
        target.start_instance(pos)?;

        let props = element.property_defs().iter().zip(readers).enumerate();
        for (property_index, (property, reader)) in props {
            let prop_pos = PropertyPos { instance: pos, property_index, property };
            reader(decoder, target, prop_pos, bufs)?;
        }

        decoder.end_instance(pos)?;
        target.end_instance(pos)?;
    }

    Ok(())
}
