//! Writing PLY files from any [`Source`].
//!
//! # Format details
//!
//! - Header lines are terminated by `'\n'`. The PLY description mentions carriage
//!   returns, but neither real files nor other readers use them.
//! - The header is always regenerated: instance counts are taken from the
//!   [`Source`] and types are written with their traditional names (`uchar`,
//!   not `uint8`).
//! - ASCII bodies use the `Display` output of the Rust values, which is the
//!   shortest representation that parses back to the same value. Unsigned
//!   types and list lengths are printed as unsigned numbers.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use log::debug;

use crate::{
    error::{Error, ErrorKind},
    schema::{PropertyDef, PropertyType},
    source::{Record, Source},
    types::{Encoding, ScalarType},
};
use self::ser::{
    AsciiSerializer, BinaryBeSerializer, BinaryLeSerializer, PlyScalar, Serializer,
};

mod ser;

#[cfg(test)]
mod tests;


// ===============================================================================================
// ===== PLY Config
// ===============================================================================================

/// What to do when a [`Record`] has no value for a property the schema
/// declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValues {
    /// Abort writing with an `ErrorKind::DataIncomplete` error.
    Reject,

    /// Write `0` for scalars and an empty list for list properties.
    Zero,
}

impl Default for MissingValues {
    fn default() -> Self {
        MissingValues::Reject
    }
}

/// Settings for writing: the body encoding, extra header comments and the
/// [`MissingValues`] policy. Turn it into a [`Writer`] with
/// [`Config::into_writer`] or use one of the `write_to_*` shortcuts.
#[derive(Clone, Debug)]
pub struct Config {
    encoding: Encoding,
    comments: Vec<String>,
    missing_values: MissingValues,
}

impl Config {
    /// Binary encoding in the byte order of the current platform.
    pub fn binary() -> Self {
        Self::new(Encoding::binary_native())
    }

    /// ASCII encoding. Human readable, but larger and slower than binary.
    pub fn ascii() -> Self {
        Self::new(Encoding::Ascii)
    }

    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            comments: vec![],
            missing_values: MissingValues::default(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Adds a header comment. It is written after the comments of the schema.
    ///
    /// # Panics
    ///
    /// If `comment` contains a line break.
    pub fn add_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();

        assert!(
            !comment.contains(|c: char| c == '\n' || c == '\r'),
            "header comments must be single lines",
        );

        self.comments.push(comment);
        self
    }

    /// Sets what happens when a value is missing. Default:
    /// [`MissingValues::Reject`].
    pub fn missing_values(mut self, policy: MissingValues) -> Self {
        self.missing_values = policy;
        self
    }

    /// Creates a writer that writes to `writer` with this configuration.
    pub fn into_writer<W: io::Write>(self, writer: W) -> Writer<W> {
        Writer {
            config: self,
            writer,
        }
    }

    /// Writes `source` into a new `Vec<u8>`.
    pub fn write_to_memory(self, source: &impl Source) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.into_writer(&mut out).write(source)?;
        Ok(out)
    }

    /// Creates (or truncates) the given file and writes `source` into it.
    pub fn write_to_file(self, path: impl AsRef<Path>, source: &impl Source) -> Result<(), Error> {
        let mut file = BufWriter::new(File::create(path)?);
        self.into_writer(&mut file).write(source)?;
        file.flush()?;
        Ok(())
    }
}


// ===============================================================================================
// ===== PLY Writer
// ===============================================================================================

/// A writer able to write binary and ASCII PLY files.
///
///
/// # Example
///
/// ```
/// use std::{fs::File, io::BufWriter};
/// use plyx::{Error, PlyData, types::Encoding, write::Config};
///
/// fn save(data: &PlyData, path: &str) -> Result<(), Error> {
///     let out = BufWriter::new(File::create(path)?);
///     Config::new(Encoding::BinaryBigEndian)
///         .add_comment("exported by plyx")
///         .into_writer(out)
///         .write(data)
/// }
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    config: Config,
    writer: W,
}

impl<W: io::Write> Writer<W> {
    /// Same as [`Config::into_writer`].
    pub fn new(config: Config, writer: W) -> Self {
        Self { config, writer }
    }

    /// Writes the header and all instances of `source`.
    pub fn write(mut self, source: &impl Source) -> Result<(), Error> {
        let schema = source.schema();
        let counts = source.counts();
        let w = &mut self.writer;

        // ===================================================================
        // ===== Write header (this part is always ASCII)
        // ===================================================================
        // Magic signature
        w.write_all(b"ply\n")?;

        // The line defining the format of the file
        let format_line = match self.config.encoding {
            Encoding::Ascii => b"format ascii 1.0\n" as &[_],
            Encoding::BinaryBigEndian => b"format binary_big_endian 1.0\n",
            Encoding::BinaryLittleEndian => b"format binary_little_endian 1.0\n",
        };
        w.write_all(format_line)?;

        // Add all comments
        for comment in schema.comments().iter().chain(&self.config.comments) {
            writeln!(w, "comment {}", comment)?;
        }

        // Define all elements with their properties
        for (element_def, count) in schema.elements().iter().zip(&counts) {
            writeln!(w, "element {} {}", element_def.name(), count)?;
            for prop in element_def.property_defs() {
                match prop.ty() {
                    PropertyType::Scalar(ty) => {
                        writeln!(w, "property {} {}", ty.ply_type_name(), prop.name())?;
                    }
                    PropertyType::List { scalar_type, len_type } => {
                        writeln!(
                            w,
                            "property list {} {} {}",
                            len_type.ply_type_name(),
                            scalar_type.ply_type_name(),
                            prop.name(),
                        )?;
                    }
                }
            }
        }

        w.write_all(b"end_header\n")?;


        // ===================================================================
        // ===== Write body
        // ===================================================================
        let missing = self.config.missing_values;
        match self.config.encoding {
            Encoding::Ascii => {
                write_body(&mut AsciiSerializer::new(w), source, &counts, missing)?;
            }
            Encoding::BinaryBigEndian => {
                write_body(&mut BinaryBeSerializer::new(w), source, &counts, missing)?;
            }
            Encoding::BinaryLittleEndian => {
                write_body(&mut BinaryLeSerializer::new(w), source, &counts, missing)?;
            }
        }

        debug!(
            "wrote PLY file ({}, {} instances)",
            self.config.encoding,
            counts.iter().sum::<u64>(),
        );
        Ok(())
    }
}

/// Writes `source` as ASCII PLY.
pub fn write_ascii(source: &impl Source, writer: impl io::Write) -> Result<(), Error> {
    Config::ascii().into_writer(writer).write(source)
}

/// Writes `source` as binary little endian PLY.
pub fn write_binary_little_endian(source: &impl Source, writer: impl io::Write) -> Result<(), Error> {
    Config::new(Encoding::BinaryLittleEndian).into_writer(writer).write(source)
}

/// Writes `source` as binary big endian PLY.
pub fn write_binary_big_endian(source: &impl Source, writer: impl io::Write) -> Result<(), Error> {
    Config::new(Encoding::BinaryBigEndian).into_writer(writer).write(source)
}


// ===============================================================================================
// ===== Body writing implementation
// ===============================================================================================

/// Where we are while writing one property.
#[derive(Clone, Copy)]
struct PropCtx<'a> {
    element: &'a str,
    instance: u64,
    property: &'a PropertyDef,
    missing: MissingValues,
}

impl PropCtx<'_> {
    fn missing_value(&self) -> Error {
        Error::new(|| ErrorKind::DataIncomplete {
            element: self.element.to_string(),
            instance: self.instance,
            property: self.property.name().to_string(),
        })
    }
}

/// Connects the eight PLY types with the kind their values are stored in.
/// `Stored` is what `Record` returns, `Self` is what is written.
trait PlyValue: PlyScalar {
    type Stored: Copy + Default + 'static;

    fn get(rec: &dyn Record, name: &str) -> Option<Self::Stored>;
    fn get_list<'r>(rec: &'r dyn Record, name: &str) -> Option<&'r [Self::Stored]>;
    fn convert(v: Self::Stored) -> Self;
}

macro_rules! impl_ply_value {
    ($ty:ident, $stored:ident, $get:ident, $get_list:ident) => {
        impl PlyValue for $ty {
            type Stored = $stored;

            fn get(rec: &dyn Record, name: &str) -> Option<$stored> {
                rec.$get(name)
            }
            fn get_list<'r>(rec: &'r dyn Record, name: &str) -> Option<&'r [$stored]> {
                rec.$get_list(name)
            }
            fn convert(v: $stored) -> Self {
                v as $ty
            }
        }
    }
}

impl_ply_value!(i8, i8, get_char, get_char_list);
impl_ply_value!(u8, i8, get_char, get_char_list);
impl_ply_value!(i16, i16, get_short, get_short_list);
impl_ply_value!(u16, i16, get_short, get_short_list);
impl_ply_value!(i32, i32, get_int, get_int_list);
impl_ply_value!(u32, i32, get_int, get_int_list);
impl_ply_value!(f32, f32, get_float, get_float_list);
impl_ply_value!(f64, f64, get_double, get_double_list);

type PropWriter<S> = fn(&mut S, &dyn Record, PropCtx<'_>) -> Result<(), Error>;

fn write_scalar<S: Serializer, P: PlyValue>(
    ser: &mut S,
    rec: &dyn Record,
    ctx: PropCtx<'_>,
) -> Result<(), Error> {
    let v = match (P::get(rec, ctx.property.name()), ctx.missing) {
        (Some(v), _) => v,
        (None, MissingValues::Zero) => Default::default(),
        (None, MissingValues::Reject) => return Err(ctx.missing_value()),
    };

    ser.add(P::convert(v))
}

fn write_list<S: Serializer, P: PlyValue>(
    ser: &mut S,
    rec: &dyn Record,
    ctx: PropCtx<'_>,
) -> Result<(), Error> {
    let list: &[P::Stored] = match (P::get_list(rec, ctx.property.name()), ctx.missing) {
        (Some(list), _) => list,
        (None, MissingValues::Zero) => &[],
        (None, MissingValues::Reject) => return Err(ctx.missing_value()),
    };

    let len_type = ctx.property.ty().len_type().unwrap_or(ScalarType::UInt);
    write_len(ser, len_type, list.len(), ctx.property)?;
    for &v in list {
        ser.add(P::convert(v))?;
    }

    Ok(())
}

/// Writes a list length. Lengths are always written as unsigned integer of
/// the width of `len_type`.
fn write_len<S: Serializer>(
    ser: &mut S,
    len_type: ScalarType,
    len: usize,
    property: &PropertyDef,
) -> Result<(), Error> {
    let fits = len_type.max_list_len().map(|max| len as u64 <= max).unwrap_or(false);
    if !fits {
        return Err(Error::new(|| ErrorKind::ListTooLong {
            property: property.name().to_string(),
            len,
            len_type,
        }));
    }

    match len_type.size() {
        1 => ser.add(len as u8),
        2 => ser.add(len as u16),
        _ => ser.add(len as u32),
    }
}

/// Returns the function that writes a property of type `ty`.
fn prop_writer<S: Serializer>(ty: PropertyType) -> PropWriter<S> {
    macro_rules! make_fn_ptr {
        ($fun:ident, $scalar_type:expr) => {
            match $scalar_type {
                ScalarType::Char => $fun::<S, i8>,
                ScalarType::UChar => $fun::<S, u8>,
                ScalarType::Short => $fun::<S, i16>,
                ScalarType::UShort => $fun::<S, u16>,
                ScalarType::Int => $fun::<S, i32>,
                ScalarType::UInt => $fun::<S, u32>,
                ScalarType::Float => $fun::<S, f32>,
                ScalarType::Double => $fun::<S, f64>,
            }
        }
    }

    match ty {
        PropertyType::Scalar(scalar_type) => make_fn_ptr!(write_scalar, scalar_type),
        PropertyType::List { scalar_type, .. } => make_fn_ptr!(write_list, scalar_type),
    }
}

fn write_body<S: Serializer>(
    ser: &mut S,
    source: &impl Source,
    counts: &[u64],
    missing: MissingValues,
) -> Result<(), Error> {
    let schema = source.schema();

    for (element_index, element) in schema.elements().iter().enumerate() {
        let writers = element.property_defs()
            .iter()
            .map(|p| prop_writer::<S>(p.ty()))
            .collect::<Vec<_>>();

        let mut instance = 0;
        source.visit_instances(element_index, &mut |rec: &dyn Record| {
            for (property, writer) in element.property_defs().iter().zip(&writers) {
                let ctx = PropCtx {
                    element: element.name(),
                    instance,
                    property,
                    missing,
                };
                writer(ser, rec, ctx)?;
            }

            instance += 1;
            ser.end_element()
        })?;

        // The header already contains the count, so the source must agree
        // with itself.
        if instance != counts[element_index] {
            return Err(Error::new(|| ErrorKind::MissingInstances {
                element: element.name().to_string(),
                expected: counts[element_index],
                found: instance,
            }));
        }
    }

    Ok(())
}
