//! Serializers abstracting over the body encoding (and things like
//! separators and line endings).

use std::{
    fmt,
    io::{self, Write},
};

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::Error;


/// Rust types that correspond to one of the PLY scalar types.
pub(crate) trait PlyScalar: Copy + fmt::Display {
    fn write_binary<B: ByteOrder, W: Write>(self, w: &mut W) -> io::Result<()>;
}

impl PlyScalar for i8 {
    fn write_binary<B: ByteOrder, W: Write>(self, w: &mut W) -> io::Result<()> {
        w.write_i8(self)
    }
}

impl PlyScalar for u8 {
    fn write_binary<B: ByteOrder, W: Write>(self, w: &mut W) -> io::Result<()> {
        w.write_u8(self)
    }
}

macro_rules! impl_ply_scalar {
    ($ty:ident, $method:ident) => {
        impl PlyScalar for $ty {
            fn write_binary<B: ByteOrder, W: Write>(self, w: &mut W) -> io::Result<()> {
                w.$method::<B>(self)
            }
        }
    }
}

impl_ply_scalar!(i16, write_i16);
impl_ply_scalar!(u16, write_u16);
impl_ply_scalar!(i32, write_i32);
impl_ply_scalar!(u32, write_u32);
impl_ply_scalar!(f32, write_f32);
impl_ply_scalar!(f64, write_f64);

/// Writes values in one specific encoding.
pub(crate) trait Serializer {
    fn add<P: PlyScalar>(&mut self, v: P) -> Result<(), Error>;

    /// Called after all properties of one instance have been added.
    fn end_element(&mut self) -> Result<(), Error>;
}

#[derive(Debug)]
pub(crate) struct AsciiSerializer<'a, W: Write> {
    writer: &'a mut W,
    at_start_of_line: bool,
}

impl<'a, W: Write> AsciiSerializer<'a, W> {
    pub(crate) fn new(w: &'a mut W) -> Self {
        Self {
            writer: w,
            at_start_of_line: true,
        }
    }

    fn write_separator(&mut self) -> Result<(), Error> {
        if self.at_start_of_line {
            self.at_start_of_line = false;
        } else {
            self.writer.write_all(b" ")?;
        }

        Ok(())
    }
}

impl<W: Write> Serializer for AsciiSerializer<'_, W> {
    fn add<P: PlyScalar>(&mut self, v: P) -> Result<(), Error> {
        self.write_separator()?;
        write!(self.writer, "{}", v)?;
        Ok(())
    }

    /// Instances without any values (elements without properties) produce
    /// no line at all.
    fn end_element(&mut self) -> Result<(), Error> {
        if !self.at_start_of_line {
            self.writer.write_all(b"\n")?;
            self.at_start_of_line = true;
        }
        Ok(())
    }
}

macro_rules! gen_binary_block {
    ($name:ident, $endianness:ident) => {
        #[derive(Debug)]
        pub(crate) struct $name<'a, W: Write> {
            writer: &'a mut W,
        }

        impl<'a, W: Write> $name<'a, W> {
            pub(crate) fn new(w: &'a mut W) -> Self {
                Self {
                    writer: w,
                }
            }
        }

        impl<W: Write> Serializer for $name<'_, W> {
            fn add<P: PlyScalar>(&mut self, v: P) -> Result<(), Error> {
                v.write_binary::<$endianness, _>(&mut *self.writer)?;
                Ok(())
            }

            fn end_element(&mut self) -> Result<(), Error> {
                // NOOP
                Ok(())
            }
        }
    }
}

gen_binary_block!(BinaryBeSerializer, BigEndian);
gen_binary_block!(BinaryLeSerializer, LittleEndian);
