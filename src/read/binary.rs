use std::{
    io::{self, BufRead},
    marker::PhantomData,
};

use byteorder::ByteOrder;

use crate::{
    error::{Error, ErrorKind},
    target::{InstancePos, PropertyPos},
    types::ScalarType,
};
use super::Decode;


/// Decodes a binary body with byte order `B`.
pub(crate) struct BinaryDecoder<'r, R: BufRead, B: ByteOrder> {
    reader: &'r mut R,
    buf: [u8; 8],
    _dummy: PhantomData<B>,
}

impl<'r, R: BufRead, B: ByteOrder> BinaryDecoder<'r, R, B> {
    pub(crate) fn new(reader: &'r mut R) -> Self {
        Self {
            reader,
            buf: [0; 8],
            _dummy: PhantomData,
        }
    }

    /// Reads exactly `n` bytes into `self.buf[..n]`.
    fn fill(&mut self, n: usize, pos: PropertyPos<'_>) -> Result<&[u8], Error> {
        let mut found = 0;
        while found < n {
            match self.reader.read(&mut self.buf[found..n]) {
                Ok(0) => {
                    return Err(Error::new(|| ErrorKind::UnexpectedEof {
                        element: pos.instance.element.name().to_string(),
                        instance: pos.instance_index(),
                        expected: n,
                        found,
                    }));
                }
                Ok(len) => found += len,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(&self.buf[..n])
    }
}

impl<R: BufRead, B: ByteOrder> Decode for BinaryDecoder<'_, R, B> {
    fn start_instance(&mut self, _: InstancePos<'_>, _: u64) -> Result<(), Error> {
        Ok(())
    }

    fn read_char(&mut self, pos: PropertyPos<'_>, _: ScalarType) -> Result<i8, Error> {
        self.fill(1, pos).map(|b| b[0] as i8)
    }

    fn read_short(&mut self, pos: PropertyPos<'_>, _: ScalarType) -> Result<i16, Error> {
        self.fill(2, pos).map(B::read_i16)
    }

    fn read_int(&mut self, pos: PropertyPos<'_>, _: ScalarType) -> Result<i32, Error> {
        self.fill(4, pos).map(B::read_i32)
    }

    fn read_float(&mut self, pos: PropertyPos<'_>, _: ScalarType) -> Result<f32, Error> {
        self.fill(4, pos).map(B::read_f32)
    }

    fn read_double(&mut self, pos: PropertyPos<'_>, _: ScalarType) -> Result<f64, Error> {
        self.fill(8, pos).map(B::read_f64)
    }

    fn read_len(&mut self, pos: PropertyPos<'_>, len_type: ScalarType) -> Result<usize, Error> {
        // Length fields are unsigned, regardless of the declared signedness.
        let len: u32 = match len_type.size() {
            1 => self.fill(1, pos)?[0].into(),
            2 => B::read_u16(self.fill(2, pos)?).into(),
            _ => B::read_u32(self.fill(4, pos)?),
        };

        Ok(len as usize)
    }

    fn end_instance(&mut self, _: InstancePos<'_>) -> Result<(), Error> {
        Ok(())
    }
}
