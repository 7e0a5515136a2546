use std::io::BufRead;

use log::warn;

use crate::{
    error::{Error, ErrorKind},
    target::{InstancePos, PropertyPos},
    types::ScalarType,
};
use super::Decode;


/// Decodes the ASCII body: one non-empty line per instance, values separated
/// by whitespace. Instances of elements without properties take no line.
///
/// Lines are read as bytes. Invalid UTF-8 is replaced by U+FFFD, so such a
/// token fails to parse as a number like any other garbage.
pub(crate) struct AsciiDecoder<'r, R: BufRead> {
    reader: &'r mut R,
    raw: Vec<u8>,
    line: String,

    /// Byte ranges of the tokens in `line`.
    tokens: Vec<(usize, usize)>,
    cursor: usize,
    warned_extra_tokens: bool,
}

impl<'r, R: BufRead> AsciiDecoder<'r, R> {
    pub(crate) fn new(reader: &'r mut R) -> Self {
        Self {
            reader,
            raw: Vec::new(),
            line: String::new(),
            tokens: Vec::new(),
            cursor: 0,
            warned_extra_tokens: false,
        }
    }

    fn next_token(&mut self, pos: PropertyPos<'_>) -> Result<&str, Error> {
        match self.tokens.get(self.cursor) {
            Some(&(start, end)) => {
                self.cursor += 1;
                Ok(&self.line[start..end])
            }
            None => Err(Error::new(|| ErrorKind::TooFewValues {
                element: pos.instance.element.name().to_string(),
                instance: pos.instance_index(),
                property: pos.property.name().to_string(),
            })),
        }
    }

    /// Parses an integer token of type `ty` whose width is `bits`. Both the
    /// signed and the unsigned range of that width are accepted, the result
    /// is the two's complement bit pattern as `i64`.
    fn integer(&mut self, pos: PropertyPos<'_>, ty: ScalarType, bits: u32) -> Result<i64, Error> {
        let token = self.next_token(pos)?;
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << bits) - 1;

        match token.parse::<i64>() {
            Ok(v) if v >= min && v <= max => Ok(v),
            Ok(_) => Err(invalid_number(token, ty, "value out of range")),
            Err(e) => Err(invalid_number(token, ty, &e.to_string())),
        }
    }
}

fn invalid_number(token: &str, ty: ScalarType, msg: &str) -> Error {
    Error::new(|| ErrorKind::InvalidNumber {
        token: token.to_string(),
        ty,
        msg: msg.to_string(),
    })
}

impl<R: BufRead> Decode for AsciiDecoder<'_, R> {
    fn start_instance(&mut self, pos: InstancePos<'_>, count: u64) -> Result<(), Error> {
        self.tokens.clear();
        self.cursor = 0;
        if pos.element.property_defs().is_empty() {
            return Ok(());
        }

        // Skip empty lines. They don't count as instances.
        loop {
            self.raw.clear();
            if self.reader.read_until(b'\n', &mut self.raw)? == 0 {
                return Err(Error::new(|| ErrorKind::MissingInstances {
                    element: pos.element.name().to_string(),
                    expected: count,
                    found: pos.instance_index,
                }));
            }

            self.line.clear();
            self.line.push_str(&String::from_utf8_lossy(&self.raw));

            let base = self.line.as_ptr() as usize;
            self.tokens.clear();
            self.tokens.extend(self.line.split_whitespace().map(|t| {
                let start = t.as_ptr() as usize - base;
                (start, start + t.len())
            }));
            self.cursor = 0;

            if !self.tokens.is_empty() {
                return Ok(());
            }
        }
    }

    fn read_char(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<i8, Error> {
        self.integer(pos, ty, 8).map(|v| v as i8)
    }

    fn read_short(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<i16, Error> {
        self.integer(pos, ty, 16).map(|v| v as i16)
    }

    fn read_int(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<i32, Error> {
        self.integer(pos, ty, 32).map(|v| v as i32)
    }

    fn read_float(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<f32, Error> {
        let token = self.next_token(pos)?;
        token.parse::<f32>().map_err(|e| invalid_number(token, ty, &e.to_string()))
    }

    fn read_double(&mut self, pos: PropertyPos<'_>, ty: ScalarType) -> Result<f64, Error> {
        let token = self.next_token(pos)?;
        token.parse::<f64>().map_err(|e| invalid_number(token, ty, &e.to_string()))
    }

    fn read_len(&mut self, pos: PropertyPos<'_>, len_type: ScalarType) -> Result<usize, Error> {
        let token = self.next_token(pos)?;
        let max = len_type.max_list_len().unwrap_or(0);

        match token.parse::<u64>() {
            Ok(v) if v <= max => Ok(v as usize),
            Ok(_) => Err(invalid_number(token, len_type, "list length out of range")),
            Err(e) => Err(invalid_number(token, len_type, &format!("invalid list length ({})", e))),
        }
    }

    fn end_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        let extra = self.tokens.len() - self.cursor;
        if extra > 0 && !self.warned_extra_tokens {
            warn!(
                "ignoring {} additional value(s) in instance {} of element '{}' \
                    (further occurrences are not reported)",
                extra,
                pos.instance_index,
                pos.element.name(),
            );
            self.warned_extra_tokens = true;
        }

        Ok(())
    }
}
