//! Parsing of the PLY header.
//!
//! The header is read line by line. Lines are terminated by `'\n'`, an
//! additional `'\r'` before it is ignored and a last line without terminator
//! still counts. Every line is trimmed and split into whitespace separated
//! tokens. Empty lines are skipped.

use std::io::BufRead;

use log::{debug, warn};
use smallvec::SmallVec;

use crate::{
    error::{Error, ErrorKind},
    schema::{ElementDef, Schema},
    types::{Encoding, ScalarType},
};


/// Everything the header tells us.
#[derive(Debug, Clone)]
pub(crate) struct Header {
    pub(crate) schema: Schema,

    /// Number of instances for each element of `schema`.
    pub(crate) counts: Vec<u64>,
    pub(crate) encoding: Encoding,
}

/// Reads one line and returns it without line terminator. Returns `None` at
/// the end of the input.
fn next_line(reader: &mut impl BufRead, buf: &mut Vec<u8>) -> Result<Option<String>, Error> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    match std::str::from_utf8(buf) {
        Ok(s) => Ok(Some(s.to_string())),
        Err(e) => {
            let line = String::from_utf8_lossy(buf).into_owned();
            Err(Error::new(|| ErrorKind::MalformedHeader {
                line,
                msg: format!("header is not valid UTF-8 ({})", e),
            }))
        }
    }
}

/// Parses the header, including the `end_header` line. Afterwards, `reader`
/// is positioned at the first byte of the body.
pub(crate) fn parse_header(reader: &mut impl BufRead) -> Result<Header, Error> {
    let mut buf = Vec::new();

    let mut seen_magic = false;
    let mut encoding = None;
    let mut schema = Schema::new();
    let mut counts = Vec::new();
    let mut current: Option<ElementDef> = None;
    let mut last_line = String::new();

    loop {
        let raw = match next_line(reader, &mut buf)? {
            Some(line) => line,
            None => {
                warn!("PLY header is not terminated by 'end_header'");
                break;
            }
        };

        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let malformed = |msg: &str| Error::new(|| ErrorKind::MalformedHeader {
            line: raw.clone(),
            msg: msg.to_string(),
        });
        let from_schema_error = |e: Error| malformed(&e.to_string());

        let tokens = line.split_whitespace().collect::<SmallVec<[&str; 8]>>();
        let expect_tokens = |n: usize| {
            if tokens.len() == n {
                Ok(())
            } else {
                Err(malformed(&format!("expected {} tokens, found {}", n, tokens.len())))
            }
        };
        let parse_type = |s: &str| s.parse::<ScalarType>().map_err(|e| malformed(&e.to_string()));

        // The magic number
        if !seen_magic {
            if tokens[..] == ["ply"] {
                seen_magic = true;
                continue;
            }
            return Err(malformed("not a PLY file (does not start with 'ply')"));
        }

        match tokens[0] {
            // e.g. `format binary_little_endian 1.0`
            "format" => {
                expect_tokens(3)?;
                if encoding.is_some() {
                    return Err(malformed("duplicate 'format' line"));
                }

                let enc = Encoding::from_header_name(tokens[1]).ok_or_else(|| {
                    malformed("expected \"ascii\", \"binary_little_endian\" or \"binary_big_endian\"")
                })?;
                if tokens[2] != "1.0" {
                    warn!("PLY file has version {}, only 1.0 is supported. Trying anyway.", tokens[2]);
                }

                encoding = Some(enc);
            }

            "comment" => {
                // Everything after the keyword and one separator is kept as is.
                let rest = &line["comment".len()..];
                let mut chars = rest.chars();
                let text = match chars.next() {
                    Some(c) if c.is_whitespace() => chars.as_str(),
                    _ => rest,
                };

                schema.add_comment(text).map_err(from_schema_error)?;
            }

            // e.g. `element vertex 8`
            "element" => {
                expect_tokens(3)?;
                let name = tokens[1];
                let count = tokens[2].parse::<u64>()
                    .map_err(|e| malformed(&format!("invalid element count ({})", e)))?;

                let duplicate = schema.element(name).is_some()
                    || current.as_ref().map(|e| e.name() == name).unwrap_or(false);
                if duplicate {
                    return Err(malformed(&format!("duplicate element name '{}'", name)));
                }

                if let Some(done) = current.take() {
                    schema.add_element(done).map_err(from_schema_error)?;
                }
                current = Some(ElementDef::new(name).map_err(from_schema_error)?);
                counts.push(count);
            }

            // e.g. `property float x` or `property list uchar int vertex_index`
            "property" => {
                let elem = current.as_mut().ok_or_else(|| {
                    malformed("property definition without preceding element definition")
                })?;

                if tokens.get(1) == Some(&"list") {
                    expect_tokens(5)?;
                    let len_type = parse_type(tokens[2])?;
                    let scalar_type = parse_type(tokens[3])?;
                    elem.add_list_property(tokens[4], len_type, scalar_type)
                        .map_err(from_schema_error)?;
                } else {
                    expect_tokens(3)?;
                    let ty = parse_type(tokens[1])?;
                    elem.add_property(tokens[2], ty).map_err(from_schema_error)?;
                }
            }

            "end_header" => {
                expect_tokens(1)?;
                last_line = raw.clone();
                break;
            }

            _ => {
                return Err(malformed(
                    "expected line starting with \"format\", \"comment\", \"element\", \
                        \"property\" or \"end_header\"",
                ));
            }
        }

        last_line = raw.clone();
    }

    if let Some(done) = current.take() {
        schema.add_element(done)?;
    }

    let encoding = encoding.ok_or_else(|| Error::new(|| ErrorKind::MalformedHeader {
        line: last_line,
        msg: "header has no 'format' line".into(),
    }))?;

    debug!(
        "parsed PLY header: encoding {}, {} element(s), {} comment(s)",
        encoding,
        schema.elements().len(),
        schema.comments().len(),
    );

    Ok(Header { schema, counts, encoding })
}
