//! The PLY type system: scalar types, storage kinds and file encodings.

use std::{
    fmt,
    str::FromStr,
};

use derive_more::Display;
use failure::Fail;


// ===========================================================================
// ===== Scalar types
// ===========================================================================

/// One of the eight primitive types a PLY property can have.
///
/// Every type has two spellings in PLY headers: the traditional one (`uchar`)
/// and one containing the bit width (`uint8`). Both parse to the same value.
/// The `Display` impl and [`ScalarType::ply_type_name`] always produce the
/// traditional spelling.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    #[display(fmt = "char")]
    Char,
    #[display(fmt = "uchar")]
    UChar,
    #[display(fmt = "short")]
    Short,
    #[display(fmt = "ushort")]
    UShort,
    #[display(fmt = "int")]
    Int,
    #[display(fmt = "uint")]
    UInt,
    #[display(fmt = "float")]
    Float,
    #[display(fmt = "double")]
    Double,
}

impl ScalarType {
    /// All scalar types, in the order they are usually listed.
    pub const ALL: [ScalarType; 8] = [
        ScalarType::Char,
        ScalarType::UChar,
        ScalarType::Short,
        ScalarType::UShort,
        ScalarType::Int,
        ScalarType::UInt,
        ScalarType::Float,
        ScalarType::Double,
    ];

    /// Returns the traditional name of this type as used in PLY headers
    /// (e.g. `"uchar"`). This is what the writer emits.
    pub fn ply_type_name(&self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::UChar => "uchar",
            ScalarType::Short => "short",
            ScalarType::UShort => "ushort",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    /// Returns the alternative name containing the bit width (e.g.
    /// `"uint8"`).
    pub fn sized_type_name(&self) -> &'static str {
        match self {
            ScalarType::Char => "int8",
            ScalarType::UChar => "uint8",
            ScalarType::Short => "int16",
            ScalarType::UShort => "uint16",
            ScalarType::Int => "int32",
            ScalarType::UInt => "uint32",
            ScalarType::Float => "float32",
            ScalarType::Double => "float64",
        }
    }

    /// `float` and `double`.
    pub fn is_floating_point(&self) -> bool {
        *self == ScalarType::Float || *self == ScalarType::Double
    }

    /// `uchar`, `ushort` and `uint`.
    pub fn is_unsigned_integer(&self) -> bool {
        match self {
            ScalarType::UChar | ScalarType::UShort | ScalarType::UInt => true,
            _ => false,
        }
    }

    /// Returns `true` if this type may be used as the length type of a list
    /// property. That's the case for all integer types.
    pub fn is_valid_len_type(&self) -> bool {
        !self.is_floating_point()
    }

    /// Returns the number of bytes this type occupies in binary encodings.
    pub fn size(&self) -> usize {
        match self {
            ScalarType::Char => 1,
            ScalarType::UChar => 1,
            ScalarType::Short => 2,
            ScalarType::UShort => 2,
            ScalarType::Int => 4,
            ScalarType::UInt => 4,
            ScalarType::Float => 4,
            ScalarType::Double => 8,
        }
    }

    /// Returns the kind in which values of this type are carried.
    ///
    /// Unsigned types share the kind of the signed type with the same width:
    /// a `uchar` with the value 200 is carried as the `i8` -56.
    pub fn kind(&self) -> ValueKind {
        match self {
            ScalarType::Char | ScalarType::UChar => ValueKind::Char,
            ScalarType::Short | ScalarType::UShort => ValueKind::Short,
            ScalarType::Int | ScalarType::UInt => ValueKind::Int,
            ScalarType::Float => ValueKind::Float,
            ScalarType::Double => ValueKind::Double,
        }
    }

    /// The largest list length that can be stored in a length field of this
    /// type. Length fields are always interpreted as unsigned integers of
    /// the type's width. Returns `None` for floating point types.
    pub fn max_list_len(&self) -> Option<u64> {
        match self.kind() {
            ValueKind::Char => Some(u8::max_value().into()),
            ValueKind::Short => Some(u16::max_value().into()),
            ValueKind::Int => Some(u32::max_value().into()),
            ValueKind::Float | ValueKind::Double => None,
        }
    }
}

/// Returned by `ScalarType::from_str` for names that are not a PLY type.
#[derive(Clone, PartialEq, Eq, Fail)]
pub struct ScalarTypeParseError(String);

impl fmt::Display for ScalarTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\" is not a valid PLY scalar type", self.0)
    }
}

impl fmt::Debug for ScalarTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for ScalarType {
    type Err = ScalarTypeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "char" | "int8" => Ok(ScalarType::Char),
            "uchar" | "uint8" => Ok(ScalarType::UChar),
            "short" | "int16" => Ok(ScalarType::Short),
            "ushort" | "uint16" => Ok(ScalarType::UShort),
            "int" | "int32" => Ok(ScalarType::Int),
            "uint" | "uint32" => Ok(ScalarType::UInt),
            "float" | "float32" => Ok(ScalarType::Float),
            "double" | "float64" => Ok(ScalarType::Double),
            other => Err(ScalarTypeParseError(other.to_string())),
        }
    }
}


// ===========================================================================
// ===== Value kinds
// ===========================================================================

/// The Rust type a decoded value is carried in.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `i8`, used for `char` and `uchar`.
    #[display(fmt = "i8")]
    Char,
    /// `i16`, used for `short` and `ushort`.
    #[display(fmt = "i16")]
    Short,
    /// `i32`, used for `int` and `uint`.
    #[display(fmt = "i32")]
    Int,
    /// `f32`
    #[display(fmt = "f32")]
    Float,
    /// `f64`
    #[display(fmt = "f64")]
    Double,
}


// ===========================================================================
// ===== Encoding
// ===========================================================================

/// The encoding of the body of a PLY file.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    #[display(fmt = "ascii")]
    Ascii,
    #[display(fmt = "binary_big_endian")]
    BinaryBigEndian,
    #[display(fmt = "binary_little_endian")]
    BinaryLittleEndian,
}

impl Encoding {
    /// Returns the binary encoding with native endianess (little endian on
    /// x86).
    pub fn binary_native() -> Self {
        #[cfg(target_endian = "big")]
        {
            Encoding::BinaryBigEndian
        }

        #[cfg(target_endian = "little")]
        {
            Encoding::BinaryLittleEndian
        }
    }

    /// Returns `true` for both binary encodings.
    pub fn is_binary(&self) -> bool {
        *self != Encoding::Ascii
    }

    /// Parses the encoding name used in the `format` header line.
    pub fn from_header_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(Encoding::Ascii),
            "binary_little_endian" => Some(Encoding::BinaryLittleEndian),
            "binary_big_endian" => Some(Encoding::BinaryBigEndian),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_spellings_parse_to_same_type() {
        for &ty in &ScalarType::ALL {
            assert_eq!(ty.ply_type_name().parse::<ScalarType>(), Ok(ty));
            assert_eq!(ty.sized_type_name().parse::<ScalarType>(), Ok(ty));
        }
        assert_eq!("uint8".parse::<ScalarType>(), "uchar".parse::<ScalarType>());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = "uint64".parse::<ScalarType>().unwrap_err();
        assert_eq!(err.to_string(), "\"uint64\" is not a valid PLY scalar type");
        assert!("".parse::<ScalarType>().is_err());
        assert!("Float".parse::<ScalarType>().is_err());
    }

    #[test]
    fn len_types() {
        let valid = ScalarType::ALL.iter().filter(|t| t.is_valid_len_type()).count();
        assert_eq!(valid, 6);
        assert!(!ScalarType::Float.is_valid_len_type());
        assert!(!ScalarType::Double.is_valid_len_type());
        assert_eq!(ScalarType::Char.max_list_len(), Some(255));
        assert_eq!(ScalarType::UShort.max_list_len(), Some(65535));
        assert_eq!(ScalarType::Double.max_list_len(), None);
    }

    #[test]
    fn display_uses_short_spelling() {
        assert_eq!(ScalarType::UChar.to_string(), "uchar");
        assert_eq!(ScalarType::Double.to_string(), "double");
        assert_eq!(Encoding::BinaryLittleEndian.to_string(), "binary_little_endian");
    }
}
