//! The error type of this crate.
//!
//! All fallible operations return [`Error`]. The concrete reason is stored as
//! an [`ErrorKind`]; if you only want to decide how to react to an error (is
//! the file broken? did the data not match the schema?), use
//! [`Error::category`].

use std::{
    fmt,
    io,
};

use failure::{Backtrace, Fail};

use crate::types::ScalarType;


/// The error type used throughout this crate.
///
/// The kind is boxed to keep `Result<T, Error>` small; errors are the cold
/// path.
pub struct Error {
    kind: Box<ErrorKind>,
    backtrace: Backtrace,
}

impl Error {
    /// Creates a new error. The closure is only called here, which keeps
    /// the (usually string formatting heavy) construction out of the hot
    /// path at the call site.
    #[cold]
    pub fn new(kind: impl FnOnce() -> ErrorKind) -> Self {
        Self {
            kind: Box::new(kind()),
            backtrace: Backtrace::new(),
        }
    }

    /// Creates an error that can be returned by `Target` or `Source`
    /// implementations to abort the current pass.
    pub fn aborted(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::new(|| ErrorKind::Aborted(msg))
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Unwraps this error into its kind.
    pub fn into_kind(self) -> ErrorKind {
        *self.kind
    }

    /// Returns the coarse category of this error.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.kind, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.kind.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        Some(&self.backtrace)
    }
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Self::new(|| ErrorKind::Io(src))
    }
}

impl From<ErrorKind> for Error {
    fn from(src: ErrorKind) -> Self {
        Self::new(|| src)
    }
}

/// Coarse classification of all error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The header or a manually built schema is invalid, or a binding refers
    /// to names the schema does not have.
    MalformedSchema,

    /// The input ended before everything the header declared was read.
    TruncatedInput,

    /// A value does not match the type that the schema declares for it.
    TypeMismatch,

    /// A type was used in a position where it is not allowed.
    UnsupportedType,

    /// The underlying reader or writer failed, or a callback aborted the
    /// pass.
    Io,
}

/// All the different things that can go wrong.
#[derive(Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "malformed PLY header line \"{}\": {}", line, msg)]
    MalformedHeader {
        line: String,
        msg: String,
    },

    #[fail(display = "invalid PLY schema: {}", _0)]
    InvalidSchema(String),

    #[fail(display = "type '{}' cannot be used here: {}", ty, msg)]
    UnsupportedType {
        ty: ScalarType,
        msg: String,
    },

    #[fail(
        display = "expected {} instances of element '{}', found {}",
        expected,
        element,
        found,
    )]
    MissingInstances {
        element: String,
        expected: u64,
        found: u64,
    },

    #[fail(
        display = "unexpected end of input in instance {} of element '{}' \
            (expected {} more bytes, found {})",
        instance,
        element,
        expected,
        found,
    )]
    UnexpectedEof {
        element: String,
        instance: u64,
        expected: usize,
        found: usize,
    },

    #[fail(
        display = "line of instance {} of element '{}' ends before property '{}' was complete",
        instance,
        element,
        property,
    )]
    TooFewValues {
        element: String,
        instance: u64,
        property: String,
    },

    #[fail(display = "invalid '{}' literal \"{}\": {}", ty, token, msg)]
    InvalidNumber {
        token: String,
        ty: ScalarType,
        msg: String,
    },

    #[fail(
        display = "list of length {} in property '{}' does not fit into its length type '{}'",
        len,
        property,
        len_type,
    )]
    ListTooLong {
        property: String,
        len: usize,
        len_type: ScalarType,
    },

    #[fail(
        display = "no value for property '{}' in instance {} of element '{}'",
        property,
        instance,
        element,
    )]
    DataIncomplete {
        element: String,
        instance: u64,
        property: String,
    },

    #[fail(display = "binding for property '{}' of element '{}' does not fit: {}", property, element, msg)]
    BindingMismatch {
        element: String,
        property: String,
        msg: String,
    },

    #[fail(display = "element '{}' does not exist in the schema", _0)]
    UnknownElement(String),

    #[fail(display = "element '{}' has no property '{}'", element, property)]
    UnknownProperty {
        element: String,
        property: String,
    },

    #[fail(display = "element '{}' was registered twice", _0)]
    DuplicateBinding(String),

    #[fail(display = "aborted: {}", _0)]
    Aborted(String),
}

impl ErrorKind {
    /// Returns the coarse category of this error kind.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::Io(_) | ErrorKind::Aborted(_) => ErrorCategory::Io,

            ErrorKind::MalformedHeader { .. }
            | ErrorKind::InvalidSchema(_)
            | ErrorKind::UnknownElement(_)
            | ErrorKind::UnknownProperty { .. }
            | ErrorKind::DuplicateBinding(_) => ErrorCategory::MalformedSchema,

            ErrorKind::UnsupportedType { .. } => ErrorCategory::UnsupportedType,

            ErrorKind::MissingInstances { .. }
            | ErrorKind::UnexpectedEof { .. }
            | ErrorKind::TooFewValues { .. } => ErrorCategory::TruncatedInput,

            ErrorKind::InvalidNumber { .. }
            | ErrorKind::ListTooLong { .. }
            | ErrorKind::DataIncomplete { .. }
            | ErrorKind::BindingMismatch { .. } => ErrorCategory::TypeMismatch,
        }
    }
}
