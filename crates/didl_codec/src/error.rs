//! Codec error types

use thiserror::Error;

/// Broad failure classes a caller can act on.
///
/// Every class is fatal to the current call; the codec never retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed bytes: bad magic, illegal opcode, field order, truncation
    Format,
    /// A value or wire type does not fit the declared type
    Type,
    /// Wrong number of values or types
    Arity,
    /// Malformed principal text or bytes
    Identity,
}

/// Errors raised while building types, encoding or decoding messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Message does not start with `DIDL`
    #[error("wrong magic number: {found:02x?}")]
    MagicMismatch { found: Vec<u8> },

    /// Tried to read past the end of the buffer
    #[error("unexpected end of buffer: needed {needed} bytes, {available} available")]
    EndOfBuffer { needed: usize, available: usize },

    /// Opcode that is not valid at this position
    #[error("illegal opcode: {0}")]
    IllegalOpcode(i64),

    /// Opcode reserved for future types
    #[error("future type {0} is not supported")]
    FutureTypeNotSupported(i64),

    /// Record or variant field ids are not strictly increasing
    #[error("field id {found} does not follow {previous}")]
    FieldOrderViolation { previous: u32, found: u32 },

    /// Value or wire type incompatible with the expected type
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Service method names are not strictly increasing
    #[error("method {found:?} does not follow {previous:?}")]
    MethodOrderViolation { previous: String, found: String },

    /// Wrong number of types or values
    #[error("arity mismatch: expected {expected}, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// Bytes left over after the last value
    #[error("{0} trailing bytes after the last value")]
    TrailingBytes(usize),

    /// Recursive type used before it was filled
    #[error("recursive type used before it was filled")]
    UninitializedType,

    /// Recursive type filled with a body that resolves back to itself
    #[error("recursive type cannot be its own body")]
    CyclicType,

    /// Recursive type filled twice
    #[error("recursive type is already filled")]
    AlreadyFilled,

    /// Two fields of one record or variant share a label id
    #[error("duplicate field id {id} ({name})")]
    DuplicateField { id: u32, name: String },

    /// Two service methods share a name
    #[error("duplicate method name {0:?}")]
    DuplicateMethod(String),

    /// Fixed-width number with an unsupported bit width
    #[error("invalid bit width {0}")]
    InvalidWidth(u32),

    /// Type reference outside of the type table
    #[error("type index {index} out of range (table has {len} entries)")]
    TypeIndexOutOfRange { index: i64, len: usize },

    /// Constructed type that was never added to the type table
    #[error("type {0} is not in the type table")]
    UnknownType(String),

    /// Type table larger than the configured limit
    #[error("type table has {len} entries (max {max})")]
    TableTooLarge { len: usize, max: usize },

    /// Text that is not valid UTF-8
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// Byte outside of the values allowed at this position
    #[error("invalid {context} byte: {value}")]
    InvalidByte { context: &'static str, value: u8 },

    /// Number does not fit the target width
    #[error("integer overflow while reading {0}")]
    Overflow(&'static str),

    /// Expected record field missing on the wire
    #[error("cannot find field {0}")]
    MissingField(String),

    /// Record value with a field its type does not declare
    #[error("field {0} is not part of the record type")]
    UnexpectedField(String),

    /// Wire variant case unknown to the expected variant
    #[error("variant case {0} not found in expected type")]
    UnknownVariant(u32),

    /// Variant index past the last case of the wire type
    #[error("variant index {index} out of range ({len} cases)")]
    VariantIndexOutOfRange { index: usize, len: usize },

    /// Nesting deeper than the configured limit
    #[error("recursion depth exceeded (max {0})")]
    RecursionDepthExceeded(usize),

    /// Textual principal whose checksum does not match
    #[error("principal {text:?} does not have a valid checksum (expected {expected:?})")]
    ChecksumMismatch { text: String, expected: String },

    /// Character outside of the base32 alphabet
    #[error("invalid base32 character {0:?}")]
    InvalidBase32(char),

    /// Malformed hexadecimal principal
    #[error("invalid hex principal: {0}")]
    InvalidHex(String),
}

impl Error {
    /// Failure class of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MagicMismatch { .. }
            | Error::EndOfBuffer { .. }
            | Error::IllegalOpcode(_)
            | Error::FutureTypeNotSupported(_)
            | Error::FieldOrderViolation { .. }
            | Error::MethodOrderViolation { .. }
            | Error::TrailingBytes(_)
            | Error::DuplicateField { .. }
            | Error::DuplicateMethod(_)
            | Error::InvalidWidth(_)
            | Error::TypeIndexOutOfRange { .. }
            | Error::TableTooLarge { .. }
            | Error::InvalidUtf8(_)
            | Error::InvalidByte { .. }
            | Error::Overflow(_)
            | Error::VariantIndexOutOfRange { .. }
            | Error::RecursionDepthExceeded(_) => ErrorCategory::Format,
            Error::TypeMismatch { .. }
            | Error::UninitializedType
            | Error::AlreadyFilled
            | Error::CyclicType
            | Error::UnknownType(_)
            | Error::MissingField(_)
            | Error::UnexpectedField(_)
            | Error::UnknownVariant(_) => ErrorCategory::Type,
            Error::ArityMismatch { .. } => ErrorCategory::Arity,
            Error::ChecksumMismatch { .. } | Error::InvalidBase32(_) | Error::InvalidHex(_) => {
                ErrorCategory::Identity
            }
        }
    }

    /// True for truncated input
    pub fn is_end_of_buffer(&self) -> bool {
        matches!(self, Error::EndOfBuffer { .. })
    }

    pub(crate) fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::MagicMismatch { found: b"ABCD".to_vec() }.category(),
            ErrorCategory::Format
        );
        assert_eq!(Error::mismatch("nat", "text").category(), ErrorCategory::Type);
        assert_eq!(
            Error::ArityMismatch { expected: 2, found: 1 }.category(),
            ErrorCategory::Arity
        );
        assert_eq!(Error::InvalidBase32('!').category(), ErrorCategory::Identity);
    }

    #[test]
    fn test_display() {
        let err = Error::EndOfBuffer { needed: 4, available: 1 };
        assert_eq!(
            err.to_string(),
            "unexpected end of buffer: needed 4 bytes, 1 available"
        );
        assert!(err.is_end_of_buffer());
    }
}
