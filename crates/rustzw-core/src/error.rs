use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EncodeError {
    BufferTooSmall,
    PayloadTooLarge { len: usize },
    ValueOutOfRange,
    Message(&'static str),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => f.write_str("buffer too small"),
            Self::PayloadTooLarge { len } => write!(f, "payload of {len} bytes too large"),
            Self::ValueOutOfRange => f.write_str("value out of range"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DecodeError {
    /// A fixed-size field ran past the end of the input.
    UnexpectedEof,
    /// The frame header announced more bytes than are buffered yet.
    Incomplete,
    InvalidLength,
    ChecksumMismatch { expected: u8, actual: u8 },
    InvalidStartMarker(u8),
    InvalidValue,
    UnknownCommandClass(u8),
    Message(&'static str),
}

impl DecodeError {
    /// Returns `true` for errors that mean the bytes on the wire are corrupt,
    /// as opposed to merely short or semantically unknown.
    pub const fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::InvalidLength
                | Self::ChecksumMismatch { .. }
                | Self::InvalidStartMarker(_)
                | Self::InvalidValue
        )
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("unexpected end of input"),
            Self::Incomplete => f.write_str("incomplete frame"),
            Self::InvalidLength => f.write_str("invalid length"),
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch (expected 0x{expected:02x}, got 0x{actual:02x})"
            ),
            Self::InvalidStartMarker(b) => write!(f, "invalid start marker 0x{b:02x}"),
            Self::InvalidValue => f.write_str("invalid value"),
            Self::UnknownCommandClass(id) => write!(f, "unknown command class 0x{id:02x}"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
