//! Error taxonomy shared by every stage of container decoding and export.

use std::io;
use thiserror::Error;

/// Coarse grouping of [`XnbError`] variants, for callers that only need to
/// decide whether to keep going with the next input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Stream exhausted or write failed.
    Io,
    /// Bad magic, out-of-range index, inconsistent length.
    MalformedStream,
    /// Recognised but unimplemented container feature (compression).
    UnsupportedFeature,
    /// Declared reader name has no registered object kind.
    UnsupportedType,
    /// Decoded object cannot be represented in the export format.
    Export,
}

#[derive(Error, Debug)]
pub enum XnbError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid magic: expected \"XNB\", found {found:?}")]
    InvalidMagic { found: [u8; 3] },

    #[error("7-bit encoded integer does not fit in 32 bits")]
    VarIntOverflow,

    #[error("Type index {index} out of range ({count} type readers declared)")]
    TypeIndexOutOfRange { index: u32, count: usize },

    #[error("Type reader {position} has a name that is not valid UTF-8")]
    InvalidReaderName { position: usize },

    #[error("Wave format blob is {len} bytes, need at least {}", crate::wav::WaveFormat::SIZE)]
    FormatTooShort { len: usize },

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("No reader registered for type '{name}'")]
    UnsupportedType { name: String },

    /// The exporter only writes uncompressed PCM; any other source codec
    /// would produce a file that misdescribes its own payload.
    #[error("Cannot export wave format tag 0x{tag:04x} as PCM")]
    UnsupportedWaveFormat { tag: u16 },

    #[error("Sample data of {len} bytes does not fit a RIFF file")]
    DataTooLarge { len: usize },
}

impl XnbError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            XnbError::Io(_) => ErrorCategory::Io,
            XnbError::InvalidMagic { .. }
            | XnbError::VarIntOverflow
            | XnbError::TypeIndexOutOfRange { .. }
            | XnbError::InvalidReaderName { .. }
            | XnbError::FormatTooShort { .. } => ErrorCategory::MalformedStream,
            XnbError::UnsupportedFeature(_) => ErrorCategory::UnsupportedFeature,
            XnbError::UnsupportedType { .. } => ErrorCategory::UnsupportedType,
            XnbError::UnsupportedWaveFormat { .. }
            | XnbError::DataTooLarge { .. } => ErrorCategory::Export,
        }
    }

    #[inline]
    pub fn is_malformed(&self) -> bool {
        self.category() == ErrorCategory::MalformedStream
    }

    /// True when the underlying stream ran out before a field was complete.
    pub fn is_truncated(&self) -> bool {
        matches!(self, XnbError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

pub type Result<T> = std::result::Result<T, XnbError>;
