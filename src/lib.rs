pub mod error;
pub mod varint;
pub mod header;
pub mod type_reader;
pub mod object;
pub mod wav;
pub mod container;

pub use error::{ErrorCategory, Result, XnbError};
pub use header::XnbHeader;
pub use type_reader::TypeReaderDescriptor;
pub use object::{ObjectKind, SoundEffect, XnbAsset, XnbObject};
pub use container::{Container, ExportOptions};

/// Decode a container from a byte stream.
pub fn decode_container<R: std::io::Read>(reader: R) -> Result<Container> {
    Container::read(reader)
}
