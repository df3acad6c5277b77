//! Type reader table: the ordered `(name, version)` list naming every
//! object decoder a container uses.  Slots refer to it by 1-based index.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::fmt;
use std::io::{self, Read, Write};
use tracing::{debug, warn};

use crate::error::{Result, XnbError};
use crate::varint::{read_7bit_encoded, write_7bit_encoded};

/// Longest reader name the format carries.  Longer declared lengths are
/// clamped on read.
pub const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeReaderDescriptor {
    pub name:    String,
    pub version: i32,
}

impl TypeReaderDescriptor {
    pub fn new(name: impl Into<String>, version: i32) -> Self {
        Self { name: name.into(), version }
    }

    fn read<R: Read>(mut reader: R, position: usize) -> Result<Self> {
        let declared = read_7bit_encoded(&mut reader)? as usize;
        let len = if declared > MAX_NAME_LEN {
            warn!(position, declared, "type reader name too long, clamping");
            MAX_NAME_LEN
        } else {
            declared
        };

        let mut name = vec![0u8; len];
        reader.read_exact(&mut name)?;
        let name = String::from_utf8(name)
            .map_err(|_| XnbError::InvalidReaderName { position })?;
        let version = reader.read_i32::<LittleEndian>()?;
        Ok(Self { name, version })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write_7bit_encoded(&mut writer, self.name.len() as u32)?;
        writer.write_all(self.name.as_bytes())?;
        writer.write_i32::<LittleEndian>(self.version)
    }
}

impl fmt::Display for TypeReaderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Type Reader]")?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "-------------")
    }
}

/// Read `count` descriptors.  Any short read fails the whole table.
pub fn read_type_readers<R: Read>(mut reader: R, count: usize) -> Result<Vec<TypeReaderDescriptor>> {
    let mut readers = Vec::new();
    for position in 0..count {
        let desc = TypeReaderDescriptor::read(&mut reader, position)?;
        debug!(position, name = %desc.name, version = desc.version, "read type reader");
        readers.push(desc);
    }
    Ok(readers)
}

/// Write the count followed by every descriptor.
pub fn write_type_readers<W: Write>(mut writer: W, readers: &[TypeReaderDescriptor]) -> io::Result<()> {
    write_7bit_encoded(&mut writer, readers.len() as u32)?;
    for desc in readers {
        desc.write(&mut writer)?;
    }
    Ok(())
}

/// Resolve a slot's type index.  `0` is an empty slot; `n` names the
/// descriptor at position `n - 1`.
pub fn resolve_index(readers: &[TypeReaderDescriptor], index: u32) -> Result<Option<&TypeReaderDescriptor>> {
    if index == 0 {
        return Ok(None);
    }
    readers
        .get(index as usize - 1)
        .map(Some)
        .ok_or(XnbError::TypeIndexOutOfRange { index, count: readers.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_table_in_order() {
        let table = vec![
            TypeReaderDescriptor::new("A.Reader", 0),
            TypeReaderDescriptor::new("B.Reader", -3),
        ];
        let mut buf = Vec::new();
        for d in &table {
            d.write(&mut buf).unwrap();
        }
        buf.push(0xee);

        let mut cur = Cursor::new(buf);
        let got = read_type_readers(&mut cur, 2).unwrap();
        assert_eq!(got, table);
        assert_eq!(cur.read_u8().unwrap(), 0xee);
    }

    #[test]
    fn short_name_fails_table() {
        let mut buf = Vec::new();
        TypeReaderDescriptor::new("Good", 1).write(&mut buf).unwrap();
        buf.extend_from_slice(&[10, b'a', b'b']);
        let err = read_type_readers(Cursor::new(buf), 2).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn missing_version_fails_table() {
        let buf = vec![1, b'X', 0, 0];
        let err = read_type_readers(Cursor::new(buf), 1).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn long_name_is_clamped() {
        // declares 300 bytes; only 255 are taken as the name
        let mut buf = Vec::new();
        write_7bit_encoded(&mut buf, 300).unwrap();
        buf.extend(std::iter::repeat(b'n').take(MAX_NAME_LEN));
        buf.extend_from_slice(&7i32.to_le_bytes());
        let got = read_type_readers(Cursor::new(buf), 1).unwrap();
        assert_eq!(got[0].name.len(), MAX_NAME_LEN);
        assert_eq!(got[0].version, 7);
    }

    #[test]
    fn non_utf8_name_is_malformed() {
        let buf = vec![2, 0xff, 0xfe, 0, 0, 0, 0];
        let err = read_type_readers(Cursor::new(buf), 1).unwrap_err();
        assert!(matches!(err, XnbError::InvalidReaderName { position: 0 }));
    }

    #[test]
    fn index_convention() {
        let table = vec![TypeReaderDescriptor::new("Only", 0)];
        assert!(resolve_index(&table, 0).unwrap().is_none());
        assert_eq!(resolve_index(&table, 1).unwrap().unwrap().name, "Only");
        let err = resolve_index(&table, 2).unwrap_err();
        assert!(matches!(err, XnbError::TypeIndexOutOfRange { index: 2, count: 1 }));
    }
}
