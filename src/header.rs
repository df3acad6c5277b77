use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::fmt;
use std::io::{self, Read, Write};
use tracing::{debug, warn};

use crate::error::{Result, XnbError};

pub const MAGIC: &[u8; 3] = b"XNB";
/// Format version written by XNA Game Studio 4.0.
pub const VERSION_XNA_4: u8 = 5;

pub const FLAG_HIDEF:      u8 = 0x01;
pub const FLAG_COMPRESSED: u8 = 0x80;

/// magic + platform + version + flags + file_size
pub const HEADER_SIZE: usize = 10;
/// Header size when the decompressed-size field is present.
pub const COMPRESSED_HEADER_SIZE: usize = HEADER_SIZE + 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XnbHeader {
    #[serde(skip)]
    pub magic:             [u8; 3],
    pub platform:          u8,
    pub version:           u8,
    pub flags:             u8,
    pub file_size:         u32,
    /// Equal to `file_size` unless the container is compressed.
    pub decompressed_size: u32,
}

impl XnbHeader {
    pub fn new(platform: u8, flags: u8, file_size: u32) -> Self {
        Self {
            magic:             *MAGIC,
            platform,
            version:           VERSION_XNA_4,
            flags,
            file_size,
            decompressed_size: file_size,
        }
    }

    #[inline]
    pub fn is_compressed(&self) -> bool { self.flags & FLAG_COMPRESSED != 0 }

    #[inline]
    pub fn is_hidef(&self) -> bool { self.flags & FLAG_HIDEF != 0 }

    /// Human-readable target platform, if the byte is one XNA defines.
    pub fn platform_name(&self) -> Option<&'static str> {
        match self.platform {
            b'w' => Some("Windows"),
            b'm' => Some("Windows Phone 7"),
            b'x' => Some("Xbox 360"),
            _    => None,
        }
    }

    /// Bytes this header occupies on disk.
    pub fn encoded_len(&self) -> usize {
        if self.is_compressed() { COMPRESSED_HEADER_SIZE } else { HEADER_SIZE }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u8(self.platform)?;
        writer.write_u8(self.version)?;
        writer.write_u8(self.flags)?;
        writer.write_u32::<LittleEndian>(self.file_size)?;
        if self.is_compressed() {
            writer.write_u32::<LittleEndian>(self.decompressed_size)?;
        }
        Ok(())
    }

    /// Read the fixed block, then the decompressed size if the compressed
    /// flag is set.  Nothing past the header is consumed; rejecting a
    /// compressed body is left to the caller.
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut fixed = [0u8; HEADER_SIZE];
        reader.read_exact(&mut fixed)?;

        let magic = [fixed[0], fixed[1], fixed[2]];
        if &magic != MAGIC {
            return Err(XnbError::InvalidMagic { found: magic });
        }
        let platform  = fixed[3];
        let version   = fixed[4];
        let flags     = fixed[5];
        let file_size = u32::from_le_bytes([fixed[6], fixed[7], fixed[8], fixed[9]]);

        let decompressed_size = if flags & FLAG_COMPRESSED != 0 {
            reader.read_u32::<LittleEndian>()?
        } else {
            file_size
        };

        let header = Self { magic, platform, version, flags, file_size, decompressed_size };
        if version != VERSION_XNA_4 {
            warn!(version, "unexpected container version");
        }
        if header.platform_name().is_none() {
            warn!(platform = %char::from(platform), "unknown target platform");
        }
        debug!(?header, "read container header");
        Ok(header)
    }
}

impl fmt::Display for XnbHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[XNB Container Header]")?;
        writeln!(f, "Magic: {}", String::from_utf8_lossy(&self.magic))?;
        match self.platform_name() {
            Some(name) => writeln!(f, "Platform: {} ({name})", char::from(self.platform))?,
            None       => writeln!(f, "Platform: {}", char::from(self.platform))?,
        }
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Flags: 0x{:02x}{}", self.flags, if self.is_hidef() { " (HiDef)" } else { "" })?;
        writeln!(f, "File Size: {0} (0x{0:08x})", self.file_size)?;
        if self.is_compressed() {
            writeln!(f, "Decompressed Size: {0} (0x{0:08x})", self.decompressed_size)?;
        }
        writeln!(f, "----------------------")
    }
}
