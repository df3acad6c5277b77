//! `SoundEffect` objects: a WAVEFORMATEX blob, raw sample bytes, loop
//! points and a duration.
//!
//! Payload layout (little-endian):
//!
//! | Field        | Type                 |
//! |--------------|----------------------|
//! | format_len   | u32                  |
//! | format       | `[u8; format_len]`   |
//! | data_len     | u32                  |
//! | data         | `[u8; data_len]`     |
//! | loop_start   | i32 (bytes)          |
//! | loop_length  | i32 (bytes)          |
//! | duration     | i32 (milliseconds)   |

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::io::{self, Read, Write};

use super::{read_blob, ObjectKind, XnbAsset};
use crate::error::{Result, XnbError};
use crate::wav::{write_wave, WaveFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundEffect {
    /// Full format blob as stored, extension bytes included.
    format:      Vec<u8>,
    wave_format: WaveFormat,
    data:        Vec<u8>,
    pub loop_start:  i32,
    pub loop_length: i32,
    pub duration:    i32,
}

impl SoundEffect {
    /// Build from a raw format blob.  The blob must hold at least the fixed
    /// WAVEFORMATEX fields.
    pub fn new(format: Vec<u8>, data: Vec<u8>, loop_start: i32, loop_length: i32, duration: i32) -> Result<Self> {
        let wave_format = WaveFormat::parse(&format)
            .ok_or(XnbError::FormatTooShort { len: format.len() })?;
        Ok(Self { format, wave_format, data, loop_start, loop_length, duration })
    }

    /// Build from a parsed format with no extension bytes.
    pub fn from_wave_format(wave_format: WaveFormat, data: Vec<u8>) -> Self {
        Self {
            format: wave_format.to_bytes().to_vec(),
            wave_format,
            data,
            loop_start:  0,
            loop_length: 0,
            duration:    0,
        }
    }

    pub fn format_blob(&self) -> &[u8] { &self.format }

    pub fn wave_format(&self) -> &WaveFormat { &self.wave_format }

    /// Bytes following the fixed WAVEFORMATEX fields.
    pub fn format_extension(&self) -> &[u8] { &self.format[WaveFormat::SIZE..] }

    pub fn data(&self) -> &[u8] { &self.data }
}

impl XnbAsset for SoundEffect {
    const READER_NAME: &'static str = "Microsoft.Xna.Framework.Content.SoundEffectReader";
    const KIND: ObjectKind = ObjectKind::SoundEffect;

    fn read<R: Read>(mut reader: R) -> Result<Self> {
        let format_len = reader.read_u32::<LittleEndian>()?;
        let format     = read_blob(&mut reader, format_len)?;
        let data_len   = reader.read_u32::<LittleEndian>()?;
        let data       = read_blob(&mut reader, data_len)?;
        let loop_start  = reader.read_i32::<LittleEndian>()?;
        let loop_length = reader.read_i32::<LittleEndian>()?;
        let duration    = reader.read_i32::<LittleEndian>()?;
        Self::new(format, data, loop_start, loop_length, duration)
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.format.len() as u32)?;
        writer.write_all(&self.format)?;
        writer.write_u32::<LittleEndian>(self.data.len() as u32)?;
        writer.write_all(&self.data)?;
        writer.write_i32::<LittleEndian>(self.loop_start)?;
        writer.write_i32::<LittleEndian>(self.loop_length)?;
        writer.write_i32::<LittleEndian>(self.duration)
    }

    fn export<W: Write>(&self, writer: W) -> Result<()> {
        write_wave(writer, &self.wave_format, &self.data)
    }
}

impl fmt::Display for SoundEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[SoundEffect]")?;
        writeln!(f, "Format Size: {}", self.format.len())?;
        write!(f, "{}", self.wave_format)?;
        if !self.format_extension().is_empty() {
            writeln!(f, "Format Extension: {}", hex::encode(self.format_extension()))?;
        }
        writeln!(f, "Data Size: {}", self.data.len())?;
        writeln!(f, "Loop Start: {}", self.loop_start)?;
        writeln!(f, "Loop Length: {}", self.loop_length)?;
        writeln!(f, "Duration: {}", self.duration)?;
        writeln!(f, "-------------")
    }
}

// Sample bytes are summarised by length.
impl Serialize for SoundEffect {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SoundEffect", 7)?;
        s.serialize_field("format_size", &self.format.len())?;
        s.serialize_field("wave_format", &self.wave_format)?;
        s.serialize_field("format_extension", &hex::encode(self.format_extension()))?;
        s.serialize_field("data_size", &self.data.len())?;
        s.serialize_field("loop_start", &self.loop_start)?;
        s.serialize_field("loop_length", &self.loop_length)?;
        s.serialize_field("duration", &self.duration)?;
        s.end()
    }
}
