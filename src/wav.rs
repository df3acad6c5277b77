//! Canonical RIFF/WAVE output for decoded sound samples.
//!
//! The written file is always the 44-byte PCM header followed by the sample
//! bytes verbatim:
//!
//! ```text
//! "RIFF" u32(36 + data_len) "WAVE"
//! "fmt " u32(16) u16(1) u16(channels) u32(rate) u32(byte_rate) u16(block_align) u16(bits)
//! "data" u32(data_len) data...
//! ```

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;
use std::fmt;
use std::io::Write;

use crate::error::{Result, XnbError};

pub const RIFF_ID:       [u8; 4] = *b"RIFF";
pub const WAVE_ID:       [u8; 4] = *b"WAVE";
pub const FMT_CHUNK_ID:  [u8; 4] = *b"fmt ";
pub const DATA_CHUNK_ID: [u8; 4] = *b"data";

/// `wFormatTag` for uncompressed linear PCM.
pub const WAVE_FORMAT_PCM: u16 = 1;

/// Body size of a plain PCM `fmt ` chunk.
pub const PCM_FMT_CHUNK_SIZE: u32 = 16;
/// Everything before the sample bytes.
pub const WAVE_HEADER_SIZE: usize = 44;

/// The fixed 18-byte prefix of a WAVEFORMATEX blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaveFormat {
    pub format_tag:        u16,
    pub channels:          u16,
    pub samples_per_sec:   u32,
    pub avg_bytes_per_sec: u32,
    pub block_align:       u16,
    pub bits_per_sample:   u16,
    /// Size of the extension that follows the fixed fields.
    pub extra_size:        u16,
}

impl WaveFormat {
    pub const SIZE: usize = 18;

    pub fn pcm(channels: u16, samples_per_sec: u32, bits_per_sample: u16) -> Self {
        let block_align = channels * (bits_per_sample / 8);
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            samples_per_sec,
            avg_bytes_per_sec: samples_per_sec * u32::from(block_align),
            block_align,
            bits_per_sample,
            extra_size: 0,
        }
    }

    /// Interpret the head of a format blob.  Returns `None` if the blob is
    /// shorter than [`WaveFormat::SIZE`].
    pub fn parse(blob: &[u8]) -> Option<Self> {
        let b: &[u8; Self::SIZE] = blob.get(..Self::SIZE)?.try_into().ok()?;
        let u16_at = |i: usize| u16::from_le_bytes([b[i], b[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]]);
        Some(Self {
            format_tag:        u16_at(0),
            channels:          u16_at(2),
            samples_per_sec:   u32_at(4),
            avg_bytes_per_sec: u32_at(8),
            block_align:       u16_at(12),
            bits_per_sample:   u16_at(14),
            extra_size:        u16_at(16),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..2].copy_from_slice(&self.format_tag.to_le_bytes());
        out[2..4].copy_from_slice(&self.channels.to_le_bytes());
        out[4..8].copy_from_slice(&self.samples_per_sec.to_le_bytes());
        out[8..12].copy_from_slice(&self.avg_bytes_per_sec.to_le_bytes());
        out[12..14].copy_from_slice(&self.block_align.to_le_bytes());
        out[14..16].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[16..18].copy_from_slice(&self.extra_size.to_le_bytes());
        out
    }

    #[inline]
    pub fn is_pcm(&self) -> bool { self.format_tag == WAVE_FORMAT_PCM }
}

impl fmt::Display for WaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[WAVEFORMATEX]")?;
        writeln!(f, "wFormatTag: 0x{:x}", self.format_tag)?;
        writeln!(f, "nChannels: {}", self.channels)?;
        writeln!(f, "nSamplesPerSec: {}", self.samples_per_sec)?;
        writeln!(f, "nAvgBytesPerSec: {}", self.avg_bytes_per_sec)?;
        writeln!(f, "nBlockAlign: {}", self.block_align)?;
        writeln!(f, "wBitsPerSample: {}", self.bits_per_sample)?;
        writeln!(f, "cbSize: {}", self.extra_size)?;
        writeln!(f, "--------------")
    }
}

/// Write a PCM wave file.  Fails before writing anything if `format` is
/// not PCM or the data does not fit a 32-bit RIFF size.
pub fn write_wave<W: Write>(mut writer: W, format: &WaveFormat, data: &[u8]) -> Result<()> {
    if !format.is_pcm() {
        return Err(XnbError::UnsupportedWaveFormat { tag: format.format_tag });
    }
    let data_len = u32::try_from(data.len())
        .ok()
        .filter(|len| *len <= u32::MAX - 36)
        .ok_or(XnbError::DataTooLarge { len: data.len() })?;

    writer.write_all(&RIFF_ID)?;
    writer.write_u32::<LittleEndian>(36 + data_len)?;
    writer.write_all(&WAVE_ID)?;

    writer.write_all(&FMT_CHUNK_ID)?;
    writer.write_u32::<LittleEndian>(PCM_FMT_CHUNK_SIZE)?;
    writer.write_u16::<LittleEndian>(WAVE_FORMAT_PCM)?;
    writer.write_u16::<LittleEndian>(format.channels)?;
    writer.write_u32::<LittleEndian>(format.samples_per_sec)?;
    writer.write_u32::<LittleEndian>(format.avg_bytes_per_sec)?;
    writer.write_u16::<LittleEndian>(format.block_align)?;
    writer.write_u16::<LittleEndian>(format.bits_per_sample)?;

    writer.write_all(&DATA_CHUNK_ID)?;
    writer.write_u32::<LittleEndian>(data_len)?;
    writer.write_all(data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn parse_reads_fixed_fields() {
        let fmt = WaveFormat::pcm(2, 22050, 16);
        let mut blob = fmt.to_bytes().to_vec();
        blob.extend_from_slice(&[1, 2, 3]);
        assert_eq!(WaveFormat::parse(&blob), Some(fmt));
        assert_eq!(fmt.block_align, 4);
        assert_eq!(fmt.avg_bytes_per_sec, 88200);
    }

    #[test]
    fn parse_rejects_short_blob() {
        assert_eq!(WaveFormat::parse(&[0u8; 17]), None);
    }

    #[test]
    fn header_layout() {
        let fmt = WaveFormat::pcm(1, 8000, 8);
        let mut out = Vec::new();
        write_wave(&mut out, &fmt, &[0x80; 10]).unwrap();
        assert_eq!(out.len(), WAVE_HEADER_SIZE + 10);
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 46);
        assert_eq!(&out[8..16], b"WAVEfmt ");
        assert_eq!(&out[36..40], b"data");
        assert_eq!(u32::from_le_bytes(out[40..44].try_into().unwrap()), 10);
    }

    #[test]
    fn non_pcm_rejected_before_writing() {
        let mut fmt = WaveFormat::pcm(1, 44100, 4);
        fmt.format_tag = 2; // MS ADPCM
        let mut out = Vec::new();
        let err = write_wave(&mut out, &fmt, &[0; 4]).unwrap_err();
        assert!(matches!(err, XnbError::UnsupportedWaveFormat { tag: 2 }));
        assert!(out.is_empty());
    }

    struct FailAfter(usize);
    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.0 == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "full"));
            }
            let n = buf.len().min(self.0);
            self.0 -= n;
            Ok(n)
        }
        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn short_write_is_fatal() {
        let fmt = WaveFormat::pcm(1, 44100, 16);
        let err = write_wave(FailAfter(20), &fmt, &[0; 8]).unwrap_err();
        assert!(matches!(err, XnbError::Io(_)));
        assert_eq!(err.category(), crate::error::ErrorCategory::Io);
    }
}
