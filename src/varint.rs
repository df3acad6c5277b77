//! 7-bit encoded unsigned integers.
//!
//! Every count and length in a container is stored this way: each byte
//! carries 7 payload bits, least-significant group first, and the high bit
//! says whether another byte follows.
//!
//! The accumulator is 32 bits wide, so at most [`MAX_VARINT_LEN`] bytes are
//! meaningful.  A fifth byte that still has the continuation bit set, or that
//! carries bits above bit 31, is rejected with [`XnbError::VarIntOverflow`]
//! rather than silently wrapped.

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::error::{Result, XnbError};

/// Longest encoding of a `u32`.
pub const MAX_VARINT_LEN: usize = 5;

const PAYLOAD_MASK:  u8 = 0x7f;
const CONTINUATION:  u8 = 0x80;
/// Bits a fifth byte may use: 32 - 4 * 7 = 4.
const LAST_BYTE_MASK: u8 = 0x0f;

pub fn read_7bit_encoded<R: Read>(mut reader: R) -> Result<u32> {
    let mut result = 0u32;
    for i in 0..MAX_VARINT_LEN {
        let byte = reader.read_u8()?;
        if i == MAX_VARINT_LEN - 1 && byte & !LAST_BYTE_MASK != 0 {
            return Err(XnbError::VarIntOverflow);
        }
        result |= u32::from(byte & PAYLOAD_MASK) << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok(result);
        }
    }
    Err(XnbError::VarIntOverflow)
}

pub fn write_7bit_encoded<W: Write>(mut writer: W, mut value: u32) -> io::Result<()> {
    while value >= u32::from(CONTINUATION) {
        writer.write_u8((value as u8 & PAYLOAD_MASK) | CONTINUATION)?;
        value >>= 7;
    }
    writer.write_u8(value as u8)
}

/// Number of bytes [`write_7bit_encoded`] produces for `value`.
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7f              => 1,
        0x80..=0x3fff         => 2,
        0x4000..=0x1f_ffff    => 3,
        0x20_0000..=0xfff_ffff => 4,
        _                     => 5,
    }
}
