//! Scalar codec: unsigned integers of one or two bytes at arbitrary offsets.
//!
//! This module is allocation-free. Decoding never panics; a window that does
//! not fit in the buffer is reported as [`CodecError::OutOfBounds`].

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

/// Storage width of a raw value.
///
/// The byte order only exists for the two-byte case, so a one-byte field can
/// never carry a meaningless order and a two-byte field can never lack one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataWidth {
    /// Unsigned 8-bit value.
    U8,
    /// Unsigned 16-bit value in the given byte order.
    U16(ByteOrder),
}

impl DataWidth {
    /// Number of bytes occupied by one value.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            DataWidth::U8 => 1,
            DataWidth::U16(_) => 2,
        }
    }

    /// Largest raw value representable at this width (`2^(8*bytes) - 1`).
    #[inline]
    pub const fn max_raw(self) -> u32 {
        match self {
            DataWidth::U8 => u8::MAX as u32,
            DataWidth::U16(_) => u16::MAX as u32,
        }
    }

    /// Byte order, if the width has one.
    #[inline]
    pub const fn byte_order(self) -> Option<ByteOrder> {
        match self {
            DataWidth::U8 => None,
            DataWidth::U16(order) => Some(order),
        }
    }
}

/// An encoded scalar: up to two bytes, no heap allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedScalar {
    bytes: [u8; 2],
    len: usize,
}

impl EncodedScalar {
    /// The encoded bytes, exactly `width.bytes()` long.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or(&self.bytes)
    }
}

fn window(
    buffer_len: usize,
    offset: usize,
    width: DataWidth,
) -> Result<core::ops::Range<usize>, CodecError> {
    let out_of_bounds = CodecError::OutOfBounds {
        offset,
        width: width.bytes(),
        len: buffer_len,
    };
    match offset.checked_add(width.bytes()) {
        Some(end) if end <= buffer_len => Ok(offset..end),
        _ => Err(out_of_bounds),
    }
}

/// Decode one raw value starting at `offset`.
///
/// # Errors
///
/// Returns [`CodecError::OutOfBounds`] when `offset + width` exceeds the
/// buffer length (including the case where the sum overflows).
pub fn decode(buffer: &[u8], offset: usize, width: DataWidth) -> Result<u16, CodecError> {
    let range = window(buffer.len(), offset, width)?;
    let out_of_bounds = CodecError::OutOfBounds {
        offset,
        width: width.bytes(),
        len: buffer.len(),
    };
    let bytes = buffer.get(range).ok_or(out_of_bounds)?;

    match (width, bytes) {
        (DataWidth::U8, [b]) => Ok(u16::from(*b)),
        (DataWidth::U16(ByteOrder::Big), [hi, lo]) => Ok(u16::from_be_bytes([*hi, *lo])),
        (DataWidth::U16(ByteOrder::Little), [lo, hi]) => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(out_of_bounds),
    }
}

/// Encode one raw value.
///
/// Callers are expected to clamp first (see [`crate::scaling::to_raw`]).
///
/// # Errors
///
/// Returns [`CodecError::RangeError`] when `raw` exceeds [`DataWidth::max_raw`].
pub fn encode(raw: u32, width: DataWidth) -> Result<EncodedScalar, CodecError> {
    let max = width.max_raw();
    let range_error = CodecError::RangeError { raw, max };
    let Ok(value) = u16::try_from(raw) else {
        return Err(range_error);
    };

    let encoded = match width {
        DataWidth::U8 => {
            let Ok(byte) = u8::try_from(value) else {
                return Err(range_error);
            };
            EncodedScalar {
                bytes: [byte, 0],
                len: 1,
            }
        }
        DataWidth::U16(order) => {
            let bytes = match order {
                ByteOrder::Big => value.to_be_bytes(),
                ByteOrder::Little => value.to_le_bytes(),
            };
            EncodedScalar { bytes, len: 2 }
        }
    };
    Ok(encoded)
}

/// Encode `raw` and write it into `buffer` at `offset`.
///
/// The buffer is left untouched on error.
///
/// # Errors
///
/// Returns [`CodecError::RangeError`] for unrepresentable values and
/// [`CodecError::OutOfBounds`] when the window does not fit.
pub fn encode_into(
    buffer: &mut [u8],
    offset: usize,
    raw: u32,
    width: DataWidth,
) -> Result<(), CodecError> {
    let encoded = encode(raw, width)?;
    let range = window(buffer.len(), offset, width)?;
    let len = buffer.len();
    let target = buffer.get_mut(range).ok_or(CodecError::OutOfBounds {
        offset,
        width: width.bytes(),
        len,
    })?;
    target.copy_from_slice(encoded.as_bytes());
    Ok(())
}
