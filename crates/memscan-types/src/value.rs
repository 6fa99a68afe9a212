//! The numeric scratch value: a tagged union of the widths a byte offset
//! might be read as, paired with the flags declaring which are valid
//! (spec §3 "value").

use std::fmt;

use crate::flags::ScalarWidths;

/// A dynamically-typed numeric reading of target bytes under one width.
///
/// Mirrors the width lattice in [`ScalarWidths`] one-to-one; unlike that
/// bitset, a `ScanValue` carries an actual number, not just a capability
/// flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanValue {
    U8(u8),
    S8(i8),
    U16(u16),
    S16(i16),
    U32(u32),
    S32(i32),
    U64(u64),
    S64(i64),
    F32(f32),
    F64(f64),
}

impl ScanValue {
    /// The bit in [`ScalarWidths`] this value's width corresponds to.
    #[must_use]
    pub const fn width_flag(self) -> ScalarWidths {
        match self {
            ScanValue::U8(_) => ScalarWidths::U8,
            ScanValue::S8(_) => ScalarWidths::S8,
            ScanValue::U16(_) => ScalarWidths::U16,
            ScanValue::S16(_) => ScalarWidths::S16,
            ScanValue::U32(_) => ScalarWidths::U32,
            ScanValue::S32(_) => ScalarWidths::S32,
            ScanValue::U64(_) => ScalarWidths::U64,
            ScanValue::S64(_) => ScalarWidths::S64,
            ScanValue::F32(_) => ScalarWidths::F32,
            ScanValue::F64(_) => ScalarWidths::F64,
        }
    }

    /// Size in bytes of this value's width.
    #[must_use]
    pub const fn width_bytes(self) -> u32 {
        ScalarWidths::width_bytes(self.width_flag())
    }

    /// Reinterpret `bytes` (at least `width`-many bytes, little-endian
    /// host order already assumed) as a [`ScanValue`] of the requested
    /// scalar width. Returns `None` if `bytes` is too short.
    #[must_use]
    pub fn read(bit: ScalarWidths, bytes: &[u8]) -> Option<Self> {
        let n = ScalarWidths::width_bytes(bit) as usize;
        if bytes.len() < n {
            return None;
        }
        Some(match bit {
            ScalarWidths::U8 => ScanValue::U8(bytes[0]),
            ScalarWidths::S8 => ScanValue::S8(bytes[0] as i8),
            ScalarWidths::U16 => ScanValue::U16(u16::from_ne_bytes(bytes[..2].try_into().ok()?)),
            ScalarWidths::S16 => ScanValue::S16(i16::from_ne_bytes(bytes[..2].try_into().ok()?)),
            ScalarWidths::U32 => ScanValue::U32(u32::from_ne_bytes(bytes[..4].try_into().ok()?)),
            ScalarWidths::S32 => ScanValue::S32(i32::from_ne_bytes(bytes[..4].try_into().ok()?)),
            ScalarWidths::U64 => ScanValue::U64(u64::from_ne_bytes(bytes[..8].try_into().ok()?)),
            ScalarWidths::S64 => ScanValue::S64(i64::from_ne_bytes(bytes[..8].try_into().ok()?)),
            ScalarWidths::F32 => ScanValue::F32(f32::from_ne_bytes(bytes[..4].try_into().ok()?)),
            ScalarWidths::F64 => ScanValue::F64(f64::from_ne_bytes(bytes[..8].try_into().ok()?)),
            _ => return None,
        })
    }

    /// Byte-swap this value in place — used when `endianness` declares the
    /// target is reverse-endian relative to the host (spec §4.2).
    #[must_use]
    pub fn byte_swapped(self) -> Self {
        match self {
            ScanValue::U8(v) => ScanValue::U8(v),
            ScanValue::S8(v) => ScanValue::S8(v),
            ScanValue::U16(v) => ScanValue::U16(v.swap_bytes()),
            ScanValue::S16(v) => ScanValue::S16(v.swap_bytes()),
            ScanValue::U32(v) => ScanValue::U32(v.swap_bytes()),
            ScanValue::S32(v) => ScanValue::S32(v.swap_bytes()),
            ScanValue::U64(v) => ScanValue::U64(v.swap_bytes()),
            ScanValue::S64(v) => ScanValue::S64(v.swap_bytes()),
            ScanValue::F32(v) => ScanValue::F32(f32::from_bits(v.to_bits().swap_bytes())),
            ScanValue::F64(v) => ScanValue::F64(f64::from_bits(v.to_bits().swap_bytes())),
        }
    }

    /// Encode back to host-native bytes (caller applies endianness
    /// fix-up separately, matching how `memscan-cli` writes values).
    #[must_use]
    pub fn to_ne_bytes(self) -> Vec<u8> {
        match self {
            ScanValue::U8(v) => vec![v],
            ScanValue::S8(v) => vec![v as u8],
            ScanValue::U16(v) => v.to_ne_bytes().to_vec(),
            ScanValue::S16(v) => v.to_ne_bytes().to_vec(),
            ScanValue::U32(v) => v.to_ne_bytes().to_vec(),
            ScanValue::S32(v) => v.to_ne_bytes().to_vec(),
            ScanValue::U64(v) => v.to_ne_bytes().to_vec(),
            ScanValue::S64(v) => v.to_ne_bytes().to_vec(),
            ScanValue::F32(v) => v.to_ne_bytes().to_vec(),
            ScanValue::F64(v) => v.to_ne_bytes().to_vec(),
        }
    }

    /// Widen to `f64` for range/delta comparisons across widths.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            ScanValue::U8(v) => f64::from(v),
            ScanValue::S8(v) => f64::from(v),
            ScanValue::U16(v) => f64::from(v),
            ScanValue::S16(v) => f64::from(v),
            ScanValue::U32(v) => f64::from(v),
            ScanValue::S32(v) => f64::from(v),
            ScanValue::U64(v) => v as f64,
            ScanValue::S64(v) => v as f64,
            ScanValue::F32(v) => f64::from(v),
            ScanValue::F64(v) => v,
        }
    }
}

impl fmt::Display for ScanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanValue::U8(v) => write!(f, "{v}"),
            ScanValue::S8(v) => write!(f, "{v}"),
            ScanValue::U16(v) => write!(f, "{v}"),
            ScanValue::S16(v) => write!(f, "{v}"),
            ScanValue::U32(v) => write!(f, "{v}"),
            ScanValue::S32(v) => write!(f, "{v}"),
            ScanValue::U64(v) => write!(f, "{v}"),
            ScanValue::S64(v) => write!(f, "{v}"),
            ScanValue::F32(v) => write!(f, "{v}"),
            ScanValue::F64(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_roundtrips_native_bytes() {
        let bytes = 0x1234_5678u32.to_ne_bytes();
        let v = ScanValue::read(ScalarWidths::U32, &bytes).unwrap();
        assert_eq!(v, ScanValue::U32(0x1234_5678));
    }

    #[test]
    fn byte_swap_is_involutive() {
        let v = ScanValue::U32(0x1122_3344);
        assert_eq!(v.byte_swapped().byte_swapped(), v);
    }

    #[test]
    fn short_buffer_yields_none() {
        assert!(ScanValue::read(ScalarWidths::U32, &[1, 2]).is_none());
    }
}
