//! The per-byte match-flag bitset.
//!
//! [`MatchFlags`] records, for one byte of target memory, which width
//! interpretations starting at that byte are still viable match candidates.
//! Clearing a flag set is equivalent to deleting the match (spec §3).

use bitflags::bitflags;

bitflags! {
    /// Which fixed-width scalar interpretations are still viable.
    ///
    /// Each bit corresponds to one entry of the width lattice in spec §3:
    /// `{u8, s8, u16, s16, u32, s32, u64, s64, f32, f64}`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ScalarWidths: u16 {
        const U8  = 1 << 0;
        const S8  = 1 << 1;
        const U16 = 1 << 2;
        const S16 = 1 << 3;
        const U32 = 1 << 4;
        const S32 = 1 << 5;
        const U64 = 1 << 6;
        const S64 = 1 << 7;
        const F32 = 1 << 8;
        const F64 = 1 << 9;
    }
}

impl ScalarWidths {
    /// All ten scalar interpretations of an `AnyNumber` first scan.
    pub const ALL: Self = Self::all();

    /// Integer interpretations only (spec's `AnyInteger` scan data type).
    pub const ALL_INTEGERS: Self = Self::U8
        .union(Self::S8)
        .union(Self::U16)
        .union(Self::S16)
        .union(Self::U32)
        .union(Self::S32)
        .union(Self::U64)
        .union(Self::S64);

    /// Float interpretations only (spec's `AnyFloat` scan data type).
    pub const ALL_FLOATS: Self = Self::F32.union(Self::F64);

    /// Size in bytes of one bit's interpretation.
    #[must_use]
    pub const fn width_bytes(self_bit: Self) -> u32 {
        match self_bit {
            Self::U8 | Self::S8 => 1,
            Self::U16 | Self::S16 => 2,
            Self::U32 | Self::S32 | Self::F32 => 4,
            Self::U64 | Self::S64 | Self::F64 => 8,
            _ => 0,
        }
    }

    /// The largest width, in bytes, among the set bits. Zero if empty.
    #[must_use]
    pub fn max_width_bytes(self) -> u32 {
        Self::all()
            .iter()
            .filter(|bit| self.contains(*bit))
            .map(Self::width_bytes)
            .max()
            .unwrap_or(0)
    }

    /// True for signed-integer bits.
    #[must_use]
    pub const fn is_signed(self_bit: Self) -> bool {
        matches!(self_bit, Self::S8 | Self::S16 | Self::S32 | Self::S64)
    }

    /// True for floating-point bits.
    #[must_use]
    pub const fn is_float(self_bit: Self) -> bool {
        matches!(self_bit, Self::F32 | Self::F64)
    }
}

/// The two mutually-exclusive "aggregate" match modes: a byte-array of a
/// declared length, or a string of a declared length. At most one is
/// non-zero at a time (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregate {
    #[default]
    None,
    ByteArray(u16),
    String(u16),
}

impl Aggregate {
    #[must_use]
    pub const fn len(self) -> u16 {
        match self {
            Aggregate::None => 0,
            Aggregate::ByteArray(n) | Aggregate::String(n) => n,
        }
    }
}

/// Full match-flag set for one byte: the scalar width lattice plus at most
/// one aggregate (byte-array / string) candidacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchFlags {
    scalars: ScalarWidths,
    aggregate: Aggregate,
}

impl MatchFlags {
    /// The empty flag set: no viable width, i.e. "not a match" (spec §3).
    pub const NONE: Self = Self {
        scalars: ScalarWidths::empty(),
        aggregate: Aggregate::None,
    };

    #[must_use]
    pub const fn from_scalars(scalars: ScalarWidths) -> Self {
        Self {
            scalars,
            aggregate: Aggregate::None,
        }
    }

    #[must_use]
    pub const fn from_byte_array(len: u16) -> Self {
        Self {
            scalars: ScalarWidths::empty(),
            aggregate: Aggregate::ByteArray(len),
        }
    }

    #[must_use]
    pub const fn from_string(len: u16) -> Self {
        Self {
            scalars: ScalarWidths::empty(),
            aggregate: Aggregate::String(len),
        }
    }

    #[must_use]
    pub const fn scalars(self) -> ScalarWidths {
        self.scalars
    }

    #[must_use]
    pub const fn aggregate(self) -> Aggregate {
        self.aggregate
    }

    /// Narrow to the intersection with `other`'s scalar widths, keeping
    /// whichever aggregate (if any) is still present in both.
    #[must_use]
    pub fn intersect(self, other: ScalarWidths) -> Self {
        Self {
            scalars: self.scalars & other,
            aggregate: self.aggregate,
        }
    }

    /// The largest width in bytes across scalars and any aggregate.
    /// Zero means "not a real match" — the byte carries no viable
    /// interpretation, equivalent to a deleted entry (spec §3).
    #[must_use]
    pub fn max_width_in_bytes(self) -> u32 {
        match self.aggregate {
            Aggregate::None => self.scalars.max_width_bytes(),
            Aggregate::ByteArray(n) | Aggregate::String(n) => u32::from(n),
        }
    }

    /// Equivalent to "this byte is a match" (spec §3 invariant).
    #[must_use]
    pub fn is_match(self) -> bool {
        self.max_width_in_bytes() > 0
    }

    /// Clear all flags — equivalent to deleting the match (spec §3).
    pub fn clear(&mut self) {
        *self = Self::NONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_flags_are_not_a_match() {
        assert!(!MatchFlags::NONE.is_match());
        assert_eq!(MatchFlags::NONE.max_width_in_bytes(), 0);
    }

    #[test]
    fn max_width_picks_the_widest_viable_scalar() {
        let flags = MatchFlags::from_scalars(ScalarWidths::U8 | ScalarWidths::U32);
        assert_eq!(flags.max_width_in_bytes(), 4);
    }

    #[test]
    fn intersect_narrows_to_shared_widths() {
        let flags = MatchFlags::from_scalars(ScalarWidths::U8 | ScalarWidths::U16);
        let narrowed = flags.intersect(ScalarWidths::U16 | ScalarWidths::U32);
        assert_eq!(narrowed.scalars(), ScalarWidths::U16);
    }

    #[test]
    fn byte_array_aggregate_reports_its_declared_length() {
        let flags = MatchFlags::from_byte_array(4);
        assert_eq!(flags.max_width_in_bytes(), 4);
        assert!(flags.is_match());
    }

    #[test]
    fn clearing_deletes_the_match() {
        let mut flags = MatchFlags::from_scalars(ScalarWidths::U32);
        flags.clear();
        assert!(!flags.is_match());
    }
}
