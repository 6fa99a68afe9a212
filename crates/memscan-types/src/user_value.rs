//! Parsed user-supplied literals (spec §3 "user value").
//!
//! Parsing the literal text itself is the command layer's job (spec §1,
//! "user-value parsing for numeric and byte-array literals" is listed as an
//! external collaborator); this module only defines the parsed shape that
//! the scan routines consume.

use crate::flags::ScalarWidths;
use crate::value::ScanValue;

/// One byte of a byte-array literal: either a fixed value or a wildcard
/// that matches anything (spec §4.2 "ByteArray predicates honour per-byte
/// wildcards").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteArrayElement {
    Fixed(u8),
    Wildcard,
}

/// A fully parsed user literal.
#[derive(Debug, Clone, PartialEq)]
pub enum UserValue {
    /// A number, tagged with every scalar width it fits (e.g. `100` fits
    /// `u8` through `u64` and `s16` through `s64`, but not `u8`'s
    /// negative-incompatible siblings).
    Number {
        /// The value as-parsed; reinterpreted per-width when scanning.
        value: f64,
        /// Which [`ScalarWidths`] bits this literal's magnitude fits in.
        admissible: ScalarWidths,
    },
    /// An inclusive numeric range `[lo, hi]` (spec's `Range` match type).
    Range { lo: f64, hi: f64, admissible: ScalarWidths },
    /// A string literal (spec's `String` scan data type).
    Str(String),
    /// A byte-array literal with optional per-byte wildcards.
    ByteArray(Vec<ByteArrayElement>),
}

impl UserValue {
    /// Construct a plain exact-width number value, useful for `set`'s
    /// synthetic "the operand is exactly this width" literal.
    #[must_use]
    pub fn exact(value: ScanValue) -> Self {
        UserValue::Number {
            value: value.as_f64(),
            admissible: value.width_flag(),
        }
    }
}
