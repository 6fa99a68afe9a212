//! Scan-affecting session options (spec §6 "Options").

/// `endianness` option: whether the target's byte order differs from the
/// host's (spec §4.2 "Endianness").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Host,
    Little,
    Big,
}

impl Endianness {
    /// Whether a value read from the target needs swapping before
    /// comparison, given the host's native order.
    #[must_use]
    pub fn needs_swap(self) -> bool {
        match self {
            Endianness::Host => false,
            Endianness::Little => cfg!(target_endian = "big"),
            Endianness::Big => cfg!(target_endian = "little"),
        }
    }
}

/// Options that change scan-routine behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub endianness: Endianness,
    /// `detect_reverse_change` (spec §6): also treat a wraparound delta as
    /// satisfying `Increased`/`Decreased`. Concretely: if the direct
    /// comparison fails, and the unsigned wrapping distance travelled in
    /// the requested direction is less than half the width's value range,
    /// the entry still counts as a match. This catches counters that wrap
    /// (e.g. an `u8` health stat going `1 -> 255` really did "decrease by
    /// 2", not "increase by 254").
    pub detect_reverse_change: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            endianness: Endianness::default(),
            detect_reverse_change: false,
        }
    }
}
