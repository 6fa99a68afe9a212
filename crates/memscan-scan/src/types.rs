//! The two axes the scan routine family is parameterised by (spec §4.2).

use memscan_types::ScalarWidths;

/// Which width interpretations a scan is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDataType {
    AnyNumber,
    AnyInteger,
    AnyFloat,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    ByteArray,
    String,
}

impl ScanDataType {
    /// Scalar widths this scan data type admits. `ByteArray`/`String` have
    /// no scalar widths — they go through the aggregate path instead.
    #[must_use]
    pub const fn admissible_scalars(self) -> ScalarWidths {
        match self {
            ScanDataType::AnyNumber => ScalarWidths::ALL,
            ScanDataType::AnyInteger => ScalarWidths::ALL_INTEGERS,
            ScanDataType::AnyFloat => ScalarWidths::ALL_FLOATS,
            ScanDataType::Int8 => ScalarWidths::U8.union(ScalarWidths::S8),
            ScanDataType::Int16 => ScalarWidths::U16.union(ScalarWidths::S16),
            ScanDataType::Int32 => ScalarWidths::U32.union(ScalarWidths::S32),
            ScanDataType::Int64 => ScalarWidths::U64.union(ScalarWidths::S64),
            ScanDataType::Float32 => ScalarWidths::F32,
            ScanDataType::Float64 => ScalarWidths::F64,
            ScanDataType::ByteArray | ScanDataType::String => ScalarWidths::empty(),
        }
    }

    #[must_use]
    pub const fn is_aggregate(self) -> bool {
        matches!(self, ScanDataType::ByteArray | ScanDataType::String)
    }
}

/// Which comparison a scan performs (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Any,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
    Range,
    Changed,
    NotChanged,
    Increased,
    Decreased,
    IncreasedBy,
    DecreasedBy,
}

impl MatchType {
    /// True for the six match types valid without a prior scan (spec §4.2
    /// "First-scan restriction").
    #[must_use]
    pub const fn valid_on_first_scan(self) -> bool {
        matches!(
            self,
            MatchType::Any
                | MatchType::EqualTo
                | MatchType::NotEqualTo
                | MatchType::GreaterThan
                | MatchType::LessThan
                | MatchType::Range
        )
    }

    /// True for match types that compare against a remembered old value.
    #[must_use]
    pub const fn needs_old_value(self) -> bool {
        matches!(
            self,
            MatchType::Changed
                | MatchType::NotChanged
                | MatchType::Increased
                | MatchType::Decreased
                | MatchType::IncreasedBy
                | MatchType::DecreasedBy
        )
    }
}
