/// User-input / precondition errors raised while resolving or running a
/// scan routine (spec §7 kinds 1 and 2).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("this match type requires a prior scan")]
    RequiresPriorScan,
    #[error("byte-array/string scan data types only support Any, EqualTo and NotEqualTo")]
    UnsupportedAggregateMatchType,
    #[error("a Range scan requires a Range user value")]
    RangeValueRequired,
    #[error("an IncreasedBy/DecreasedBy scan requires a Number user value")]
    DeltaValueRequired,
    #[error("a byte-array scan requires a ByteArray user value")]
    ByteArrayValueRequired,
    #[error("a string scan requires a Str user value")]
    StringValueRequired,
    #[error("not enough bytes supplied to evaluate the widest candidate width")]
    ShortBuffer,
}
