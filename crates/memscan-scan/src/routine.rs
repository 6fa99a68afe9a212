//! The scan routine family (spec §4.2): evaluates one candidate entry
//! against a `(scan_data_type, match_type)` pair and narrows its flags.

use memscan_types::{ByteArrayElement, MatchFlags, ScalarWidths, ScanValue, UserValue};

use crate::error::ScanError;
use crate::options::ScanOptions;
use crate::types::{MatchType, ScanDataType};

/// Everything a scan routine needs besides the entry's own old/new bytes.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub scan_data_type: ScanDataType,
    pub match_type: MatchType,
    pub user_value: &'a UserValue,
    pub options: &'a ScanOptions,
}

/// Evaluates one candidate byte offset.
///
/// `prior_flags` is `None` on a first scan. `old_bytes` must cover at least
/// the widest width `prior_flags` admits; `new_bytes` must cover at least
/// the widest width `scan_data_type` admits (the caller — the scan driver —
/// is responsible for having read enough of both; widths for which too few
/// bytes were supplied are silently skipped rather than erroring, the same
/// way a width that runs past the end of a region is never offered as
/// viable in the first place).
///
/// Returns `Ok(None)` when no viable width survives (the candidate is
/// dropped), `Ok(Some(flags))` with the narrowed flag set otherwise.
pub fn evaluate(
    ctx: &ScanContext<'_>,
    prior_flags: Option<MatchFlags>,
    old_bytes: Option<&[u8]>,
    new_bytes: &[u8],
) -> Result<Option<MatchFlags>, ScanError> {
    if prior_flags.is_none() && !ctx.match_type.valid_on_first_scan() {
        return Err(ScanError::RequiresPriorScan);
    }

    if ctx.scan_data_type.is_aggregate() {
        return evaluate_aggregate(ctx, new_bytes);
    }

    let mut viable = match prior_flags {
        Some(f) => f.scalars() & ctx.scan_data_type.admissible_scalars(),
        None => ctx.scan_data_type.admissible_scalars(),
    };
    if viable.is_empty() {
        return Ok(None);
    }

    if matches!(ctx.match_type, MatchType::Any) {
        return Ok(Some(MatchFlags::from_scalars(viable)));
    }

    if let Some((_, admissible)) = user_number(ctx.user_value) {
        if matches!(
            ctx.match_type,
            MatchType::EqualTo
                | MatchType::NotEqualTo
                | MatchType::GreaterThan
                | MatchType::LessThan
                | MatchType::IncreasedBy
                | MatchType::DecreasedBy
        ) {
            viable &= admissible;
        }
    }
    if let UserValue::Range { admissible, .. } = ctx.user_value {
        if matches!(ctx.match_type, MatchType::Range) {
            viable &= *admissible;
        }
    }

    let mut result = ScalarWidths::empty();
    for bit in ScalarWidths::all().iter() {
        if !viable.contains(bit) {
            continue;
        }
        let width = ScalarWidths::width_bytes(bit) as usize;
        let Some(new_val) = read_width(bit, new_bytes, ctx.options.endianness.needs_swap())
        else {
            continue;
        };
        let old_val = old_bytes.and_then(|b| read_width(bit, b, ctx.options.endianness.needs_swap()));

        let satisfied = match ctx.match_type {
            MatchType::Any => unreachable!("handled above"),
            MatchType::EqualTo | MatchType::NotEqualTo | MatchType::GreaterThan | MatchType::LessThan => {
                let Some((value, _)) = user_number(ctx.user_value) else {
                    return Err(ScanError::DeltaValueRequired);
                };
                let n = new_val.as_f64();
                match ctx.match_type {
                    MatchType::EqualTo => n == value,
                    MatchType::NotEqualTo => n != value,
                    MatchType::GreaterThan => n > value,
                    MatchType::LessThan => n < value,
                    _ => unreachable!(),
                }
            }
            MatchType::Range => {
                let UserValue::Range { lo, hi, .. } = ctx.user_value else {
                    return Err(ScanError::RangeValueRequired);
                };
                let n = new_val.as_f64();
                *lo <= n && n <= *hi
            }
            MatchType::Changed | MatchType::NotChanged => {
                let Some(old_val) = old_val else { continue };
                let changed = old_val.as_f64() != new_val.as_f64();
                if ctx.match_type == MatchType::Changed {
                    changed
                } else {
                    !changed
                }
            }
            MatchType::Increased | MatchType::Decreased => {
                let Some(old_val) = old_val else { continue };
                let increased = value_increased(old_val, new_val, width, ctx.options.detect_reverse_change);
                if ctx.match_type == MatchType::Increased {
                    increased
                } else {
                    value_increased(new_val, old_val, width, ctx.options.detect_reverse_change)
                }
            }
            MatchType::IncreasedBy | MatchType::DecreasedBy => {
                let Some(old_val) = old_val else { continue };
                let Some((delta, _)) = user_number(ctx.user_value) else {
                    return Err(ScanError::DeltaValueRequired);
                };
                let actual = new_val.as_f64() - old_val.as_f64();
                let expected = if ctx.match_type == MatchType::IncreasedBy {
                    delta
                } else {
                    -delta
                };
                (actual - expected).abs() < f64::EPSILON.max(expected.abs() * 1e-9)
            }
        };

        if satisfied {
            result |= bit;
        }
    }

    if result.is_empty() {
        Ok(None)
    } else {
        Ok(Some(MatchFlags::from_scalars(result)))
    }
}

fn user_number(user_value: &UserValue) -> Option<(f64, ScalarWidths)> {
    match user_value {
        UserValue::Number { value, admissible } => Some((*value, *admissible)),
        _ => None,
    }
}

fn read_width(bit: ScalarWidths, bytes: &[u8], swap: bool) -> Option<ScanValue> {
    let v = ScanValue::read(bit, bytes)?;
    Some(if swap { v.byte_swapped() } else { v })
}

/// Whether `new` represents an increase over `old` under this width's
/// signed/unsigned comparison (spec §4.2 "Increased / Decreased use signed
/// comparison for s* widths and unsigned for u* widths"), optionally also
/// accepting a wraparound (spec §6 `detect_reverse_change`).
fn value_increased(old: ScanValue, new: ScanValue, width_bytes: usize, detect_reverse_change: bool) -> bool {
    if new.as_f64() > old.as_f64() {
        return true;
    }
    if !detect_reverse_change {
        return false;
    }
    let old_bits = raw_bits(old);
    let new_bits = raw_bits(new);
    if old_bits == new_bits {
        return false;
    }
    let range: u128 = 1u128 << (width_bytes * 8).min(64);
    let forward = (u128::from(new_bits) + range - u128::from(old_bits)) % range;
    forward < range / 2
}

fn raw_bits(v: ScanValue) -> u64 {
    let bytes = v.to_ne_bytes();
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(&bytes);
    u64::from_ne_bytes(buf)
}

fn evaluate_aggregate(
    ctx: &ScanContext<'_>,
    new_bytes: &[u8],
) -> Result<Option<MatchFlags>, ScanError> {
    let pattern_len = match ctx.scan_data_type {
        ScanDataType::ByteArray => match ctx.user_value {
            UserValue::ByteArray(p) => p.len(),
            _ => return Err(ScanError::ByteArrayValueRequired),
        },
        ScanDataType::String => match ctx.user_value {
            UserValue::Str(s) => s.len(),
            _ => return Err(ScanError::StringValueRequired),
        },
        _ => unreachable!("caller only routes aggregate scan data types here"),
    };

    if matches!(ctx.match_type, MatchType::Any) {
        if new_bytes.len() < pattern_len {
            return Ok(None);
        }
        return Ok(Some(aggregate_flags(ctx.scan_data_type, pattern_len)));
    }

    if !matches!(ctx.match_type, MatchType::EqualTo | MatchType::NotEqualTo) {
        return Err(ScanError::UnsupportedAggregateMatchType);
    }
    if new_bytes.len() < pattern_len {
        return Ok(None);
    }

    let equal = match ctx.scan_data_type {
        ScanDataType::ByteArray => {
            let UserValue::ByteArray(pattern) = ctx.user_value else {
                return Err(ScanError::ByteArrayValueRequired);
            };
            pattern
                .iter()
                .zip(&new_bytes[..pattern_len])
                .all(|(p, b)| matches!(p, ByteArrayElement::Wildcard) || matches!(p, ByteArrayElement::Fixed(v) if v == b))
        }
        ScanDataType::String => {
            let UserValue::Str(s) = ctx.user_value else {
                return Err(ScanError::StringValueRequired);
            };
            &new_bytes[..pattern_len] == s.as_bytes()
        }
        _ => unreachable!(),
    };

    let satisfied = if ctx.match_type == MatchType::EqualTo {
        equal
    } else {
        !equal
    };
    if satisfied {
        Ok(Some(aggregate_flags(ctx.scan_data_type, pattern_len)))
    } else {
        Ok(None)
    }
}

fn aggregate_flags(scan_data_type: ScanDataType, len: usize) -> MatchFlags {
    let len = len as u16;
    match scan_data_type {
        ScanDataType::ByteArray => MatchFlags::from_byte_array(len),
        ScanDataType::String => MatchFlags::from_string(len),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memscan_types::UserValue;

    fn opts() -> ScanOptions {
        ScanOptions::default()
    }

    #[test]
    fn equal_to_narrows_to_widths_where_value_matches() {
        let user = UserValue::Number {
            value: 100.0,
            admissible: ScalarWidths::ALL_INTEGERS,
        };
        let options = opts();
        let ctx = ScanContext {
            scan_data_type: ScanDataType::AnyNumber,
            match_type: MatchType::EqualTo,
            user_value: &user,
            options: &options,
        };
        let bytes = 100u32.to_ne_bytes();
        let result = evaluate(&ctx, None, None, &bytes).unwrap().unwrap();
        assert!(result.scalars().contains(ScalarWidths::U32));
        assert!(result.scalars().contains(ScalarWidths::U8));
    }

    #[test]
    fn first_scan_rejects_changed() {
        let user = UserValue::Number {
            value: 0.0,
            admissible: ScalarWidths::ALL,
        };
        let options = opts();
        let ctx = ScanContext {
            scan_data_type: ScanDataType::AnyNumber,
            match_type: MatchType::Changed,
            user_value: &user,
            options: &options,
        };
        let bytes = [0u8; 8];
        assert_eq!(
            evaluate(&ctx, None, None, &bytes),
            Err(ScanError::RequiresPriorScan)
        );
    }

    #[test]
    fn decreased_drops_entries_that_increased() {
        let user = UserValue::Number {
            value: 0.0,
            admissible: ScalarWidths::ALL,
        };
        let options = opts();
        let ctx = ScanContext {
            scan_data_type: ScanDataType::Int32,
            match_type: MatchType::Decreased,
            user_value: &user,
            options: &options,
        };
        let prior = MatchFlags::from_scalars(ScalarWidths::U32 | ScalarWidths::S32);
        let old_bytes = 100u32.to_ne_bytes();
        let new_bytes = 150u32.to_ne_bytes();
        assert_eq!(
            evaluate(&ctx, Some(prior), Some(&old_bytes), &new_bytes).unwrap(),
            None
        );
    }

    #[test]
    fn byte_array_wildcard_ignores_that_position() {
        let user = UserValue::ByteArray(vec![
            ByteArrayElement::Fixed(0xDE),
            ByteArrayElement::Fixed(0xAD),
            ByteArrayElement::Wildcard,
            ByteArrayElement::Fixed(0xEF),
        ]);
        let options = opts();
        let ctx = ScanContext {
            scan_data_type: ScanDataType::ByteArray,
            match_type: MatchType::EqualTo,
            user_value: &user,
            options: &options,
        };
        let bytes = [0xDE, 0xAD, 0x00, 0xEF];
        let result = evaluate(&ctx, None, None, &bytes).unwrap();
        assert!(result.is_some());

        let other_wildcard_byte = [0xDE, 0xAD, 0xFF, 0xEF];
        let result2 = evaluate(&ctx, None, None, &other_wildcard_byte).unwrap();
        assert!(result2.is_some());

        let mismatched_fixed_byte = [0xDE, 0xAD, 0x00, 0x00];
        let result3 = evaluate(&ctx, None, None, &mismatched_fixed_byte).unwrap();
        assert!(result3.is_none());
    }

    #[test]
    fn range_keeps_only_widths_admitted_by_the_literal() {
        let user = UserValue::Range {
            lo: 10.0,
            hi: 20.0,
            admissible: ScalarWidths::ALL_INTEGERS,
        };
        let options = opts();
        let ctx = ScanContext {
            scan_data_type: ScanDataType::AnyNumber,
            match_type: MatchType::Range,
            user_value: &user,
            options: &options,
        };
        let bytes = 15u32.to_ne_bytes();
        let result = evaluate(&ctx, None, None, &bytes).unwrap().unwrap();
        assert!(!result.scalars().contains(ScalarWidths::F32));
    }

    #[test]
    fn not_changed_applies_the_same_endianness_swap_to_old_and_new() {
        use crate::options::Endianness;

        let user = UserValue::Number {
            value: 0.0,
            admissible: ScalarWidths::U32,
        };
        let options = ScanOptions {
            endianness: Endianness::Big,
            detect_reverse_change: false,
        };
        let ctx = ScanContext {
            scan_data_type: ScanDataType::Int32,
            match_type: MatchType::NotChanged,
            user_value: &user,
            options: &options,
        };
        // Old and new are byte-for-byte identical raw target bytes, and the
        // pattern is asymmetric enough that swapping it changes its value.
        // Old and new must be read under the same swap treatment, or this
        // would wrongly register as `Changed`.
        let bytes = [0x01u8, 0x02, 0x03, 0x04];
        let result = evaluate(&ctx, Some(MatchFlags::from_scalars(ScalarWidths::U32)), Some(&bytes), &bytes)
            .unwrap();
        assert!(result.is_some());
    }
}
