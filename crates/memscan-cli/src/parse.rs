//! User-value and scan-expression parsing (spec §1 lists this as an
//! external collaborator left to the command layer; spec §6 names the
//! shorthand syntax this module implements).

use anyhow::{bail, Result};
use memscan_scan::{MatchType, ScanDataType};
use memscan_types::{ByteArrayElement, ScalarWidths, UserValue};

/// One parsed scan command: a match type plus whatever operand it needs
/// (spec §6 "comparison shorthands `=, !=, <, >, +, -` with optional
/// operands; string literal prefix `\"`; default (numeric-literal) scan").
#[derive(Debug, Clone)]
pub struct ScanExpr {
    pub match_type: MatchType,
    pub user_value: UserValue,
}

/// Parses one scan-expression line under the current `scan_data_type`.
pub fn parse_scan_expr(input: &str, scan_data_type: ScanDataType) -> Result<ScanExpr> {
    let input = input.trim();

    if input.eq_ignore_ascii_case("any") || input == "a" {
        return Ok(ScanExpr {
            match_type: MatchType::Any,
            user_value: UserValue::Number {
                value: 0.0,
                admissible: ScalarWidths::ALL,
            },
        });
    }

    if let Some(rest) = input.strip_prefix("!=") {
        return numeric_expr(rest, MatchType::NotEqualTo, MatchType::Changed, scan_data_type);
    }
    if let Some(rest) = input.strip_prefix('=') {
        return numeric_expr(rest, MatchType::EqualTo, MatchType::NotChanged, scan_data_type);
    }
    if let Some(rest) = input.strip_prefix('<') {
        return numeric_expr(rest, MatchType::LessThan, MatchType::Decreased, scan_data_type);
    }
    if let Some(rest) = input.strip_prefix('>') {
        return numeric_expr(rest, MatchType::GreaterThan, MatchType::Increased, scan_data_type);
    }
    if let Some(rest) = input.strip_prefix('+') {
        let delta = parse_number(rest.trim())?;
        return Ok(ScanExpr {
            match_type: MatchType::IncreasedBy,
            user_value: exact_number(delta, scan_data_type),
        });
    }
    if let Some(rest) = input.strip_prefix('-') {
        let delta = parse_number(rest.trim())?;
        return Ok(ScanExpr {
            match_type: MatchType::DecreasedBy,
            user_value: exact_number(delta, scan_data_type),
        });
    }
    if let Some(rest) = input.strip_prefix('"') {
        let s = rest.strip_suffix('"').unwrap_or(rest);
        return Ok(ScanExpr {
            match_type: MatchType::EqualTo,
            user_value: UserValue::Str(s.to_string()),
        });
    }
    if scan_data_type == ScanDataType::ByteArray {
        return Ok(ScanExpr {
            match_type: MatchType::EqualTo,
            user_value: parse_byte_array(input)?,
        });
    }
    if let Some((lo, hi)) = input.split_once(':') {
        let lo: f64 = parse_number(lo.trim())?;
        let hi: f64 = parse_number(hi.trim())?;
        return Ok(ScanExpr {
            match_type: MatchType::Range,
            user_value: UserValue::Range {
                lo,
                hi,
                admissible: admissible_for(scan_data_type),
            },
        });
    }

    // Bare numeric literal: spec §6 "default (numeric-literal) scan".
    let value = parse_number(input)?;
    Ok(ScanExpr {
        match_type: MatchType::EqualTo,
        user_value: exact_number(value, scan_data_type),
    })
}

fn numeric_expr(
    rest: &str,
    with_operand: MatchType,
    bare: MatchType,
    scan_data_type: ScanDataType,
) -> Result<ScanExpr> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(ScanExpr {
            match_type: bare,
            user_value: exact_number(0.0, scan_data_type),
        });
    }
    let value = parse_number(rest)?;
    Ok(ScanExpr {
        match_type: with_operand,
        user_value: exact_number(value, scan_data_type),
    })
}

fn parse_number(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| anyhow::anyhow!("not a number: {s:?}"))
}

fn admissible_for(scan_data_type: ScanDataType) -> ScalarWidths {
    scan_data_type.admissible_scalars()
}

fn exact_number(value: f64, scan_data_type: ScanDataType) -> UserValue {
    let mut admissible = admissible_for(scan_data_type);
    if value.fract() != 0.0 {
        admissible &= ScalarWidths::ALL_FLOATS;
    } else if value < 0.0 {
        admissible &= ScalarWidths::F32
            | ScalarWidths::F64
            | ScalarWidths::S8
            | ScalarWidths::S16
            | ScalarWidths::S32
            | ScalarWidths::S64;
    }
    UserValue::Number { value, admissible }
}

/// Parses a byte-array literal: space-separated hex byte pairs, with `*`
/// or `?` standing for a per-byte wildcard (spec §4.2 "ByteArray
/// predicates honour per-byte wildcards").
fn parse_byte_array(input: &str) -> Result<UserValue> {
    let mut elements = Vec::new();
    for token in input.split_whitespace() {
        if token == "*" || token == "?" {
            elements.push(ByteArrayElement::Wildcard);
        } else {
            let byte = u8::from_str_radix(token, 16)
                .map_err(|_| anyhow::anyhow!("not a hex byte: {token:?}"))?;
            elements.push(ByteArrayElement::Fixed(byte));
        }
    }
    if elements.is_empty() {
        bail!("empty byte-array literal");
    }
    Ok(UserValue::ByteArray(elements))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_is_equal_to() {
        let expr = parse_scan_expr("100", ScanDataType::Int32).unwrap();
        assert!(matches!(expr.match_type, MatchType::EqualTo));
    }

    #[test]
    fn bare_operator_means_unchanged_or_changed() {
        let expr = parse_scan_expr("=", ScanDataType::Int32).unwrap();
        assert!(matches!(expr.match_type, MatchType::NotChanged));
        let expr = parse_scan_expr("!=", ScanDataType::Int32).unwrap();
        assert!(matches!(expr.match_type, MatchType::Changed));
    }

    #[test]
    fn plus_with_operand_is_increased_by() {
        let expr = parse_scan_expr("+5", ScanDataType::Int32).unwrap();
        assert!(matches!(expr.match_type, MatchType::IncreasedBy));
    }

    #[test]
    fn quoted_literal_is_a_string() {
        let expr = parse_scan_expr("\"hello\"", ScanDataType::String).unwrap();
        assert!(matches!(expr.user_value, UserValue::Str(ref s) if s == "hello"));
    }

    #[test]
    fn wildcard_byte_array_parses() {
        let expr = parse_scan_expr("DE AD * EF", ScanDataType::ByteArray).unwrap();
        let UserValue::ByteArray(elements) = expr.user_value else {
            panic!("expected a byte array");
        };
        assert_eq!(elements.len(), 4);
        assert!(matches!(elements[2], ByteArrayElement::Wildcard));
    }
}
