//! Fixed-point amount rendering.
//!
//! Ledger amounts are integers with an implied denominator of 10^7. They are
//! rendered with exactly seven fractional digits using integer arithmetic only.

use crate::error::TypeError;

/// Number of raw units per whole unit.
pub const ONE: i64 = 10_000_000;

const DECIMALS: usize = 7;

/// Render a 64-bit amount, e.g. `1_000_000_000` -> `"100.0000000"`.
pub fn format(raw: i64) -> String {
    format_i128(raw as i128)
}

/// Render a 128-bit amount (contract asset events carry `i128`).
pub fn format_i128(raw: i128) -> String {
    let sign = if raw < 0 { "-" } else { "" };
    let abs = raw.unsigned_abs();
    let unit = ONE as u128;
    format!("{sign}{}.{:0width$}", abs / unit, abs % unit, width = DECIMALS)
}

/// Render the ratio `n / d` with seven fractional digits, rounding the last
/// digit to nearest with halves away from zero.
pub fn format_ratio(n: i64, d: i64) -> Result<String, TypeError> {
    if d == 0 {
        return Err(TypeError::ZeroDenominator);
    }
    let negative = (n < 0) != (d < 0) && n != 0;
    let num = (n as i128).unsigned_abs() * ONE as u128;
    let den = (d as i128).unsigned_abs();
    let mut scaled = num / den;
    if (num % den) * 2 >= den {
        scaled += 1;
    }
    let unit = ONE as u128;
    let sign = if negative && scaled != 0 { "-" } else { "" };
    Ok(format!(
        "{sign}{}.{:0width$}",
        scaled / unit,
        scaled % unit,
        width = DECIMALS
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_whole_units() {
        assert_eq!(format(1_000_000_000), "100.0000000");
        assert_eq!(format(50_000_000), "5.0000000");
        assert_eq!(format(0), "0.0000000");
    }

    #[test]
    fn formats_fractions() {
        assert_eq!(format(1), "0.0000001");
        assert_eq!(format(12_345_678), "1.2345678");
    }

    #[test]
    fn formats_negatives() {
        assert_eq!(format(-5_000_000), "-0.5000000");
        assert_eq!(format(i64::MIN), "-922337203685.4775808");
    }

    #[test]
    fn formats_i128() {
        assert_eq!(format_i128(10_000_000_000_000_000_000), "1000000000000.0000000");
    }

    #[test]
    fn ratio_rounds_half_away_from_zero() {
        assert_eq!(format_ratio(1, 2).unwrap(), "0.5000000");
        assert_eq!(format_ratio(1, 3).unwrap(), "0.3333333");
        assert_eq!(format_ratio(2, 3).unwrap(), "0.6666667");
        assert_eq!(format_ratio(-2, 3).unwrap(), "-0.6666667");
        assert_eq!(format_ratio(1, 20_000_000).unwrap(), "0.0000001");
    }

    #[test]
    fn ratio_rejects_zero_denominator() {
        assert_eq!(format_ratio(1, 0).unwrap_err(), TypeError::ZeroDenominator);
    }

    proptest! {
        #[test]
        fn format_has_seven_decimals(raw in any::<i64>()) {
            let s = format(raw);
            let (_, frac) = s.split_once('.').unwrap();
            prop_assert_eq!(frac.len(), 7);
        }

        #[test]
        fn whole_ratio_matches_format(n in -1_000_000i64..1_000_000) {
            prop_assert_eq!(format_ratio(n, 1).unwrap(), format(n * ONE));
        }
    }
}
