//! Amount and gas conversions between human decimal strings and on-chain
//! base units.

use thiserror::Error;

/// 1 Tgas in gas units.
pub const TGAS: u64 = 1_000_000_000_000;

/// 1 NEAR in yoctoNEAR.
pub const ONE_NEAR: u128 = 1_000_000_000_000_000_000_000_000;

/// Smallest deposit, used as proof of wallet ownership.
pub const ONE_YOCTO: &str = "1";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid amount '{0}'")]
    Invalid(String),
    #[error("amount '{amount}' has more than {decimals} fractional digits")]
    TooManyDecimals { amount: String, decimals: u8 },
    #[error("amount '{0}' does not fit in 128 bits")]
    Overflow(String),
}

pub const fn tgas(n: u64) -> u64 {
    n * TGAS
}

pub fn ntoy(near: u128) -> Result<u128, UnitsError> {
    near.checked_mul(ONE_NEAR)
        .ok_or_else(|| UnitsError::Overflow(near.to_string()))
}

pub fn yton(yocto: &str) -> Result<String, UnitsError> {
    convert_to_decimals(yocto, 24, None)
}

fn pow10(decimals: u8) -> Result<u128, UnitsError> {
    10_u128
        .checked_pow(u32::from(decimals))
        .ok_or_else(|| UnitsError::Overflow(format!("1e{decimals}")))
}

/// Parses a non-negative base-unit integer string.
pub fn parse_u128(amount: &str) -> Result<u128, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }
    if !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UnitsError::Invalid(amount.to_owned()));
    }
    amount
        .parse::<u128>()
        .map_err(|_| UnitsError::Overflow(amount.to_owned()))
}

/// Human decimal amount ("12.5") to base units for a token with `decimals`.
///
/// Thousands separators are ignored. Signs, exponents and more fractional
/// digits than the token supports are rejected rather than rounded.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<u128, UnitsError> {
    let cleaned: String = amount.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match cleaned.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Invalid(amount.to_owned()));
    }
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !digits_only(frac) {
        return Err(UnitsError::Invalid(amount.to_owned()));
    }

    let frac = frac.trim_end_matches('0');
    if frac.len() > usize::from(decimals) {
        return Err(UnitsError::TooManyDecimals {
            amount: amount.to_owned(),
            decimals,
        });
    }

    let overflow = || UnitsError::Overflow(amount.to_owned());
    let scale = pow10(decimals)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| overflow())?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = usize::from(decimals));
        padded.parse::<u128>().map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or_else(overflow)
}

/// Output is canonical: leading zeroes are not kept, so `"007"` and `"7"`
/// convert to the same string. Round trips through [`convert_to_decimals`]
/// reproduce canonical base-unit strings only.
pub fn convert_to_base(amount: &str, decimals: u8) -> Result<String, UnitsError> {
    to_base_units(amount, decimals).map(|v| v.to_string())
}

/// Base units to a human decimal string. `truncate` caps the number of
/// fractional digits kept (no rounding). Trailing zeroes are dropped.
pub fn convert_to_decimals(
    amount: &str,
    decimals: u8,
    truncate: Option<usize>,
) -> Result<String, UnitsError> {
    let value = parse_u128(amount)?;
    Ok(format_base_units(value, decimals, truncate))
}

pub fn format_base_units(value: u128, decimals: u8, truncate: Option<usize>) -> String {
    let width = usize::from(decimals);
    let digits = format!("{value:0>len$}", len = width + 1);
    let (whole, frac) = digits.split_at(digits.len() - width);
    let frac = match truncate {
        Some(keep) if keep < frac.len() => &frac[..keep],
        _ => frac,
    };
    if frac.is_empty() {
        return whole.to_owned();
    }
    remove_dec_zeroes(&format!("{whole}.{frac}"))
}

/// "1.2300" -> "1.23", "5.000" -> "5". Strings without a dot are untouched.
pub fn remove_dec_zeroes(value: &str) -> String {
    if !value.contains('.') {
        return value.to_owned();
    }
    value
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_owned()
}

/// Groups the integer part in thousands: "1234567.5" -> "1,234,567.5".
pub fn add_commas(value: &str) -> String {
    let (whole, frac) = match value.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (value, None),
    };
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac {
        Some(frac) => format!("{grouped}.{frac}"),
        None => grouped,
    }
}

/// Long account ids are shown as `first10..last10`.
pub fn shorten_account_id(account_id: &str) -> String {
    let chars: Vec<char> = account_id.chars().collect();
    if chars.len() <= 22 {
        return account_id.to_owned();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{head}..{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_amounts_scale_by_decimals() {
        assert_eq!(convert_to_base("5", 6).unwrap(), "5000000");
        assert_eq!(convert_to_base("1", 24).unwrap(), ONE_NEAR.to_string());
        assert_eq!(convert_to_base("0", 18).unwrap(), "0");
    }

    #[test]
    fn fractional_amounts_are_exact() {
        assert_eq!(convert_to_base("12.5", 6).unwrap(), "12500000");
        assert_eq!(convert_to_base(".25", 2).unwrap(), "25");
        assert_eq!(convert_to_base("1,000.10", 3).unwrap(), "1000100");
    }

    #[test]
    fn malformed_amounts_are_rejected() {
        assert_eq!(convert_to_base("", 6), Err(UnitsError::Empty));
        assert!(matches!(convert_to_base("-1", 6), Err(UnitsError::Invalid(_))));
        assert!(matches!(convert_to_base("1e3", 6), Err(UnitsError::Invalid(_))));
        assert!(matches!(convert_to_base(".", 6), Err(UnitsError::Invalid(_))));
        assert!(matches!(
            convert_to_base("0.0000001", 6),
            Err(UnitsError::TooManyDecimals { .. })
        ));
        assert!(matches!(
            convert_to_base("999999999999999999", 24),
            Err(UnitsError::Overflow(_))
        ));
    }

    #[test]
    fn base_units_render_without_trailing_zeroes() {
        assert_eq!(convert_to_decimals("5000000", 6, None).unwrap(), "5");
        assert_eq!(convert_to_decimals("12500000", 6, None).unwrap(), "12.5");
        assert_eq!(convert_to_decimals("7", 3, None).unwrap(), "0.007");
        assert_eq!(convert_to_decimals("42", 0, None).unwrap(), "42");
    }

    #[test]
    fn truncation_drops_digits_without_rounding() {
        assert_eq!(convert_to_decimals("1999999", 6, Some(2)).unwrap(), "1.99");
        assert_eq!(convert_to_decimals("1000001", 6, Some(2)).unwrap(), "1");
        assert_eq!(convert_to_decimals("1999999", 6, Some(0)).unwrap(), "1");
    }

    #[test]
    fn decimal_round_trip_is_identity() {
        let amounts = ["0", "1", "10", "5000000", "123456789012345678901234567"];
        for decimals in [0_u8, 1, 6, 18, 24] {
            for amount in amounts {
                let human = convert_to_decimals(amount, decimals, None).unwrap();
                assert_eq!(convert_to_base(&human, decimals).unwrap(), amount, "d={decimals}");
            }
        }
    }

    #[test]
    fn leading_zeroes_normalise_in_both_directions() {
        assert_eq!(convert_to_base("007", 0).unwrap(), "7");
        assert_eq!(convert_to_base("0012.500", 6).unwrap(), "12500000");
        assert_eq!(convert_to_decimals("0005000000", 6, None).unwrap(), "5");

        let human = convert_to_decimals("007", 6, None).unwrap();
        assert_eq!(human, "0.000007");
        assert_eq!(convert_to_base(&human, 6).unwrap(), "7");
    }

    #[test]
    fn gas_and_near_helpers() {
        assert_eq!(tgas(25), 25_000_000_000_000);
        assert_eq!(ntoy(2).unwrap(), 2 * ONE_NEAR);
        assert_eq!(yton("1500000000000000000000000").unwrap(), "1.5");
    }

    #[test]
    fn display_helpers() {
        assert_eq!(add_commas("1234567.5"), "1,234,567.5");
        assert_eq!(add_commas("123"), "123");
        assert_eq!(remove_dec_zeroes("2.500"), "2.5");
        assert_eq!(remove_dec_zeroes("100"), "100");
        assert_eq!(shorten_account_id("alice.testnet"), "alice.testnet");
        assert_eq!(
            shorten_account_id("a-very-long-account-name.testnet"),
            "a-very-lon..me.testnet"
        );
    }
}
