use num::bigint::BigInt;
use num::traits::pow;
use num::{BigRational, Signed, ToPrimitive, Zero};
use thiserror::Error;

/// Exact amount. Decimal input is parsed to the rational it denotes, so no
/// binary floating point rounding ever leaks into a total.
pub type Money = BigRational;

pub struct WrappedMoney(Money);

/// Largest decimal exponent accepted by [`parse`]; anything beyond is not a
/// finite amount in any upstream system we read from.
const MAX_EXPONENT: i64 = 308;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoneyError {
    #[error("empty value")]
    Empty,
    #[error("`{0}` is not a decimal number")]
    Invalid(String),
    #[error("exponent of `{0}` is out of range")]
    ExponentOutOfRange(String),
    #[error("`{0}` has no finite floating point form")]
    NotRepresentable(String),
}

pub fn zero() -> Money {
    Money::zero()
}

pub fn from<T: Into<WrappedMoney>>(x: T) -> Money {
    let wrapped: WrappedMoney = x.into();
    wrapped.0
}

/// `None` when the value has no faithful `f64` form: it overflows, or it is
/// non-zero but would come out as zero.
pub fn to_f64(m: &Money) -> Option<f64> {
    let numer = m.numer().to_f64()?;
    let denom = m.denom().to_f64()?;
    let value = numer / denom;
    if !value.is_finite() || (value == 0.0 && !m.is_zero()) {
        None
    } else {
        Some(value)
    }
}

/// Parses `[+-]digits[.digits][e[+-]digits]`, ignoring surrounding
/// whitespace.
pub fn parse(s: &str) -> Result<Money, ParseMoneyError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseMoneyError::Empty);
    }
    let invalid = || ParseMoneyError::Invalid(trimmed.to_owned());

    let (negative, unsigned) = if let Some(rest) = trimmed.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = trimmed.strip_prefix('+') {
        (false, rest)
    } else {
        (false, trimmed)
    };

    let (mantissa, exponent) = match unsigned.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => {
            let raw = &unsigned[i + 1..];
            let exponent: i64 = match raw.parse() {
                Ok(exponent) => exponent,
                Err(_) if is_integer_literal(raw) => {
                    return Err(ParseMoneyError::ExponentOutOfRange(trimmed.to_owned()));
                }
                Err(_) => return Err(invalid()),
            };
            (&unsigned[..i], exponent)
        }
        None => (unsigned, 0),
    };
    if exponent.abs() > MAX_EXPONENT {
        return Err(ParseMoneyError::ExponentOutOfRange(trimmed.to_owned()));
    }

    let (int_part, frac_part) = match mantissa.find('.') {
        Some(i) => (&mantissa[..i], &mantissa[i + 1..]),
        None => (mantissa, ""),
    };
    let all_digits = int_part
        .bytes()
        .chain(frac_part.bytes())
        .all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits {
        return Err(invalid());
    }

    let digits: BigInt = [int_part, frac_part]
        .concat()
        .parse()
        .map_err(|_| invalid())?;
    let scale = exponent - frac_part.len() as i64;
    let magnitude = if scale >= 0 {
        Money::from_integer(digits * pow(BigInt::from(10), scale as usize))
    } else {
        Money::new(digits, pow(BigInt::from(10), scale.unsigned_abs() as usize))
    };

    Ok(if negative { -magnitude } else { magnitude })
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Rounds to whole cents, half away from zero.
pub fn round_to_cents(m: &Money) -> Money {
    let hundred = from(100);
    (m * &hundred).round() / hundred
}

/// Renders with exactly two fractional digits, rounding half away from zero.
/// Values that round to zero never carry a minus sign.
pub fn to_two_decimal_string(m: &Money) -> String {
    let cents = (m * from(100)).round().to_integer();
    let sign = if cents.is_negative() { "-" } else { "" };
    let digits = format!("{:0>3}", cents.abs().to_str_radix(10));
    let (whole, frac) = digits.split_at(digits.len() - 2);
    format!("{}{}.{}", sign, whole, frac)
}

impl From<i32> for WrappedMoney {
    fn from(x: i32) -> WrappedMoney {
        WrappedMoney(Money::from_integer(x.into()))
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ratio(numer: i32, denom: i32) -> Money {
        Money::new(numer.into(), denom.into())
    }

    #[test]
    fn parses_decimals_exactly() {
        assert_eq!(parse("30.005").unwrap(), ratio(6001, 200));
        assert_eq!(parse("10").unwrap(), from(10));
        assert_eq!(parse(" -2.50 ").unwrap(), ratio(-5, 2));
        assert_eq!(parse("+.5").unwrap(), ratio(1, 2));
        assert_eq!(parse("5.").unwrap(), from(5));
        assert_eq!(parse("1.5e2").unwrap(), from(150));
        assert_eq!(parse("25E-2").unwrap(), ratio(1, 4));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse(""), Err(ParseMoneyError::Empty));
        assert_eq!(parse("   "), Err(ParseMoneyError::Empty));
        for token in &["abc", "1,000", "1.2.3", ".", "-", "NaN", "Infinity", "0x10", "1e", "--1"] {
            assert_eq!(
                parse(token),
                Err(ParseMoneyError::Invalid((*token).to_owned())),
                "token {:?}",
                token
            );
        }
        assert_eq!(
            parse("1e400"),
            Err(ParseMoneyError::ExponentOutOfRange("1e400".to_owned()))
        );
    }

    #[test]
    fn overflowing_exponent_is_out_of_range() {
        for token in &["1e99999999999999999999", "2E-99999999999999999999"] {
            assert_eq!(
                parse(token),
                Err(ParseMoneyError::ExponentOutOfRange((*token).to_owned()))
            );
        }
        assert_eq!(parse("1e9x"), Err(ParseMoneyError::Invalid("1e9x".to_owned())));
    }

    #[test]
    fn formats_two_decimals_half_away_from_zero() {
        assert_eq!(to_two_decimal_string(&from(1)), "1.00");
        assert_eq!(to_two_decimal_string(&parse("60.005").unwrap()), "60.01");
        assert_eq!(to_two_decimal_string(&parse("0.004").unwrap()), "0.00");
        assert_eq!(to_two_decimal_string(&parse("0.07").unwrap()), "0.07");
        assert_eq!(to_two_decimal_string(&parse("-5").unwrap()), "-5.00");
        assert_eq!(to_two_decimal_string(&parse("-0.005").unwrap()), "-0.01");
        assert_eq!(to_two_decimal_string(&parse("-0.004").unwrap()), "0.00");
        assert_eq!(to_two_decimal_string(&parse("1234567.891").unwrap()), "1234567.89");
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_to_cents(&parse("2.345").unwrap()), ratio(47, 20));
        assert_eq!(round_to_cents(&parse("-2.345").unwrap()), ratio(-47, 20));
    }

    #[test]
    fn converts_to_float() {
        assert_eq!(to_f64(&ratio(5, 2)), Some(2.5));
        assert_eq!(to_f64(&zero()), Some(0.0));
        assert_eq!(to_f64(&parse("-2.5e10").unwrap()), Some(-25_000_000_000.0));
    }

    #[test]
    fn float_conversion_refuses_lossy_values() {
        let doubled = parse("1e308").unwrap() + parse("1e308").unwrap();
        assert_eq!(to_f64(&doubled), None);
        assert_eq!(to_f64(&parse("0.5e-308").unwrap()), None);
    }
}
