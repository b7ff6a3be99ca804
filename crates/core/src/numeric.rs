//! Numeric strings and number formatting
//!
//! The language treats a string as a number when the whole string (ignoring
//! surrounding whitespace) matches the numeric literal grammar:
//!
//! ```text
//! numeric  ::= ws* sign? (digits ('.' digits?)? | '.' digits) exponent? ws*
//! exponent ::= ('e' | 'E') sign? digits
//! ws       ::= ' ' | '\t' | '\n' | '\r' | '\v' | '\f'
//! ```
//!
//! Anything else, including strings with a numeric prefix such as `"12abc"`,
//! is not numeric and converts to zero.
//!
//! Floats are printed with 14 significant digits, switching to exponent form
//! (`1.0E+25`) for very large or very small magnitudes.

use std::cmp::Ordering;

/// Significant digits used when converting a float to a string
pub const FLOAT_PRECISION: usize = 14;

/// 2^63 as f64, the first float magnitude that no longer fits in an i64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Result of numeric coercion: always an integer or a float, never anything else
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(n) => n as f64,
            Numeric::Float(f) => f,
        }
    }

    /// Integer value, truncating floats toward zero
    pub fn as_i64(self) -> i64 {
        match self {
            Numeric::Int(n) => n,
            Numeric::Float(f) => float_to_int(f),
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Numeric::Float(_))
    }

    /// Numeric ordering: int/int compares exactly, anything else as floats
    pub fn compare(self, other: Numeric) -> Ordering {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => a.cmp(&b),
            (a, b) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
        }
    }
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Parse a numeric string
///
/// Returns `None` when the bytes are not numeric as a whole. Integer-looking
/// literals that overflow `i64` are returned as floats.
pub fn parse_numeric(bytes: &[u8]) -> Option<Numeric> {
    let start = bytes.iter().position(|&b| !is_space(b))?;
    let end = bytes.iter().rposition(|&b| !is_space(b))? + 1;
    let body = &bytes[start..end];

    let mut pos = 0;
    if matches!(body.first(), Some(b'+' | b'-')) {
        pos += 1;
    }

    let int_digits = count_digits(&body[pos..]);
    pos += int_digits;

    let mut is_float = false;
    let mut frac_digits = 0;
    if body.get(pos) == Some(&b'.') {
        is_float = true;
        pos += 1;
        frac_digits = count_digits(&body[pos..]);
        pos += frac_digits;
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(body.get(pos), Some(b'e' | b'E')) {
        let mut exp_pos = pos + 1;
        if matches!(body.get(exp_pos), Some(b'+' | b'-')) {
            exp_pos += 1;
        }
        let exp_digits = count_digits(&body[exp_pos..]);
        if exp_digits == 0 {
            return None;
        }
        is_float = true;
        pos = exp_pos + exp_digits;
    }

    if pos != body.len() {
        return None;
    }

    // The grammar only admits ASCII, so this cannot fail
    let text = std::str::from_utf8(body).ok()?;
    if !is_float && let Ok(n) = text.parse::<i64>() {
        return Some(Numeric::Int(n));
    }
    text.parse::<f64>().ok().map(Numeric::Float)
}

/// Parse a canonical decimal integer: `0` or `-?[1-9][0-9]*` within i64 range
///
/// This is the stricter form used for string offsets and array keys: no
/// whitespace, no `+`, no leading zeros and no `-0`.
pub fn parse_canonical_int(bytes: &[u8]) -> Option<i64> {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    let negative = digits.len() != bytes.len();

    match digits {
        [] => None,
        [b'0'] if negative => None,
        [b'0'] => Some(0),
        [b'0', ..] => None,
        _ if digits.iter().all(u8::is_ascii_digit) => std::str::from_utf8(bytes).ok()?.parse().ok(),
        _ => None,
    }
}

/// Truncate toward zero; out-of-range values saturate and NaN becomes 0
pub fn float_to_int(value: f64) -> i64 {
    value as i64
}

/// Whether a float's magnitude is representable as an i64
pub fn float_fits_int(value: f64) -> bool {
    (-I64_BOUND..I64_BOUND).contains(&value)
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Format a float the way the language prints it
///
/// ```
/// use mixed_core::numeric::format_float;
///
/// assert_eq!(format_float(3.5), "3.5");
/// assert_eq!(format_float(0.1 + 0.2), "0.3");
/// assert_eq!(format_float(1e25), "1.0E+25");
/// assert_eq!(format_float(-0.00001), "-1.0E-5");
/// ```
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first so the exponent reflects rounding
    let scientific = format!("{:.*e}", FLOAT_PRECISION - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= FLOAT_PRECISION as i32 {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        if mantissa.contains('.') {
            format!("{}E{}{}", mantissa, sign, exponent.abs())
        } else {
            format!("{}.0E{}{}", mantissa, sign, exponent.abs())
        }
    } else {
        let decimals = (FLOAT_PRECISION as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integers() {
        assert_eq!(parse_numeric(b"42"), Some(Numeric::Int(42)));
        assert_eq!(parse_numeric(b"-17"), Some(Numeric::Int(-17)));
        assert_eq!(parse_numeric(b"+8"), Some(Numeric::Int(8)));
        assert_eq!(parse_numeric(b"007"), Some(Numeric::Int(7)));
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(parse_numeric(b"  12"), Some(Numeric::Int(12)));
        assert_eq!(parse_numeric(b"\t12\n"), Some(Numeric::Int(12)));
        assert_eq!(parse_numeric(b"   "), None);
        assert_eq!(parse_numeric(b""), None);
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(parse_numeric(b"1.5"), Some(Numeric::Float(1.5)));
        assert_eq!(parse_numeric(b".5"), Some(Numeric::Float(0.5)));
        assert_eq!(parse_numeric(b"5."), Some(Numeric::Float(5.0)));
        assert_eq!(parse_numeric(b"1e3"), Some(Numeric::Float(1000.0)));
        assert_eq!(parse_numeric(b"-2.5E-1"), Some(Numeric::Float(-0.25)));
    }

    #[test]
    fn test_parse_rejects_partial_numbers() {
        assert_eq!(parse_numeric(b"12abc"), None);
        assert_eq!(parse_numeric(b"abc"), None);
        assert_eq!(parse_numeric(b"1e"), None);
        assert_eq!(parse_numeric(b"."), None);
        assert_eq!(parse_numeric(b"-"), None);
        assert_eq!(parse_numeric(b"1 2"), None);
        assert_eq!(parse_numeric(b"0x1A"), None);
    }

    #[test]
    fn test_parse_integer_overflow_becomes_float() {
        match parse_numeric(b"99999999999999999999") {
            Some(Numeric::Float(f)) => assert_eq!(f, 1e20),
            other => panic!("Expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_int() {
        assert_eq!(parse_canonical_int(b"0"), Some(0));
        assert_eq!(parse_canonical_int(b"123"), Some(123));
        assert_eq!(parse_canonical_int(b"-5"), Some(-5));
        assert_eq!(parse_canonical_int(b"-0"), None);
        assert_eq!(parse_canonical_int(b"05"), None);
        assert_eq!(parse_canonical_int(b" 5"), None);
        assert_eq!(parse_canonical_int(b"+5"), None);
        assert_eq!(parse_canonical_int(b"1.0"), None);
        assert_eq!(parse_canonical_int(b""), None);
        assert_eq!(parse_canonical_int(b"-"), None);
        assert_eq!(parse_canonical_int(b"9223372036854775808"), None);
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(float_to_int(3.7), 3);
        assert_eq!(float_to_int(-3.7), -3);
        assert_eq!(float_to_int(f64::NAN), 0);
        assert_eq!(float_to_int(1e30), i64::MAX);
        assert_eq!(float_to_int(-1e30), i64::MIN);
    }

    #[test]
    fn test_float_fits_int() {
        assert!(float_fits_int(0.0));
        assert!(float_fits_int(-9.2e18));
        assert!(!float_fits_int(9.3e18));
        assert!(!float_fits_int(f64::NAN));
        assert!(!float_fits_int(f64::INFINITY));
    }

    #[test]
    fn test_format_float_fixed() {
        assert_eq!(format_float(3.5), "3.5");
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(-1.25), "-1.25");
        assert_eq!(format_float(0.1 + 0.2), "0.3");
        assert_eq!(format_float(1.0 / 3.0), "0.33333333333333");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(1e13), "10000000000000");
    }

    #[test]
    fn test_format_float_exponent() {
        assert_eq!(format_float(1e14), "1.0E+14");
        assert_eq!(format_float(1.5e20), "1.5E+20");
        assert_eq!(format_float(0.00001), "1.0E-5");
        assert_eq!(format_float(-2.5e-7), "-2.5E-7");
    }

    #[test]
    fn test_format_float_special() {
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(-0.0), "-0");
        assert_eq!(format_float(f64::NAN), "NAN");
        assert_eq!(format_float(f64::INFINITY), "INF");
        assert_eq!(format_float(f64::NEG_INFINITY), "-INF");
    }

    #[test]
    fn test_numeric_compare() {
        assert_eq!(Numeric::Int(1).compare(Numeric::Int(2)), Ordering::Less);
        assert_eq!(
            Numeric::Int(2).compare(Numeric::Float(1.5)),
            Ordering::Greater
        );
        assert_eq!(
            Numeric::Float(2.0).compare(Numeric::Int(2)),
            Ordering::Equal
        );
    }
}
