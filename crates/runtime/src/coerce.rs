//! Coercion engine
//!
//! Every conversion here is total: any value converts to any target type.
//! Conversions the language considers suspicious (an array used as a
//! number or as text) still produce a result, and report a `Conversion`
//! diagnostic on the way.
//!
//! | from   | bool       | int            | float     | string    | numeric      |
//! |--------|------------|----------------|-----------|-----------|--------------|
//! | Null   | false      | 0              | 0.0       | ""        | Int 0        |
//! | Bool   | b          | 0/1            | 0.0/1.0   | ""/"1"    | Int 0/1      |
//! | Int    | n != 0     | n              | n         | decimal   | Int n        |
//! | Float  | f != 0.0   | truncated      | f         | 14 digits | Float f      |
//! | String | not ""/"0" | grammar        | grammar   | itself    | per grammar  |
//! | Array  | non-empty  | count (warns)  | count (w) | "Array" (w) | count (w) |
//!
//! "grammar" means the whole string must be numeric; anything else is 0.
//!
//! Checked accessors (`expect_*`) are for call sites that require one type.
//! The read forms hand back the value or an owned empty default; the
//! mutable forms widen lenient source types in place first and return
//! `None` when the value still has the wrong type. Mismatches are reported
//! as `ExpectedType` diagnostics.

use crate::value::Value;
use mixed_core::diagnostics::{DiagnosticKind, Severity, report};
use mixed_core::numeric::{self, Numeric};
use mixed_core::{RcArray, RcString, runtime_warning};
use std::borrow::Cow;
use std::fmt;

fn array_conversion(target: &str) {
    runtime_warning!(
        DiagnosticKind::Conversion,
        "Wrong conversion from array to {}",
        target
    );
}

impl Value {
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => s.to_bool(),
            Value::Array(a) => a.to_bool(),
        }
    }

    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(n) => *n,
            Value::Float(f) => numeric::float_to_int(*f),
            Value::String(s) => s.to_int(),
            Value::Array(a) => {
                array_conversion("int");
                a.to_int()
            }
        }
    }

    pub fn to_float(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(n) => *n as f64,
            Value::Float(f) => *f,
            Value::String(s) => s.to_float(),
            Value::Array(a) => {
                array_conversion("float");
                a.to_float()
            }
        }
    }

    /// Numeric coercion as a typed pair: always Int or Float
    pub fn to_number(&self) -> Numeric {
        match self {
            Value::Null => Numeric::Int(0),
            Value::Bool(b) => Numeric::Int(i64::from(*b)),
            Value::Int(n) => Numeric::Int(*n),
            Value::Float(f) => Numeric::Float(*f),
            Value::String(s) => s.to_numeric(),
            Value::Array(a) => {
                array_conversion("number");
                Numeric::Int(a.to_int())
            }
        }
    }

    /// Numeric coercion; the result is always `Int` or `Float`
    pub fn to_numeric(&self) -> Value {
        match self.to_number() {
            Numeric::Int(n) => Value::Int(n),
            Numeric::Float(f) => Value::Float(f),
        }
    }

    /// String form of the value
    ///
    /// Named `to_rc_string` because `to_string` comes from `Display`.
    pub fn to_rc_string(&self) -> RcString {
        match self {
            Value::Null | Value::Bool(false) => RcString::new(),
            Value::Bool(true) => RcString::from("1"),
            Value::Int(n) => RcString::from(n.to_string()),
            Value::Float(f) => RcString::from(numeric::format_float(*f)),
            Value::String(s) => s.clone(),
            Value::Array(_) => {
                array_conversion("string");
                RcString::from("Array")
            }
        }
    }

    /// Array form: arrays as themselves, Null as empty, scalars wrapped
    pub fn to_array(&self) -> RcArray<Value> {
        match self {
            Value::Null => RcArray::new(),
            Value::Array(a) => a.clone(),
            scalar => std::iter::once(scalar.clone()).collect(),
        }
    }

    /// Integer conversion that reports floats outside the i64 range
    pub fn safe_to_int(&self) -> i64 {
        match self {
            Value::Float(f) => {
                if !numeric::float_fits_int(*f) {
                    report(
                        Severity::Warning,
                        DiagnosticKind::Conversion,
                        format!("Wrong conversion from double {:.6} to int", f),
                    );
                }
                numeric::float_to_int(*f)
            }
            Value::String(s) => s.safe_to_int(),
            other => other.to_int(),
        }
    }

    // =========================================================================
    // In-place conversions
    // =========================================================================

    pub fn convert_to_numeric(&mut self) -> &mut Self {
        if !self.is_numeric() {
            *self = self.to_numeric();
        }
        self
    }

    pub fn convert_to_bool(&mut self) -> &mut Self {
        if !self.is_bool() {
            *self = Value::Bool(self.to_bool());
        }
        self
    }

    pub fn convert_to_int(&mut self) -> &mut Self {
        if !self.is_int() {
            *self = Value::Int(self.to_int());
        }
        self
    }

    pub fn convert_to_float(&mut self) -> &mut Self {
        if !self.is_float() {
            *self = Value::Float(self.to_float());
        }
        self
    }

    pub fn convert_to_string(&mut self) -> &mut Self {
        if !self.is_string() {
            *self = Value::String(self.to_rc_string());
        }
        self
    }

    pub fn safe_convert_to_int(&mut self) -> &mut Self {
        if !self.is_int() {
            *self = Value::Int(self.safe_to_int());
        }
        self
    }

    // =========================================================================
    // Checked accessors
    // =========================================================================

    fn expected(&self, function: &str, expected: &str) {
        report(
            Severity::Warning,
            DiagnosticKind::ExpectedType,
            format!(
                "{}() expects parameter to be {}, {} is given",
                function,
                expected,
                self.type_name()
            ),
        );
    }

    pub fn expect_bool(&self, function: &str) -> bool {
        match self {
            Value::Bool(b) => *b,
            _ => {
                self.expected(function, "boolean");
                false
            }
        }
    }

    pub fn expect_int(&self, function: &str) -> i64 {
        match self {
            Value::Int(n) => *n,
            _ => {
                self.expected(function, "int");
                0
            }
        }
    }

    pub fn expect_float(&self, function: &str) -> f64 {
        match self {
            Value::Float(f) => *f,
            _ => {
                self.expected(function, "float");
                0.0
            }
        }
    }

    pub fn expect_string(&self, function: &str) -> Cow<'_, RcString> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            _ => {
                self.expected(function, "string");
                Cow::Owned(RcString::new())
            }
        }
    }

    pub fn expect_array(&self, function: &str) -> Cow<'_, RcArray<Value>> {
        match self {
            Value::Array(a) => Cow::Borrowed(a),
            _ => {
                self.expected(function, "array");
                Cow::Owned(RcArray::new())
            }
        }
    }

    /// Null widens to `false`
    pub fn expect_bool_mut(&mut self, function: &str) -> Option<&mut bool> {
        if self.is_null() {
            self.convert_to_bool();
        }
        if !self.is_bool() {
            self.expected(function, "boolean");
        }
        self.as_bool_mut()
    }

    /// Null, Bool, Float and String widen to Int
    pub fn expect_int_mut(&mut self, function: &str) -> Option<&mut i64> {
        if matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Float(_) | Value::String(_)
        ) {
            self.convert_to_int();
        }
        if !self.is_int() {
            self.expected(function, "int");
        }
        self.as_int_mut()
    }

    /// Null, Bool, Int and String widen to Float
    pub fn expect_float_mut(&mut self, function: &str) -> Option<&mut f64> {
        if matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::String(_)
        ) {
            self.convert_to_float();
        }
        if !self.is_float() {
            self.expected(function, "float");
        }
        self.as_float_mut()
    }

    /// Null, Bool, Int and Float widen to String
    pub fn expect_string_mut(&mut self, function: &str) -> Option<&mut RcString> {
        if matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_)
        ) {
            self.convert_to_string();
        }
        if !self.is_string() {
            self.expected(function, "string");
        }
        self.as_str_mut()
    }

    /// Null widens to an empty array
    pub fn expect_array_mut(&mut self, function: &str) -> Option<&mut RcArray<Value>> {
        if self.is_null() {
            *self = Value::empty_array();
        }
        if !self.is_array() {
            self.expected(function, "array");
        }
        self.as_array_mut()
    }

    // =========================================================================
    // Stream output
    // =========================================================================

    /// Write the string form to `out`
    pub fn write_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Value::Null | Value::Bool(false) => Ok(()),
            Value::Bool(true) => out.write_str("1"),
            Value::Int(n) => write!(out, "{}", n),
            Value::Float(f) => out.write_str(&numeric::format_float(*f)),
            Value::String(s) => out.write_str(&s.to_str_lossy()),
            Value::Array(_) => {
                array_conversion("string");
                out.write_str("Array")
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixed_core::ArrayKey;
    use mixed_core::diagnostics::{take_last_diagnostic, thread_diagnostic_count};

    fn array_of(values: Vec<Value>) -> Value {
        Value::from(values)
    }

    #[test]
    fn test_to_bool_table() {
        assert!(!Value::Null.to_bool());
        assert!(Value::Bool(true).to_bool());
        assert!(!Value::Int(0).to_bool());
        assert!(Value::Int(-1).to_bool());
        assert!(!Value::Float(0.0).to_bool());
        assert!(Value::Float(0.5).to_bool());
        assert!(!Value::from("0").to_bool());
        assert!(Value::from("0.0").to_bool());
        assert!(!Value::empty_array().to_bool());
        assert!(array_of(vec![Value::Null]).to_bool());
    }

    #[test]
    fn test_to_int_table() {
        assert_eq!(Value::Null.to_int(), 0);
        assert_eq!(Value::Bool(true).to_int(), 1);
        assert_eq!(Value::Float(-3.9).to_int(), -3);
        assert_eq!(Value::Float(f64::NAN).to_int(), 0);
        assert_eq!(Value::from(" 42 ").to_int(), 42);
        assert_eq!(Value::from("4e2").to_int(), 400);
        assert_eq!(Value::from("12abc").to_int(), 0);
    }

    #[test]
    fn test_array_to_int_warns_and_counts() {
        let before = thread_diagnostic_count();
        let v = array_of(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(v.to_int(), 2);
        assert_eq!(thread_diagnostic_count(), before + 1);
        let d = take_last_diagnostic().unwrap();
        assert_eq!(d.kind, DiagnosticKind::Conversion);
        assert_eq!(d.message, "Wrong conversion from array to int");
    }

    #[test]
    fn test_to_float_table() {
        assert_eq!(Value::Bool(true).to_float(), 1.0);
        assert_eq!(Value::Int(3).to_float(), 3.0);
        assert_eq!(Value::from(".5").to_float(), 0.5);
        assert_eq!(Value::from("x").to_float(), 0.0);
    }

    #[test]
    fn test_to_numeric_is_never_string() {
        for s in ["", "0", "12", "1.5", "1e3", "abc", " 7 ", "9999999999999999999999"] {
            let n = Value::from(s).to_numeric();
            assert!(n.is_numeric(), "to_numeric({:?}) gave {:?}", s, n);
        }
        assert_eq!(Value::from("12").to_numeric(), Value::Int(12));
        assert_eq!(Value::from("1.5").to_numeric(), Value::Float(1.5));
        assert_eq!(Value::Bool(true).to_numeric(), Value::Int(1));
        assert_eq!(Value::Null.to_numeric(), Value::Int(0));
    }

    #[test]
    fn test_to_string_forms() {
        assert_eq!(Value::Null.to_rc_string(), RcString::new());
        assert_eq!(Value::Bool(true).to_rc_string(), RcString::from("1"));
        assert_eq!(Value::Bool(false).to_rc_string(), RcString::new());
        assert_eq!(Value::Int(-12).to_rc_string(), RcString::from("-12"));
        assert_eq!(Value::Float(1.5).to_rc_string(), RcString::from("1.5"));
        assert_eq!(Value::Float(1e25).to_rc_string(), RcString::from("1.0E+25"));
    }

    #[test]
    fn test_array_to_string_warns() {
        let before = thread_diagnostic_count();
        assert_eq!(Value::empty_array().to_rc_string(), RcString::from("Array"));
        assert_eq!(thread_diagnostic_count(), before + 1);
    }

    #[test]
    fn test_int_string_round_trip() {
        for n in [0, 1, -1, 42, i64::MAX, i64::MIN] {
            let s = Value::Int(n).to_rc_string();
            assert_eq!(Value::from(s).to_int(), n);
        }
    }

    #[test]
    fn test_float_string_round_trip() {
        for f in [0.5, -2.25, 1.0 / 3.0, 123456.789, 6.02e23, 1.5e-9] {
            let back = Value::Float(f).to_rc_string().to_float();
            let tolerance = f.abs() * 1e-13;
            assert!((back - f).abs() <= tolerance, "{} came back as {}", f, back);
        }
    }

    #[test]
    fn test_to_array() {
        assert!(Value::Null.to_array().is_empty());
        let wrapped = Value::Int(7).to_array();
        assert_eq!(wrapped.get(&ArrayKey::Int(0)), Some(&Value::Int(7)));
        let original = array_of(vec![Value::Int(1)]);
        let same = original.to_array();
        assert!(same.ptr_eq(original.as_array_opt().unwrap()));
    }

    #[test]
    fn test_safe_to_int() {
        let before = thread_diagnostic_count();
        assert_eq!(Value::Float(12.7).safe_to_int(), 12);
        assert_eq!(thread_diagnostic_count(), before);

        assert_eq!(Value::Float(1e20).safe_to_int(), i64::MAX);
        let d = take_last_diagnostic().unwrap();
        assert_eq!(
            d.message,
            "Wrong conversion from double 100000000000000000000.000000 to int"
        );

        assert_eq!(Value::from("-1e19").safe_to_int(), i64::MIN);
        assert_eq!(thread_diagnostic_count(), before + 2);
    }

    #[test]
    fn test_convert_in_place() {
        let mut v = Value::from("2.5");
        v.convert_to_numeric();
        assert_eq!(v, Value::Float(2.5));
        v.convert_to_int();
        assert_eq!(v, Value::Int(2));
        v.convert_to_string();
        assert_eq!(v, Value::from("2"));
        v.convert_to_float();
        assert_eq!(v, Value::Float(2.0));

        let mut big = Value::Float(-1e30);
        big.safe_convert_to_int();
        assert_eq!(big, Value::Int(i64::MIN));
    }

    #[test]
    fn test_convert_to_bool_idempotent() {
        let samples = vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(0),
            Value::Float(2.0),
            Value::from("0"),
            Value::from("x"),
            Value::empty_array(),
            array_of(vec![Value::Null]),
        ];
        for sample in samples {
            let mut once = sample.clone();
            once.convert_to_bool();
            let mut twice = once.clone();
            twice.convert_to_bool();
            assert_eq!(once, twice, "convert_to_bool not idempotent for {:?}", sample);
            assert_eq!(once, Value::Bool(sample.to_bool()));
        }
    }

    #[test]
    fn test_expect_read_forms() {
        let before = thread_diagnostic_count();
        assert_eq!(Value::Int(5).expect_int("f"), 5);
        assert_eq!(Value::from("x").expect_string("f").as_bytes(), b"x");
        assert_eq!(thread_diagnostic_count(), before);

        assert_eq!(Value::from("5").expect_int("intval"), 0);
        let d = take_last_diagnostic().unwrap();
        assert_eq!(d.kind, DiagnosticKind::ExpectedType);
        assert_eq!(d.message, "intval() expects parameter to be int, string is given");

        assert!(!Value::Int(1).expect_bool("f"));
        assert_eq!(Value::Null.expect_float("f"), 0.0);
        assert!(Value::Int(1).expect_array("f").is_empty());
        assert!(Value::Int(1).expect_string("f").is_empty());
        assert_eq!(thread_diagnostic_count(), before + 5);
    }

    #[test]
    fn test_expect_defaults_are_not_shared() {
        let a = Value::Null;
        let mut first = a.expect_array("f").into_owned();
        first.push(Value::Int(1));
        assert!(a.expect_array("f").is_empty());
    }

    #[test]
    fn test_expect_mut_widens() {
        let mut v = Value::from("41");
        *v.expect_int_mut("inc").unwrap() += 1;
        assert_eq!(v, Value::Int(42));

        let mut f = Value::Int(2);
        *f.expect_float_mut("half").unwrap() /= 4.0;
        assert_eq!(f, Value::Float(0.5));

        let mut s = Value::Float(1.5);
        s.expect_string_mut("cat").unwrap().append(b"x");
        assert_eq!(s, Value::from("1.5x"));

        let mut n = Value::Null;
        assert!(!*n.expect_bool_mut("flag").unwrap());
        let mut a = Value::Null;
        a.expect_array_mut("push").unwrap().push(Value::Int(1));
        assert_eq!(a.as_array_opt().map(|a| a.len()), Some(1));
    }

    #[test]
    fn test_expect_mut_mismatch() {
        let before = thread_diagnostic_count();
        let mut arr = Value::empty_array();
        assert!(arr.expect_int_mut("f").is_none());
        assert!(arr.is_array());

        let mut b = Value::Int(1);
        assert!(b.expect_bool_mut("f").is_none());
        assert_eq!(b, Value::Int(1));

        let mut s = Value::from("s");
        assert!(s.expect_array_mut("f").is_none());
        assert_eq!(thread_diagnostic_count(), before + 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(true).to_string(), "1");
        assert_eq!(Value::Bool(false).to_string(), "");
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::Float(0.1 + 0.2).to_string(), "0.3");
        assert_eq!(Value::from("hi").to_string(), "hi");

        let before = thread_diagnostic_count();
        assert_eq!(Value::empty_array().to_string(), "Array");
        assert_eq!(thread_diagnostic_count(), before + 1);
    }

    #[test]
    fn test_write_to() {
        let mut out = String::new();
        Value::Int(1).write_to(&mut out).unwrap();
        Value::from("-").write_to(&mut out).unwrap();
        Value::Float(2.5).write_to(&mut out).unwrap();
        assert_eq!(out, "1-2.5");
    }
}
