//! Arithmetic and mutation operators
//!
//! Binary operators are implemented on `&Value` (and forwarded for owned
//! values), compound assignment on `Value`.
//!
//! # Promotion
//!
//! - Int op Int stays Int (fast path, no coercion)
//! - otherwise both sides go through numeric coercion; any Float makes the
//!   result Float
//! - `/` yields Int only when Int / Int divides exactly
//! - `%` and the bitwise operators work on `to_int()` of both sides
//!
//! # Overflow Behavior
//!
//! Integer `+`, `-`, `*`, `++` and `--` use **wrapping semantics**:
//! - `i64::MAX + 1` wraps to `i64::MIN`
//! - `i64::MIN / -1` and `-i64::MIN` have no Int result and become Float
//!
//! # Anomalies
//!
//! Division or modulo by zero and unsupported operand types never abort:
//! a diagnostic is reported and the operator yields its fallback
//! (`false` for division, the unchanged left operand for `+` with one array).

use crate::value::Value;
use mixed_core::diagnostics::DiagnosticKind;
use mixed_core::numeric::Numeric;
use mixed_core::{RcString, runtime_warning};
use std::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Div,
    DivAssign, Mul, MulAssign, Neg, Not, Rem, RemAssign, Shl, ShlAssign, Shr, ShrAssign, Sub,
    SubAssign,
};

fn unsupported_operands(op: &str, lhs: &Value, rhs: &Value) {
    runtime_warning!(
        DiagnosticKind::UnsupportedOperand,
        "Unsupported operand types for operator {} ({} and {})",
        op,
        lhs.type_name(),
        rhs.type_name()
    );
}

fn unsupported_operand(op: &str, value: &Value) {
    runtime_warning!(
        DiagnosticKind::UnsupportedOperand,
        "Can't apply operator {} to {}",
        op,
        value.type_name()
    );
}

fn numeric_value(n: Numeric) -> Value {
    match n {
        Numeric::Int(n) => Value::Int(n),
        Numeric::Float(f) => Value::Float(f),
    }
}

fn add_numbers(a: Numeric, b: Numeric) -> Value {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => Value::Int(x.wrapping_add(y)),
        _ => Value::Float(a.as_f64() + b.as_f64()),
    }
}

fn sub_numbers(a: Numeric, b: Numeric) -> Value {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => Value::Int(x.wrapping_sub(y)),
        _ => Value::Float(a.as_f64() - b.as_f64()),
    }
}

fn mul_numbers(a: Numeric, b: Numeric) -> Value {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => Value::Int(x.wrapping_mul(y)),
        _ => Value::Float(a.as_f64() * b.as_f64()),
    }
}

fn divide(a: Numeric, b: Numeric) -> Value {
    match b {
        Numeric::Int(0) => {
            runtime_warning!(DiagnosticKind::DivisionByZero, "Integer division by zero");
            return Value::Bool(false);
        }
        Numeric::Float(f) if f == 0.0 => {
            runtime_warning!(DiagnosticKind::DivisionByZero, "Float division by zero");
            return Value::Bool(false);
        }
        _ => {}
    }

    match (a, b) {
        // The only Int / Int quotient that overflows
        (Numeric::Int(i64::MIN), Numeric::Int(-1)) => Value::Float(-(i64::MIN as f64)),
        (Numeric::Int(x), Numeric::Int(y)) if x % y == 0 => Value::Int(x / y),
        _ => Value::Float(a.as_f64() / b.as_f64()),
    }
}

fn modulo(lhs: &Value, rhs: &Value) -> Value {
    let divisor = rhs.to_int();
    if divisor == 0 {
        runtime_warning!(DiagnosticKind::DivisionByZero, "Modulo by zero");
        return Value::Bool(false);
    }
    Value::Int(lhs.to_int().wrapping_rem(divisor))
}

/// `None` for a negative count
fn shift_left(value: i64, count: i64) -> Option<i64> {
    match count {
        c if c < 0 => None,
        c if c >= 64 => Some(0),
        c => Some(value << c),
    }
}

/// Arithmetic shift; `None` for a negative count
fn shift_right(value: i64, count: i64) -> Option<i64> {
    match count {
        c if c < 0 => None,
        c if c >= 64 => Some(if value < 0 { -1 } else { 0 }),
        c => Some(value >> c),
    }
}

fn negative_shift() {
    runtime_warning!(
        DiagnosticKind::UnsupportedOperand,
        "Bit shift by negative number"
    );
}

// =============================================================================
// Binary operators
// =============================================================================

impl Add for &Value {
    type Output = Value;

    fn add(self, rhs: &Value) -> Value {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
            (Value::Array(a), Value::Array(b)) => {
                let mut merged = a.clone();
                merged.union_with(b);
                Value::Array(merged)
            }
            (Value::Array(_), _) | (_, Value::Array(_)) => {
                unsupported_operands("+", self, rhs);
                self.clone()
            }
            _ => add_numbers(self.to_number(), rhs.to_number()),
        }
    }
}

impl Sub for &Value {
    type Output = Value;

    fn sub(self, rhs: &Value) -> Value {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
            _ => sub_numbers(self.to_number(), rhs.to_number()),
        }
    }
}

impl Mul for &Value {
    type Output = Value;

    fn mul(self, rhs: &Value) -> Value {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
            _ => mul_numbers(self.to_number(), rhs.to_number()),
        }
    }
}

impl Div for &Value {
    type Output = Value;

    fn div(self, rhs: &Value) -> Value {
        divide(self.to_number(), rhs.to_number())
    }
}

impl Rem for &Value {
    type Output = Value;

    fn rem(self, rhs: &Value) -> Value {
        modulo(self, rhs)
    }
}

impl BitAnd for &Value {
    type Output = i64;

    fn bitand(self, rhs: &Value) -> i64 {
        self.to_int() & rhs.to_int()
    }
}

impl BitOr for &Value {
    type Output = i64;

    fn bitor(self, rhs: &Value) -> i64 {
        self.to_int() | rhs.to_int()
    }
}

impl BitXor for &Value {
    type Output = i64;

    fn bitxor(self, rhs: &Value) -> i64 {
        self.to_int() ^ rhs.to_int()
    }
}

impl Shl for &Value {
    type Output = i64;

    fn shl(self, rhs: &Value) -> i64 {
        shift_left(self.to_int(), rhs.to_int()).unwrap_or_else(|| {
            negative_shift();
            0
        })
    }
}

impl Shr for &Value {
    type Output = i64;

    fn shr(self, rhs: &Value) -> i64 {
        shift_right(self.to_int(), rhs.to_int()).unwrap_or_else(|| {
            negative_shift();
            0
        })
    }
}

// Owned operands borrow and delegate
macro_rules! forward_owned_binary {
    ($($imp:ident $method:ident -> $out:ty),* $(,)?) => {$(
        impl $imp for Value {
            type Output = $out;

            fn $method(self, rhs: Value) -> $out {
                $imp::$method(&self, &rhs)
            }
        }
    )*};
}

forward_owned_binary! {
    Add add -> Value,
    Sub sub -> Value,
    Mul mul -> Value,
    Div div -> Value,
    Rem rem -> Value,
    BitAnd bitand -> i64,
    BitOr bitor -> i64,
    BitXor bitxor -> i64,
    Shl shl -> i64,
    Shr shr -> i64,
}

// =============================================================================
// Compound assignment
// =============================================================================

impl AddAssign<&Value> for Value {
    fn add_assign(&mut self, rhs: &Value) {
        if let Value::Array(a) = self
            && let Value::Array(b) = rhs
        {
            a.union_with(b);
            return;
        }
        if self.is_array() || rhs.is_array() {
            unsupported_operands("+=", self, rhs);
            return;
        }
        *self = &*self + rhs;
    }
}

impl SubAssign<&Value> for Value {
    fn sub_assign(&mut self, rhs: &Value) {
        if let Value::Int(a) = self
            && let Value::Int(b) = rhs
        {
            *a = a.wrapping_sub(*b);
            return;
        }
        *self = sub_numbers(self.to_number(), rhs.to_number());
    }
}

impl MulAssign<&Value> for Value {
    fn mul_assign(&mut self, rhs: &Value) {
        if let Value::Int(a) = self
            && let Value::Int(b) = rhs
        {
            *a = a.wrapping_mul(*b);
            return;
        }
        *self = mul_numbers(self.to_number(), rhs.to_number());
    }
}

impl DivAssign<&Value> for Value {
    fn div_assign(&mut self, rhs: &Value) {
        *self = divide(self.to_number(), rhs.to_number());
    }
}

impl RemAssign<&Value> for Value {
    fn rem_assign(&mut self, rhs: &Value) {
        *self = modulo(self, rhs);
    }
}

impl BitAndAssign<&Value> for Value {
    fn bitand_assign(&mut self, rhs: &Value) {
        *self = Value::Int(&*self & rhs);
    }
}

impl BitOrAssign<&Value> for Value {
    fn bitor_assign(&mut self, rhs: &Value) {
        *self = Value::Int(&*self | rhs);
    }
}

impl BitXorAssign<&Value> for Value {
    fn bitxor_assign(&mut self, rhs: &Value) {
        *self = Value::Int(&*self ^ rhs);
    }
}

impl ShlAssign<&Value> for Value {
    fn shl_assign(&mut self, rhs: &Value) {
        *self = match shift_left(self.to_int(), rhs.to_int()) {
            Some(n) => Value::Int(n),
            None => {
                negative_shift();
                Value::Bool(false)
            }
        };
    }
}

impl ShrAssign<&Value> for Value {
    fn shr_assign(&mut self, rhs: &Value) {
        *self = match shift_right(self.to_int(), rhs.to_int()) {
            Some(n) => Value::Int(n),
            None => {
                negative_shift();
                Value::Bool(false)
            }
        };
    }
}

macro_rules! forward_owned_assign {
    ($($imp:ident $method:ident),* $(,)?) => {$(
        impl $imp<Value> for Value {
            fn $method(&mut self, rhs: Value) {
                $imp::$method(self, &rhs)
            }
        }
    )*};
}

forward_owned_assign! {
    AddAssign add_assign,
    SubAssign sub_assign,
    MulAssign mul_assign,
    DivAssign div_assign,
    RemAssign rem_assign,
    BitAndAssign bitand_assign,
    BitOrAssign bitor_assign,
    BitXorAssign bitxor_assign,
    ShlAssign shl_assign,
    ShrAssign shr_assign,
}

// =============================================================================
// Unary operators
// =============================================================================

impl Neg for &Value {
    type Output = Value;

    fn neg(self) -> Value {
        match self.to_number() {
            Numeric::Int(i64::MIN) => Value::Float(-(i64::MIN as f64)),
            Numeric::Int(n) => Value::Int(-n),
            Numeric::Float(f) => Value::Float(-f),
        }
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        -&self
    }
}

/// Logical not: `!to_bool()`
impl Not for &Value {
    type Output = bool;

    fn not(self) -> bool {
        !self.to_bool()
    }
}

impl Not for Value {
    type Output = bool;

    fn not(self) -> bool {
        !self.to_bool()
    }
}

impl Value {
    /// Unary plus: numeric coercion
    pub fn plus(&self) -> Value {
        numeric_value(self.to_number())
    }

    /// Bitwise not of `to_int()`
    pub fn bit_not(&self) -> i64 {
        !self.to_int()
    }

    /// String concatenation in place (`.=`)
    pub fn append(&mut self, s: &RcString) -> &mut Self {
        self.convert_to_string();
        if let Value::String(own) = self {
            own.append(s.as_bytes());
        }
        self
    }

    pub fn append_value(&mut self, v: &Value) -> &mut Self {
        self.append(&v.to_rc_string())
    }

    // =========================================================================
    // Increment / decrement
    // =========================================================================

    /// Strings become numeric first, then follow the Int/Float rule
    fn step(&mut self, op: &str, delta: i64) {
        if self.is_string() {
            self.convert_to_numeric();
        }
        match self {
            Value::Int(n) => *n = n.wrapping_add(delta),
            Value::Float(f) => *f += delta as f64,
            Value::Null if delta > 0 => *self = Value::Int(1),
            _ => unsupported_operand(op, self),
        }
    }

    pub fn pre_inc(&mut self) -> &mut Self {
        self.step("++", 1);
        self
    }

    pub fn pre_dec(&mut self) -> &mut Self {
        self.step("--", -1);
        self
    }

    /// Increment and return the value from before
    pub fn post_inc(&mut self) -> Value {
        let before = self.clone();
        self.step("++", 1);
        before
    }

    pub fn post_dec(&mut self) -> Value {
        let before = self.clone();
        self.step("--", -1);
        before
    }
}
