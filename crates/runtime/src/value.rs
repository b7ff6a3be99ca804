use crate::error::ValueError;
use mixed_core::{RcArray, RcString};
use std::fmt;

/// Placeholder type the compiler uses for values it could not type
///
/// It must never reach the runtime; converting one into a `Value` panics.
#[derive(Debug, Clone, Copy)]
pub struct Unknown;

/// The language-level type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
}

impl ValueType {
    /// Type name as the language prints it in messages
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "NULL",
            ValueType::Bool => "boolean",
            ValueType::Int => "integer",
            ValueType::Float => "double",
            ValueType::String => "string",
            ValueType::Array => "array",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value: the universal dynamic value
///
/// Scalars live inline. Strings and arrays are one-word copy-on-write
/// handles, so cloning a value never copies string bytes or array entries.
///
/// # Memory Layout
///
/// Using `#[repr(C)]` ensures a predictable C-compatible layout:
/// - Discriminant (tag) at offset 0
/// - Payload at offset 8, always one word wide
///
/// Generated code only reads the tag and the inline scalar payloads
/// directly; everything else goes through the `mixed_*` entry points.
#[repr(C)]
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,

    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// IEEE 754 double precision
    Float(f64),

    /// Byte string (copy-on-write)
    String(RcString),

    /// Ordered map from integer/string keys to values (copy-on-write)
    Array(RcArray<Value>),
}

// Every payload is one word: the tag plus one slot is the whole value
const _: () = {
    assert!(std::mem::size_of::<RcString>() == std::mem::size_of::<f64>());
    assert!(std::mem::size_of::<RcArray<Value>>() == std::mem::size_of::<f64>());
};

/// Reference count reported for scalar tags, which have no shared storage
const NULL_REF_COUNT: i32 = -1;
const BOOL_REF_COUNT: i32 = -2;
const INT_REF_COUNT: i32 = -3;
const FLOAT_REF_COUNT: i32 = -4;

impl Value {
    pub fn new() -> Self {
        Value::Null
    }

    pub fn empty_array() -> Self {
        Value::Array(RcArray::new())
    }

    /// Move the value out, leaving Null behind
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    /// Reset to Null, releasing any payload. Idempotent.
    pub fn clear(&mut self) {
        *self = Value::Null;
    }

    pub fn swap(&mut self, other: &mut Value) {
        std::mem::swap(self, other);
    }

    // =========================================================================
    // Type predicates
    // =========================================================================

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Int or Float (numeric strings are not numeric values)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    // =========================================================================
    // Unchecked accessors (no coercion, no diagnostics)
    // =========================================================================

    pub fn as_bool_opt(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int_opt(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float_opt(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str_opt(&self) -> Option<&RcString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array_opt(&self) -> Option<&RcArray<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bool_mut(&mut self) -> Option<&mut bool> {
        match self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int_mut(&mut self) -> Option<&mut i64> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float_mut(&mut self) -> Option<&mut f64> {
        match self {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str_mut(&mut self) -> Option<&mut RcString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut RcArray<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Sharing count of the payload
    ///
    /// Strings and arrays report their handle count (`CONST_REF_COUNT` when
    /// constant). Scalars report a negative per-tag sentinel.
    pub fn reference_count(&self) -> i32 {
        match self {
            Value::Null => NULL_REF_COUNT,
            Value::Bool(_) => BOOL_REF_COUNT,
            Value::Int(_) => INT_REF_COUNT,
            Value::Float(_) => FLOAT_REF_COUNT,
            Value::String(s) => s.reference_count(),
            Value::Array(a) => a.reference_count(),
        }
    }

    /// Mark the payload (and, for arrays, every nested payload) constant
    pub fn mark_constant(&self) {
        match self {
            Value::String(s) => s.mark_constant(),
            Value::Array(a) => {
                a.mark_constant();
                for v in a.values() {
                    v.mark_constant();
                }
            }
            _ => {}
        }
    }

    /// Heap bytes owned through this value; 0 for scalars
    pub fn estimate_memory_usage(&self) -> usize {
        match self {
            Value::String(s) => s.estimate_memory_usage(),
            Value::Array(a) => {
                a.estimate_memory_usage()
                    + a.values().map(Value::estimate_memory_usage).sum::<usize>()
            }
            _ => 0,
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

impl From<Unknown> for Value {
    fn from(_: Unknown) -> Self {
        panic!("Unknown placeholder reached the runtime");
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(RcString::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(RcString::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::String(RcString::from_bytes(bytes))
    }
}

impl From<RcString> for Value {
    fn from(s: RcString) -> Self {
        Value::String(s)
    }
}

impl From<RcArray<Value>> for Value {
    fn from(a: RcArray<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        values.into_iter().collect()
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Collects into an array with keys 0, 1, 2, ...
impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

// =============================================================================
// Strict extraction at native boundaries (no coercion)
// =============================================================================

impl TryFrom<&Value> for bool {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value
            .as_bool_opt()
            .ok_or_else(|| ValueError::mismatch(ValueType::Bool, value))
    }
}

impl TryFrom<&Value> for i64 {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value
            .as_int_opt()
            .ok_or_else(|| ValueError::mismatch(ValueType::Int, value))
    }
}

impl TryFrom<&Value> for f64 {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value
            .as_float_opt()
            .ok_or_else(|| ValueError::mismatch(ValueType::Float, value))
    }
}

impl TryFrom<&Value> for RcString {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value
            .as_str_opt()
            .cloned()
            .ok_or_else(|| ValueError::mismatch(ValueType::String, value))
    }
}

impl TryFrom<&Value> for RcArray<Value> {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value
            .as_array_opt()
            .cloned()
            .ok_or_else(|| ValueError::mismatch(ValueType::Array, value))
    }
}
