//! Container emulation: every value can be indexed
//!
//! - Arrays are real containers.
//! - Null and `false` read as empty and turn into an empty array on the
//!   first write (auto-vivification).
//! - Strings support byte offsets: reads yield one-byte strings, writes
//!   overwrite one byte and pad with spaces when writing past the end.
//! - Every other value reports a `NotAnArray` diagnostic and the operation
//!   falls back (Null, `false`, no-op or empty iteration).
//!
//! Keys are normalized through [`IntoKey`]: floats truncate, booleans are
//! 0/1, Null is the empty string, and numeric-looking strings such as `"5"`
//! are the integer key 5. An array used as a key is an illegal offset.

use crate::value::Value;
use mixed_core::diagnostics::DiagnosticKind;
use mixed_core::numeric::float_to_int;
use mixed_core::{ArrayKey, MAX_STRING_LEN, RcString, runtime_warning};

/// Anything usable as an array key or string offset
pub trait IntoKey {
    /// The normalized key, or `None` after a diagnostic when the value
    /// cannot be a key at all
    fn into_key(self) -> Option<ArrayKey>;
}

impl IntoKey for i64 {
    fn into_key(self) -> Option<ArrayKey> {
        Some(ArrayKey::Int(self))
    }
}

impl IntoKey for i32 {
    fn into_key(self) -> Option<ArrayKey> {
        Some(ArrayKey::Int(i64::from(self)))
    }
}

impl IntoKey for bool {
    fn into_key(self) -> Option<ArrayKey> {
        Some(ArrayKey::Int(i64::from(self)))
    }
}

impl IntoKey for &str {
    fn into_key(self) -> Option<ArrayKey> {
        Some(ArrayKey::from_bytes(self.as_bytes()))
    }
}

impl IntoKey for &RcString {
    fn into_key(self) -> Option<ArrayKey> {
        Some(ArrayKey::from_string(self))
    }
}

impl IntoKey for RcString {
    fn into_key(self) -> Option<ArrayKey> {
        Some(ArrayKey::from_string(&self))
    }
}

impl IntoKey for ArrayKey {
    fn into_key(self) -> Option<ArrayKey> {
        Some(self)
    }
}

impl IntoKey for &ArrayKey {
    fn into_key(self) -> Option<ArrayKey> {
        Some(self.clone())
    }
}

impl IntoKey for &Value {
    fn into_key(self) -> Option<ArrayKey> {
        match self {
            Value::Null => Some(ArrayKey::Str(RcString::new())),
            Value::Bool(b) => Some(ArrayKey::Int(i64::from(*b))),
            Value::Int(n) => Some(ArrayKey::Int(*n)),
            Value::Float(f) => Some(ArrayKey::Int(float_to_int(*f))),
            Value::String(s) => Some(ArrayKey::from_string(s)),
            Value::Array(_) => {
                runtime_warning!(DiagnosticKind::IllegalOffset, "Illegal offset type array");
                None
            }
        }
    }
}

impl IntoKey for Value {
    fn into_key(self) -> Option<ArrayKey> {
        (&self).into_key()
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Message text for a non-array value
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Array(_) => "Array".to_string(),
        other => other.to_rc_string().to_string(),
    }
}

fn not_an_array(target: &Value, key: &ArrayKey) {
    runtime_warning!(
        DiagnosticKind::NotAnArray,
        "Cannot use a value \"{}\" of type {} as an array, index = {}",
        scalar_text(target),
        target.type_name(),
        key
    );
}

fn illegal_string_offset(key: &RcString) {
    runtime_warning!(
        DiagnosticKind::IllegalOffset,
        "\"{}\" is illegal offset for string",
        key
    );
}

/// Integer offset for a string target; string keys are diagnosed and
/// converted
fn string_offset(key: &ArrayKey) -> i64 {
    match key {
        ArrayKey::Int(n) => *n,
        ArrayKey::Str(s) => {
            illegal_string_offset(s);
            s.to_int()
        }
    }
}

fn write_string_offset(target: &mut RcString, key: &ArrayKey, value: &Value) {
    let offset = match key {
        ArrayKey::Int(n) => *n,
        ArrayKey::Str(s) => {
            illegal_string_offset(s);
            return;
        }
    };
    let Ok(index) = usize::try_from(offset) else {
        runtime_warning!(
            DiagnosticKind::IllegalOffset,
            "Illegal string offset {}",
            offset
        );
        return;
    };
    let Some(byte) = value.to_rc_string().byte_at(0) else {
        runtime_warning!(
            DiagnosticKind::IllegalOffset,
            "Cannot assign an empty string to a string offset"
        );
        return;
    };

    if index >= MAX_STRING_LEN {
        runtime_warning!(
            DiagnosticKind::IllegalOffset,
            "Illegal string offset {}",
            offset
        );
        return;
    }

    if index < target.len() {
        target.set_byte(index, byte);
    } else {
        target.append_repeated(b' ', index - target.len());
        target.append(&[byte]);
    }
}

fn is_vivifiable(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

impl Value {
    /// Read `self[key]`
    pub fn get_value<K: IntoKey>(&self, key: K) -> Value {
        let Some(key) = key.into_key() else {
            return Value::Null;
        };
        if is_vivifiable(self) {
            return Value::Null;
        }
        match self {
            Value::Array(a) => a.get(&key).cloned().unwrap_or_default(),
            Value::String(s) => {
                let byte = usize::try_from(string_offset(&key))
                    .ok()
                    .and_then(|i| s.byte_at(i));
                match byte {
                    Some(b) => Value::from(vec![b]),
                    None => Value::String(RcString::new()),
                }
            }
            other => {
                not_an_array(other, &key);
                Value::Null
            }
        }
    }

    /// `self[key] = value`
    pub fn set_value<K: IntoKey, V: Into<Value>>(&mut self, key: K, value: V) {
        let Some(key) = key.into_key() else {
            return;
        };
        if is_vivifiable(self) {
            *self = Value::empty_array();
        }
        match self {
            Value::Array(a) => a.set(key, value.into()),
            Value::String(s) => write_string_offset(s, &key, &value.into()),
            other => not_an_array(other, &key),
        }
    }

    /// `self[key]` as an lvalue: the slot, created as Null when missing
    pub fn index_mut<K: IntoKey>(&mut self, key: K) -> Option<&mut Value> {
        let key = key.into_key()?;
        if is_vivifiable(self) {
            *self = Value::empty_array();
        }
        match self {
            Value::Array(a) => Some(a.entry_or_default(key)),
            Value::String(_) => {
                runtime_warning!(
                    DiagnosticKind::NotAnArray,
                    "Writing to string by offset isn't supported"
                );
                None
            }
            other => {
                not_an_array(other, &key);
                None
            }
        }
    }

    /// Whether `self[key]` exists
    ///
    /// String offsets may be negative, counting back from the end.
    pub fn isset<K: IntoKey>(&self, key: K) -> bool {
        let Some(key) = key.into_key() else {
            return false;
        };
        if is_vivifiable(self) {
            return false;
        }
        match self {
            Value::Array(a) => a.contains(&key),
            Value::String(s) => match &key {
                ArrayKey::Int(n) => {
                    let len = i64::try_from(s.len()).unwrap_or(i64::MAX);
                    let index = if *n < 0 { n.saturating_add(len) } else { *n };
                    (0..len).contains(&index)
                }
                ArrayKey::Str(k) => {
                    illegal_string_offset(k);
                    false
                }
            },
            other => {
                runtime_warning!(
                    DiagnosticKind::NotAnArray,
                    "Cannot use variable of type {} as array in isset",
                    other.type_name()
                );
                false
            }
        }
    }

    /// Remove `self[key]`; order of the remaining entries is kept
    pub fn unset<K: IntoKey>(&mut self, key: K) {
        match self {
            Value::Array(a) => {
                if let Some(key) = key.into_key() {
                    a.remove(&key);
                }
            }
            other => runtime_warning!(
                DiagnosticKind::NotAnArray,
                "Cannot use variable of type {} as array in unset",
                other.type_name()
            ),
        }
    }

    fn push_slot(&mut self, value: Value) -> Option<&mut Value> {
        if is_vivifiable(self) {
            *self = Value::empty_array();
        }
        match self {
            Value::Array(a) => match a.push(value) {
                Some(slot) => Some(slot),
                None => {
                    runtime_warning!(
                        DiagnosticKind::IllegalOffset,
                        "Cannot add element to the array as the next element is already occupied"
                    );
                    None
                }
            },
            other => {
                runtime_warning!(
                    DiagnosticKind::NotAnArray,
                    "[] operator not supported for type {}",
                    other.type_name()
                );
                None
            }
        }
    }

    /// `self[] = value`
    pub fn push_back<V: Into<Value>>(&mut self, value: V) {
        self.push_slot(value.into());
    }

    /// `self[] = value`, returning the stored value (Null if nothing was stored)
    pub fn push_back_return<V: Into<Value>>(&mut self, value: V) -> Value {
        self.push_slot(value.into())
            .map(|slot| slot.clone())
            .unwrap_or_default()
    }

    /// `foreach` over the entries; non-arrays iterate nothing
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        let entries = match self {
            Value::Array(a) => Some(a.iter()),
            other => {
                invalid_foreach(other);
                None
            }
        };
        entries.into_iter().flatten()
    }

    /// `foreach` by reference; detaches a shared array first
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ArrayKey, &mut Value)> {
        let entries = match self {
            Value::Array(a) => Some(a.iter_mut()),
            other => {
                invalid_foreach(other);
                None
            }
        };
        entries.into_iter().flatten()
    }

    /// Element count; scalars count as 1 and Null as 0, with a diagnostic
    pub fn count(&self) -> i64 {
        match self {
            Value::Array(a) => a.to_int(),
            other => {
                runtime_warning!(
                    DiagnosticKind::NotAnArray,
                    "count(): Parameter is {}, but an array expected",
                    other.type_name()
                );
                if other.is_null() { 0 } else { 1 }
            }
        }
    }

    /// The language's `empty()`: not truthy
    pub fn is_empty_loose(&self) -> bool {
        !self.to_bool()
    }
}

fn invalid_foreach(value: &Value) {
    runtime_warning!(
        DiagnosticKind::NotAnArray,
        "Invalid argument supplied for foreach(), {} \"{}\" is given",
        value.type_name(),
        scalar_text(value)
    );
}
