//! RcString - Reference-Counted Copy-on-Write Byte String
//!
//! Strings in the language are byte sequences, not UTF-8 text. Copying a
//! string only bumps a reference count; the bytes are duplicated lazily the
//! first time a shared string is mutated.
//!
//! A string can also be marked constant (literals baked into the program).
//! Constant strings are never mutated in place, even when the handle is the
//! only one left: the first write always copies the bytes out.
//!
//! # Safety Invariants
//! - The reference count is a plain `Rc` count, so `RcString` is neither
//!   `Send` nor `Sync`. Values live on exactly one worker.
//! - `size_of::<RcString>()` equals `size_of::<f64>()`; the runtime's value
//!   type relies on this to keep every payload one word wide.

use crate::diagnostics::{DiagnosticKind, Severity, report};
use crate::numeric::{self, Numeric};
use std::borrow::Cow;
use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Reference count reported for constant buffers
pub const CONST_REF_COUNT: i32 = 0x7fff_fff0;

/// Longest string a string-offset write may grow a string to
pub const MAX_STRING_LEN: usize = 0x7fff_ffff;

#[derive(Debug)]
struct StringBuf {
    bytes: Vec<u8>,
    constant: Cell<bool>,
}

impl StringBuf {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            constant: Cell::new(false),
        }
    }
}

// A copied-out buffer is always private and mutable
impl Clone for StringBuf {
    fn clone(&self) -> Self {
        Self::new(self.bytes.clone())
    }
}

/// Copy-on-write byte string
#[derive(Clone)]
pub struct RcString {
    buf: Rc<StringBuf>,
}

impl RcString {
    /// Create an empty string
    pub fn new() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// Take ownership of a byte buffer
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        RcString {
            buf: Rc::new(StringBuf::new(bytes)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf.bytes
    }

    /// Lossy UTF-8 view for messages and display
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf.bytes)
    }

    /// Get length in bytes
    pub fn len(&self) -> usize {
        self.buf.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.bytes.is_empty()
    }

    pub fn byte_at(&self, index: usize) -> Option<u8> {
        self.buf.bytes.get(index).copied()
    }

    /// Mutable access to the bytes, copying them out first if they are
    /// shared or constant
    fn make_mut(&mut self) -> &mut Vec<u8> {
        if self.buf.constant.get() {
            self.buf = Rc::new((*self.buf).clone());
        }
        &mut Rc::make_mut(&mut self.buf).bytes
    }

    /// Overwrite one byte; out-of-range indices are ignored
    pub fn set_byte(&mut self, index: usize, byte: u8) {
        if index < self.len() {
            self.make_mut()[index] = byte;
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.make_mut().extend_from_slice(bytes);
        }
    }

    /// Append `count` copies of `byte`
    pub fn append_repeated(&mut self, byte: u8, count: usize) {
        if count > 0 {
            let bytes = self.make_mut();
            bytes.resize(bytes.len() + count, byte);
        }
    }

    // =========================================================================
    // Numeric interpretation
    // =========================================================================

    /// The numeric value if the whole string is numeric
    pub fn numeric_value(&self) -> Option<Numeric> {
        numeric::parse_numeric(self.as_bytes())
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_value().is_some()
    }

    /// Numeric coercion: non-numeric strings become `Int(0)`
    pub fn to_numeric(&self) -> Numeric {
        self.numeric_value().unwrap_or(Numeric::Int(0))
    }

    pub fn to_int(&self) -> i64 {
        self.to_numeric().as_i64()
    }

    pub fn to_float(&self) -> f64 {
        self.to_numeric().as_f64()
    }

    /// Only `""` and `"0"` are false
    pub fn to_bool(&self) -> bool {
        !matches!(self.as_bytes(), b"" | b"0")
    }

    /// Integer conversion that reports floats outside the i64 range
    pub fn safe_to_int(&self) -> i64 {
        match self.to_numeric() {
            Numeric::Int(n) => n,
            Numeric::Float(f) => {
                if !numeric::float_fits_int(f) {
                    report(
                        Severity::Warning,
                        DiagnosticKind::Conversion,
                        format!("Wrong conversion from double {:.6} to int", f),
                    );
                }
                numeric::float_to_int(f)
            }
        }
    }

    /// Strict integer parse used for offsets and keys (`"12"` yes, `" 12"` no)
    pub fn try_to_int(&self) -> Option<i64> {
        numeric::parse_canonical_int(self.as_bytes())
    }

    /// Loose ordering: numeric when both strings are numeric, bytewise otherwise
    pub fn compare_loose(&self, other: &RcString) -> Ordering {
        match (self.numeric_value(), other.numeric_value()) {
            (Some(a), Some(b)) => a.compare(b),
            _ => self.as_bytes().cmp(other.as_bytes()),
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of handles sharing the buffer, or `CONST_REF_COUNT` for constants
    pub fn reference_count(&self) -> i32 {
        if self.buf.constant.get() {
            CONST_REF_COUNT
        } else {
            i32::try_from(Rc::strong_count(&self.buf)).unwrap_or(i32::MAX)
        }
    }

    /// Mark the buffer as a program constant; every later write copies out
    pub fn mark_constant(&self) {
        self.buf.constant.set(true);
    }

    pub fn is_constant(&self) -> bool {
        self.buf.constant.get()
    }

    /// Approximate heap footprint of the shared buffer in bytes
    pub fn estimate_memory_usage(&self) -> usize {
        std::mem::size_of::<StringBuf>() + self.buf.bytes.capacity()
    }

    /// Whether two handles share one buffer
    pub fn ptr_eq(&self, other: &RcString) -> bool {
        Rc::ptr_eq(&self.buf, &other.buf)
    }
}

impl Default for RcString {
    fn default() -> Self {
        Self::new()
    }
}

// Content equality, not pointer equality
impl PartialEq for RcString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for RcString {}

impl Hash for RcString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for RcString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RcString({:?}, refs={})",
            self.to_str_lossy(),
            self.reference_count()
        )
    }
}

impl fmt::Display for RcString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

impl From<&str> for RcString {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for RcString {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

impl From<&[u8]> for RcString {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for RcString {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::thread_diagnostic_count;

    #[test]
    fn test_clone_shares_buffer() {
        let s1 = RcString::from("hello");
        let s2 = s1.clone();

        assert!(s1.ptr_eq(&s2));
        assert_eq!(s1.reference_count(), 2);
        drop(s2);
        assert_eq!(s1.reference_count(), 1);
    }

    #[test]
    fn test_mutation_copies_out_shared_buffer() {
        let s1 = RcString::from("abc");
        let mut s2 = s1.clone();

        s2.set_byte(0, b'X');

        assert_eq!(s1.as_bytes(), b"abc");
        assert_eq!(s2.as_bytes(), b"Xbc");
        assert!(!s1.ptr_eq(&s2));
        assert_eq!(s1.reference_count(), 1);
        assert_eq!(s2.reference_count(), 1);
    }

    #[test]
    fn test_unique_mutation_stays_in_place() {
        let mut s = RcString::from("abc");
        let before = Rc::as_ptr(&s.buf);
        s.append(b"def");
        assert_eq!(Rc::as_ptr(&s.buf), before);
        assert_eq!(s.as_bytes(), b"abcdef");
    }

    #[test]
    fn test_constant_always_copies_out() {
        let mut s = RcString::from("lit");
        s.mark_constant();
        assert_eq!(s.reference_count(), CONST_REF_COUNT);

        let original = s.clone();
        s.append(b"!");

        assert_eq!(original.as_bytes(), b"lit");
        assert!(original.is_constant());
        assert_eq!(s.as_bytes(), b"lit!");
        assert!(!s.is_constant());
        assert_eq!(s.reference_count(), 1);
    }

    #[test]
    fn test_append_repeated() {
        let mut s = RcString::from("ab");
        s.append_repeated(b' ', 3);
        assert_eq!(s.as_bytes(), b"ab   ");
        s.append_repeated(b'x', 0);
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn test_set_byte_out_of_range_ignored() {
        let mut s = RcString::from("ab");
        s.set_byte(5, b'z');
        assert_eq!(s.as_bytes(), b"ab");
    }

    #[test]
    fn test_to_bool() {
        assert!(!RcString::from("").to_bool());
        assert!(!RcString::from("0").to_bool());
        assert!(RcString::from("0.0").to_bool());
        assert!(RcString::from("00").to_bool());
        assert!(RcString::from(" ").to_bool());
        assert!(RcString::from("a").to_bool());
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(RcString::from("42").to_int(), 42);
        assert_eq!(RcString::from("4.9").to_int(), 4);
        assert_eq!(RcString::from("1e3").to_int(), 1000);
        assert_eq!(RcString::from("abc").to_int(), 0);
        assert_eq!(RcString::from("12abc").to_int(), 0);
        assert_eq!(RcString::from("2.5").to_float(), 2.5);
        assert_eq!(RcString::from("7").to_numeric(), Numeric::Int(7));
        assert_eq!(RcString::from("x").to_numeric(), Numeric::Int(0));
    }

    #[test]
    fn test_safe_to_int_reports_overflow() {
        let before = thread_diagnostic_count();
        assert_eq!(RcString::from("12").safe_to_int(), 12);
        assert_eq!(thread_diagnostic_count(), before);

        assert_eq!(RcString::from("1e30").safe_to_int(), i64::MAX);
        assert_eq!(thread_diagnostic_count(), before + 1);
    }

    #[test]
    fn test_try_to_int() {
        assert_eq!(RcString::from("15").try_to_int(), Some(15));
        assert_eq!(RcString::from("1.5").try_to_int(), None);
        assert_eq!(RcString::from("x").try_to_int(), None);
    }

    #[test]
    fn test_compare_loose() {
        let cmp = |a: &str, b: &str| RcString::from(a).compare_loose(&RcString::from(b));
        assert_eq!(cmp("10", "9"), Ordering::Greater);
        assert_eq!(cmp("10", "9a"), Ordering::Less);
        assert_eq!(cmp("1e1", "10"), Ordering::Equal);
        assert_eq!(cmp("abc", "abd"), Ordering::Less);
        assert_eq!(cmp("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn test_equality_and_hash_by_content() {
        use std::collections::hash_map::DefaultHasher;

        let a = RcString::from("same");
        let b = RcString::from(String::from("same"));
        assert_eq!(a, b);

        let hash = |s: &RcString| {
            let mut h = DefaultHasher::new();
            s.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_display_and_debug() {
        let s = RcString::from("display");
        assert_eq!(format!("{}", s), "display");
        let debug_str = format!("{:?}", s);
        assert!(debug_str.contains("display"));
        assert!(debug_str.contains("refs=1"));
    }

    #[test]
    fn test_non_utf8_bytes() {
        let s = RcString::from(vec![0xff, b'a']);
        assert_eq!(s.len(), 2);
        assert_eq!(s.byte_at(0), Some(0xff));
        assert_eq!(format!("{}", s), "\u{fffd}a");
    }

    #[test]
    fn test_estimate_memory_usage() {
        let s = RcString::from_bytes(Vec::with_capacity(64));
        assert!(s.estimate_memory_usage() >= 64);
    }

    #[test]
    fn test_handle_is_one_word() {
        assert_eq!(std::mem::size_of::<RcString>(), std::mem::size_of::<f64>());
    }
}
