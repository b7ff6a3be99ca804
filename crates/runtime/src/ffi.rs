//! C ABI for generated code
//!
//! Generated code owns `Value` slots (16 bytes, 8-byte aligned) and passes
//! pointers to them. Constructors write into uninitialized slots; every
//! other entry point expects an initialized slot. A slot must be released
//! with `mixed_drop` exactly once.
//!
//! Operand pointers may alias the target: operands are cloned (one
//! refcount bump) before the target is borrowed mutably.

use crate::value::Value;
use mixed_core::diagnostics;
use std::os::raw::c_char;
use std::ptr;

// =============================================================================
// Construction and lifetime
// =============================================================================

/// # Safety
/// `out` must be valid for writes and must not hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_init_null(out: *mut Value) {
    unsafe { ptr::write(out, Value::Null) }
}

/// # Safety
/// `out` must be valid for writes and must not hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_init_bool(out: *mut Value, b: bool) {
    unsafe { ptr::write(out, Value::Bool(b)) }
}

/// # Safety
/// `out` must be valid for writes and must not hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_init_int(out: *mut Value, n: i64) {
    unsafe { ptr::write(out, Value::Int(n)) }
}

/// # Safety
/// `out` must be valid for writes and must not hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_init_float(out: *mut Value, f: f64) {
    unsafe { ptr::write(out, Value::Float(f)) }
}

/// Initialize a string slot from `len` bytes (not NUL-terminated)
///
/// # Safety
/// `out` must be valid for writes and must not hold a live value.
/// `bytes` must be readable for `len` bytes, or null when `len` is 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_init_string(out: *mut Value, bytes: *const u8, len: usize) {
    let data = if bytes.is_null() || len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(bytes, len) }.to_vec()
    };
    unsafe { ptr::write(out, Value::from(data)) }
}

/// # Safety
/// `out` must be valid for writes and must not hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_init_array(out: *mut Value) {
    unsafe { ptr::write(out, Value::empty_array()) }
}

/// Release the value in a slot; the slot is uninitialized afterwards
///
/// # Safety
/// `slot` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_drop(slot: *mut Value) {
    unsafe { ptr::drop_in_place(slot) }
}

/// Share `src` into the uninitialized slot `out`
///
/// # Safety
/// `src` must hold a live value; `out` must be valid for writes and must not
/// hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_clone(out: *mut Value, src: *const Value) {
    let copy = unsafe { (*src).clone() };
    unsafe { ptr::write(out, copy) }
}

/// Replace the value in `target` with a share of `src`
///
/// # Safety
/// Both pointers must hold live values
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_assign(target: *mut Value, src: *const Value) {
    let copy = unsafe { (*src).clone() };
    unsafe { *target = copy }
}

// =============================================================================
// Arithmetic (compound forms)
// =============================================================================

macro_rules! compound_entry {
    ($name:ident, $op:tt) => {
        /// # Safety
        /// Both pointers must hold live values; they may be equal
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(target: *mut Value, rhs: *const Value) {
            let rhs = unsafe { (*rhs).clone() };
            let target = unsafe { &mut *target };
            *target $op &rhs;
        }
    };
}

compound_entry!(mixed_add_assign, +=);
compound_entry!(mixed_sub_assign, -=);
compound_entry!(mixed_mul_assign, *=);
compound_entry!(mixed_div_assign, /=);
compound_entry!(mixed_mod_assign, %=);

/// # Safety
/// `slot` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_pre_inc(slot: *mut Value) {
    unsafe { (*slot).pre_inc() };
}

/// # Safety
/// `slot` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_pre_dec(slot: *mut Value) {
    unsafe { (*slot).pre_dec() };
}

// =============================================================================
// Comparison and conversion
// =============================================================================

macro_rules! compare_entry {
    ($name:ident, $f:path) => {
        /// # Safety
        /// Both pointers must hold live values
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(lhs: *const Value, rhs: *const Value) -> bool {
            unsafe { $f(&*lhs, &*rhs) }
        }
    };
}

compare_entry!(mixed_lt, crate::compare::lt);
compare_entry!(mixed_le, crate::compare::le);
compare_entry!(mixed_gt, crate::compare::gt);
compare_entry!(mixed_ge, crate::compare::ge);

/// # Safety
/// `v` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_to_bool(v: *const Value) -> bool {
    unsafe { (*v).to_bool() }
}

/// # Safety
/// `v` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_to_int(v: *const Value) -> i64 {
    unsafe { (*v).to_int() }
}

/// # Safety
/// `v` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_to_float(v: *const Value) -> f64 {
    unsafe { (*v).to_float() }
}

// =============================================================================
// Container access by integer key
// =============================================================================

/// Read `target[key]` into the uninitialized slot `out`
///
/// # Safety
/// `target` must hold a live value; `out` must be valid for writes, must
/// not hold a live value, and must not alias `target`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_get_int_key(out: *mut Value, target: *const Value, key: i64) {
    let v = unsafe { (*target).get_value(key) };
    unsafe { ptr::write(out, v) }
}

/// `target[key] = value`
///
/// # Safety
/// Both pointers must hold live values; they may be equal
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_set_int_key(target: *mut Value, key: i64, value: *const Value) {
    let value = unsafe { (*value).clone() };
    unsafe { (*target).set_value(key, value) }
}

/// # Safety
/// `target` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_isset_int_key(target: *const Value, key: i64) -> bool {
    unsafe { (*target).isset(key) }
}

/// # Safety
/// `target` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_unset_int_key(target: *mut Value, key: i64) {
    unsafe { (*target).unset(key) }
}

/// `target[] = value`
///
/// # Safety
/// Both pointers must hold live values; they may be equal
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_push(target: *mut Value, value: *const Value) {
    let value = unsafe { (*value).clone() };
    unsafe { (*target).push_back(value) }
}

/// # Safety
/// `target` must hold a live value
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_count(target: *const Value) -> i64 {
    unsafe { (*target).count() }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Check if this thread has an unread diagnostic
#[unsafe(no_mangle)]
pub extern "C" fn mixed_has_diagnostic() -> bool {
    diagnostics::has_diagnostic()
}

/// Take the last diagnostic message on this thread as a C string
///
/// Returns null if none is pending.
///
/// # WARNING: Pointer Lifetime
/// The returned pointer is only valid until the next diagnostic is reported
/// on this thread or `mixed_clear_diagnostic` is called. Callers must copy
/// the string immediately if they need to retain it.
#[unsafe(no_mangle)]
pub extern "C" fn mixed_take_diagnostic() -> *const c_char {
    diagnostics::take_last_diagnostic_c_str()
}

#[unsafe(no_mangle)]
pub extern "C" fn mixed_clear_diagnostic() {
    diagnostics::clear_last_diagnostic();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::mem::MaybeUninit;

    fn slot_int(n: i64) -> Value {
        let mut slot = MaybeUninit::<Value>::uninit();
        unsafe {
            mixed_init_int(slot.as_mut_ptr(), n);
            slot.assume_init()
        }
    }

    #[test]
    fn test_init_and_drop() {
        let mut slot = MaybeUninit::<Value>::uninit();
        let text = b"hello";
        unsafe {
            mixed_init_string(slot.as_mut_ptr(), text.as_ptr(), text.len());
            assert_eq!((*slot.as_ptr()).to_string(), "hello");
            mixed_drop(slot.as_mut_ptr());

            mixed_init_string(slot.as_mut_ptr(), ptr::null(), 0);
            assert_eq!(*slot.as_ptr(), Value::from(""));
            mixed_drop(slot.as_mut_ptr());

            mixed_init_float(slot.as_mut_ptr(), 2.5);
            assert_eq!(*slot.as_ptr(), Value::Float(2.5));
            mixed_drop(slot.as_mut_ptr());
        }
    }

    #[test]
    fn test_clone_shares_payload() {
        let src = Value::from("shared");
        let mut out = MaybeUninit::<Value>::uninit();
        unsafe {
            mixed_clone(out.as_mut_ptr(), &src);
            let out = out.assume_init();
            assert_eq!(out, src);
            assert_eq!(src.reference_count(), 2);
        }
    }

    #[test]
    fn test_compound_with_aliasing() {
        let mut v = slot_int(21);
        let p: *mut Value = &mut v;
        unsafe { mixed_add_assign(p, p) };
        assert_eq!(v, Value::Int(42));

        let rhs = Value::Int(0);
        unsafe { mixed_div_assign(&mut v, &rhs) };
        assert_eq!(v, Value::Bool(false));
        assert!(mixed_has_diagnostic());
        let msg = unsafe { CStr::from_ptr(mixed_take_diagnostic()) };
        assert_eq!(msg.to_str().unwrap(), "Integer division by zero");
        assert!(!mixed_has_diagnostic());
        assert!(mixed_take_diagnostic().is_null());
    }

    #[test]
    fn test_compare_and_convert() {
        let a = Value::from("10");
        let b = Value::Int(9);
        unsafe {
            assert!(mixed_gt(&a, &b));
            assert!(!mixed_lt(&a, &b));
            assert!(mixed_ge(&a, &a));
            assert!(mixed_le(&b, &a));
            assert_eq!(mixed_to_int(&a), 10);
            assert_eq!(mixed_to_float(&a), 10.0);
            assert!(mixed_to_bool(&b));
        }
    }

    #[test]
    fn test_inc_dec() {
        let mut v = Value::Null;
        unsafe {
            mixed_pre_inc(&mut v);
            assert_eq!(v, Value::Int(1));
            mixed_pre_dec(&mut v);
            mixed_pre_dec(&mut v);
        }
        assert_eq!(v, Value::Int(-1));
    }

    #[test]
    fn test_container_entry_points() {
        let mut arr = Value::Null;
        let x = Value::from("x");
        unsafe {
            mixed_set_int_key(&mut arr, 5, &x);
            mixed_push(&mut arr, &x);
            assert_eq!(mixed_count(&arr), 2);
            assert!(mixed_isset_int_key(&arr, 6));

            let mut out = MaybeUninit::<Value>::uninit();
            mixed_get_int_key(out.as_mut_ptr(), &arr, 5);
            assert_eq!(out.assume_init(), x);

            mixed_unset_int_key(&mut arr, 5);
            assert!(!mixed_isset_int_key(&arr, 5));
            assert_eq!(mixed_count(&arr), 1);
        }
    }

    #[test]
    fn test_clear_diagnostic() {
        let mut v = Value::Int(1);
        let zero = Value::Int(0);
        unsafe { mixed_mod_assign(&mut v, &zero) };
        assert!(mixed_has_diagnostic());
        mixed_clear_diagnostic();
        assert!(!mixed_has_diagnostic());
    }
}
