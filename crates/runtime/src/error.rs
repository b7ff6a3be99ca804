//! Typed extraction errors
//!
//! The language itself never fails on a type mismatch: it converts, or it
//! reports a diagnostic and falls back (see `mixed_core::diagnostics`).
//! Native callers that need one exact type use `TryFrom<&Value>` instead,
//! which performs no coercion and returns this error on mismatch.
//!
//! ```
//! use mixed_runtime::{Value, ValueError};
//!
//! let n = i64::try_from(&Value::Int(7))?;
//! assert_eq!(n, 7);
//! assert!(i64::try_from(&Value::from("7")).is_err());
//! # Ok::<(), ValueError>(())
//! ```

use crate::value::{Value, ValueType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The value's tag is not the requested type
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ValueError {
    pub(crate) fn mismatch(expected: ValueType, found: &Value) -> Self {
        ValueError::TypeMismatch {
            expected: expected.name(),
            found: found.type_name(),
        }
    }
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ValueError::mismatch(ValueType::Array, &Value::Float(1.0));
        assert_eq!(err.to_string(), "Type mismatch: expected array, found double");
    }

    #[test]
    fn test_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&ValueError::mismatch(ValueType::Bool, &Value::Null));
    }
}
