//! Constant-time string comparison.

use subtle::ConstantTimeEq;

/// Compares two byte strings without short-circuiting on the first
/// differing byte.
///
/// Lengths are compared first; only the length of the inputs can leak.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// String convenience wrapper around [`constant_time_eq`].
#[must_use]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
