//! Shared test utilities for the ionmodel workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Approximate floating-point assertions
//! - Fixed timestamps and observer locations
//! - Temporary model directories
//! - Synthetic vertical profile generators
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  \
                 diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for relative floating-point equality, for values spanning many
/// orders of magnitude such as electron densities.
///
/// ```ignore
/// use test_utils::assert_rel_eq;
///
/// assert_rel_eq!(1.0e12 + 1.0, 1.0e12, 1e-9); // passes
/// ```
#[macro_export]
macro_rules! assert_rel_eq {
    ($left:expr, $right:expr, $rel:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let scale = left.abs().max(right.abs());
        $crate::assert_approx_eq!(left, right, scale * ($rel as f64));
    }};
}

/// Macro asserting that a value lies within the closed interval spanned by
/// two bounds, given in either order.
///
/// ```ignore
/// use test_utils::assert_between;
///
/// assert_between!(1.5, 2.0, 1.0); // passes
/// ```
#[macro_export]
macro_rules! assert_between {
    ($value:expr, $a:expr, $b:expr) => {{
        let value: f64 = $value as f64;
        let (a, b): (f64, f64) = ($a as f64, $b as f64);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if !(lo <= value && value <= hi) {
            panic!(
                "assertion failed: `{:?}` is not within [{:?}, {:?}]",
                value, lo, hi
            );
        }
    }};
}
