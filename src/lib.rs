//! Exact constant expressions with Go's untyped-constant semantics.
//!
//! An expression such as `24*60*60` or `2.5*time.D` is evaluated to an
//! exact value (arbitrary-precision integers and rationals, exact
//! complex numbers, strings, booleans) and only rounded or range-checked
//! when narrowed to a machine type.
//!
//! ```
//! use goconst::Scope;
//!
//! let mut lib = Scope::new();
//! lib.assign("S", "1").unwrap();
//! lib.assign("M", "60*S").unwrap();
//! lib.assign("H", "60*M").unwrap();
//!
//! let mut scope = Scope::new();
//! scope.import("time", &lib.freeze()).unwrap();
//! assert_eq!(scope.int("1.5*time.H").unwrap(), 5400);
//! assert!(scope.int("time.S / 2.0").is_err());
//! ```

pub mod ast;
pub mod errors;
pub mod eval;
pub mod lexer;
mod literal;
pub mod narrow;
pub mod parser;
pub mod scope;
pub mod token;
pub mod value;

pub use errors::{Error, Result, SyntaxError};
pub use narrow::{FromConstant, IntoConstant};
pub use num_complex::Complex;
pub use scope::{FrozenScope, Scope};
pub use value::{ConstValue, Kind};

/// Exact value of `expr` in an empty scope.
pub fn evaluate(expr: &str) -> Result<ConstValue> {
    Scope::new().evaluate(expr)
}

/// Evaluate `expr` in an empty scope and narrow it to `T`.
pub fn eval_as<T: FromConstant>(expr: &str) -> Result<T> {
    Scope::new().eval_as(expr)
}

/// Evaluate `expr` in an empty scope as an `i64`.
pub fn int(expr: &str) -> Result<i64> {
    Scope::new().int(expr)
}

/// Evaluate `expr` in an empty scope as a `u64`.
pub fn uint(expr: &str) -> Result<u64> {
    Scope::new().uint(expr)
}

/// Evaluate `expr` in an empty scope as an `f64`, rounded to nearest.
pub fn float64(expr: &str) -> Result<f64> {
    Scope::new().float64(expr)
}

/// Evaluate `expr` in an empty scope as an `f32`, rounded to nearest.
pub fn float32(expr: &str) -> Result<f32> {
    Scope::new().float32(expr)
}

/// Evaluate `expr` in an empty scope as a `Complex<f64>`.
pub fn complex128(expr: &str) -> Result<Complex<f64>> {
    Scope::new().complex128(expr)
}

/// Evaluate `expr` in an empty scope as a `Complex<f32>`.
pub fn complex64(expr: &str) -> Result<Complex<f32>> {
    Scope::new().complex64(expr)
}

/// Evaluate `expr` in an empty scope as a `bool`.
pub fn bool(expr: &str) -> Result<bool> {
    Scope::new().bool(expr)
}

/// Evaluate `expr` in an empty scope as a UTF-8 `String`.
pub fn string(expr: &str) -> Result<String> {
    Scope::new().string(expr)
}
