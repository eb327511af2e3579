//! Conversions between constants and machine values

use crate::errors::{Error, Result};
use crate::value::ConstValue;
use num_bigint::BigInt;
use num_complex::Complex;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;

/// A machine type an exact constant can be narrowed to.
pub trait FromConstant: Sized {
    /// Type name used in error messages.
    const TARGET: &'static str;

    fn from_constant(value: &ConstValue) -> Result<Self>;
}

/// A native value that can be bound into a scope.
pub trait IntoConstant {
    fn into_constant(self) -> ConstValue;
}

fn not_representable<T: FromConstant>(value: &ConstValue) -> Error {
    Error::not_representable(value.kind(), T::TARGET)
}

// Integers accept any numeric kind whose value is an exact integer in range.
macro_rules! int_narrowing {
    ($($t:ty => $to:ident, $name:literal;)*) => {
        $(
            impl FromConstant for $t {
                const TARGET: &'static str = $name;

                fn from_constant(value: &ConstValue) -> Result<Self> {
                    value
                        .to_int()
                        .and_then(|i| i.$to())
                        .ok_or_else(|| not_representable::<Self>(value))
                }
            }

            impl IntoConstant for $t {
                fn into_constant(self) -> ConstValue {
                    ConstValue::Int(BigInt::from(self))
                }
            }
        )*
    };
}

int_narrowing! {
    i8 => to_i8, "int8";
    i16 => to_i16, "int16";
    i32 => to_i32, "int32";
    i64 => to_i64, "int64";
    isize => to_isize, "int";
    u8 => to_u8, "uint8";
    u16 => to_u16, "uint16";
    u32 => to_u32, "uint32";
    u64 => to_u64, "uint64";
    usize => to_usize, "uint";
}

// Rounds `r` once to the nearest binary float with `precision` significant
// bits and smallest step 2^-`min_exp`, ties to even. The result is exact in
// f64 for both the f32 and f64 formats; overflow gives infinity.
fn round_binary(r: &BigRational, precision: u64, min_exp: i64) -> f64 {
    if r.is_zero() {
        return 0.0;
    }
    let sign = if r.is_negative() { -1.0 } else { 1.0 };
    let n = r.numer().abs();
    let d = r.denom();
    let magnitude = n.bits() as i64 - d.bits() as i64;
    if magnitude > 1100 {
        return sign * f64::INFINITY;
    }

    // n * 2^s / d as quotient, remainder and divisor.
    let scaled = |s: i64| {
        let (num, den) = if s >= 0 {
            (&n << s as usize, d.clone())
        } else {
            (n.clone(), d << (-s) as usize)
        };
        let q = &num / &den;
        let rem = num - &q * &den;
        (q, rem, den)
    };

    // Below the smallest normal exponent the step stays at 2^-min_exp.
    let mut s = (precision as i64 - magnitude).min(min_exp);
    let (mut q, mut rem, mut den) = scaled(s);
    if q.bits() > precision {
        s -= 1;
        (q, rem, den) = scaled(s);
    }
    match (rem << 1usize).cmp(&den) {
        Ordering::Greater => q += 1,
        Ordering::Equal if !(&q % 2u32).is_zero() => q += 1,
        _ => {}
    }

    let Some(q) = q.to_f64() else {
        return sign * f64::INFINITY;
    };
    let e = -s;
    sign * q * pow2(e / 2) * pow2(e - e / 2)
}

// 2^k for -1022 <= k <= 1023
fn pow2(k: i64) -> f64 {
    f64::from_bits(((k + 1023) as u64) << 52)
}

fn real_f64(r: &BigRational) -> Option<f64> {
    Some(round_binary(r, 53, 1074)).filter(|f| f.is_finite())
}

fn real_f32(r: &BigRational) -> Option<f32> {
    Some(round_binary(r, 24, 149) as f32).filter(|f| f.is_finite())
}

impl FromConstant for f64 {
    const TARGET: &'static str = "float64";

    fn from_constant(value: &ConstValue) -> Result<Self> {
        value
            .to_float()
            .as_ref()
            .and_then(real_f64)
            .ok_or_else(|| not_representable::<Self>(value))
    }
}

impl FromConstant for f32 {
    const TARGET: &'static str = "float32";

    fn from_constant(value: &ConstValue) -> Result<Self> {
        value
            .to_float()
            .as_ref()
            .and_then(real_f32)
            .ok_or_else(|| not_representable::<Self>(value))
    }
}

impl FromConstant for Complex<f64> {
    const TARGET: &'static str = "complex128";

    fn from_constant(value: &ConstValue) -> Result<Self> {
        value
            .to_complex()
            .and_then(|c| Some(Complex::new(real_f64(&c.re)?, real_f64(&c.im)?)))
            .ok_or_else(|| not_representable::<Self>(value))
    }
}

impl FromConstant for Complex<f32> {
    const TARGET: &'static str = "complex64";

    fn from_constant(value: &ConstValue) -> Result<Self> {
        value
            .to_complex()
            .and_then(|c| Some(Complex::new(real_f32(&c.re)?, real_f32(&c.im)?)))
            .ok_or_else(|| not_representable::<Self>(value))
    }
}

impl FromConstant for bool {
    const TARGET: &'static str = "bool";

    fn from_constant(value: &ConstValue) -> Result<Self> {
        match value {
            ConstValue::Bool(b) => Ok(*b),
            _ => Err(not_representable::<Self>(value)),
        }
    }
}

impl FromConstant for String {
    const TARGET: &'static str = "string";

    fn from_constant(value: &ConstValue) -> Result<Self> {
        match value {
            ConstValue::String(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|_| not_representable::<Self>(value))
            }
            _ => Err(not_representable::<Self>(value)),
        }
    }
}

fn float_constant(v: f64) -> ConstValue {
    BigRational::from_float(v)
        .map(ConstValue::Float)
        .unwrap_or(ConstValue::Unknown)
}

impl IntoConstant for f64 {
    fn into_constant(self) -> ConstValue {
        float_constant(self)
    }
}

impl IntoConstant for f32 {
    fn into_constant(self) -> ConstValue {
        float_constant(f64::from(self))
    }
}

impl IntoConstant for Complex<f64> {
    fn into_constant(self) -> ConstValue {
        match (BigRational::from_float(self.re), BigRational::from_float(self.im)) {
            (Some(re), Some(im)) => ConstValue::Complex(Complex::new(re, im)),
            _ => ConstValue::Unknown,
        }
    }
}

impl IntoConstant for Complex<f32> {
    fn into_constant(self) -> ConstValue {
        Complex::new(f64::from(self.re), f64::from(self.im)).into_constant()
    }
}

impl IntoConstant for bool {
    fn into_constant(self) -> ConstValue {
        ConstValue::Bool(self)
    }
}

impl IntoConstant for String {
    fn into_constant(self) -> ConstValue {
        ConstValue::String(self.into_bytes())
    }
}

impl IntoConstant for &str {
    fn into_constant(self) -> ConstValue {
        ConstValue::String(self.as_bytes().to_vec())
    }
}
