//! Exact untyped constant values

use crate::ast::{BinaryOp, UnaryOp};
use crate::errors::{Error, Result};
use num_bigint::BigInt;
use num_complex::Complex;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

/// Value kinds, ordered so that numeric promotion goes upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Unknown,
    Bool,
    String,
    Int,
    Float,
    Complex,
}

impl Kind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Int | Kind::Float | Kind::Complex)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Unknown => "unknown",
            Kind::Bool => "bool",
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Complex => "complex",
        })
    }
}

/// Constant value
///
/// `Float` is an exact rational and `String` an exact byte sequence;
/// nothing is rounded until the value is narrowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Bool(bool),
    String(Vec<u8>),
    Int(BigInt),
    Float(BigRational),
    Complex(Complex<BigRational>),
    /// Marker for a value with no exact representation.
    Unknown,
}

impl ConstValue {
    pub fn kind(&self) -> Kind {
        match self {
            ConstValue::Bool(_) => Kind::Bool,
            ConstValue::String(_) => Kind::String,
            ConstValue::Int(_) => Kind::Int,
            ConstValue::Float(_) => Kind::Float,
            ConstValue::Complex(_) => Kind::Complex,
            ConstValue::Unknown => Kind::Unknown,
        }
    }

    pub fn imag(value: BigRational) -> Self {
        ConstValue::Complex(Complex::new(BigRational::zero(), value))
    }

    /// Exact integer value, if the value is numeric and integral.
    pub fn to_int(&self) -> Option<BigInt> {
        match self {
            ConstValue::Int(i) => Some(i.clone()),
            ConstValue::Float(f) if f.is_integer() => Some(f.to_integer()),
            ConstValue::Complex(c) if c.im.is_zero() && c.re.is_integer() => {
                Some(c.re.to_integer())
            }
            _ => None,
        }
    }

    /// Exact real value, if the value is numeric with no imaginary part.
    pub fn to_float(&self) -> Option<BigRational> {
        match self {
            ConstValue::Int(i) => Some(BigRational::from_integer(i.clone())),
            ConstValue::Float(f) => Some(f.clone()),
            ConstValue::Complex(c) if c.im.is_zero() => Some(c.re.clone()),
            _ => None,
        }
    }

    pub fn to_complex(&self) -> Option<Complex<BigRational>> {
        match self {
            ConstValue::Complex(c) => Some(c.clone()),
            other => other
                .to_float()
                .map(|re| Complex::new(re, BigRational::zero())),
        }
    }

    fn promote(&self, kind: Kind) -> Option<ConstValue> {
        match kind {
            k if k == self.kind() => Some(self.clone()),
            Kind::Float if self.kind() == Kind::Int => self.to_float().map(ConstValue::Float),
            Kind::Complex if self.kind().is_numeric() => {
                self.to_complex().map(ConstValue::Complex)
            }
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            ConstValue::Int(i) => i.is_zero(),
            ConstValue::Float(f) => f.is_zero(),
            ConstValue::Complex(c) => c.is_zero(),
            _ => false,
        }
    }

    pub fn unary_op(&self, op: UnaryOp) -> Result<ConstValue> {
        let value = match (op, self) {
            (UnaryOp::Pos, v) if v.kind().is_numeric() => v.clone(),
            (UnaryOp::Neg, ConstValue::Int(i)) => ConstValue::Int(-i),
            (UnaryOp::Neg, ConstValue::Float(f)) => ConstValue::Float(-f),
            (UnaryOp::Neg, ConstValue::Complex(c)) => ConstValue::Complex(-c.clone()),
            (UnaryOp::Not, ConstValue::Bool(b)) => ConstValue::Bool(!b),
            // Two's complement: ^x == -x - 1
            (UnaryOp::Complement, ConstValue::Int(i)) => ConstValue::Int(!i),
            _ => return Err(Error::mismatch(op.name(), &[self.kind()])),
        };
        Ok(value)
    }

    /// Applies a non short-circuiting binary operator.
    pub fn binary_op(&self, op: BinaryOp, other: &ConstValue) -> Result<ConstValue> {
        if op.is_shift() {
            return self.shift(op, other);
        }

        let mismatch = || Error::mismatch(op.name(), &[self.kind(), other.kind()]);
        let (a, b) = unify(self, other).ok_or_else(mismatch)?;

        if op.is_comparison() {
            return compare(&a, op, &b)
                .map(ConstValue::Bool)
                .ok_or_else(mismatch);
        }

        // `%` is integer-only, whatever the divisor.
        if op == BinaryOp::Mod && a.kind() != Kind::Int {
            return Err(mismatch());
        }
        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b.is_zero() {
            return Err(Error::DivisionByZero);
        }

        let result = match (a, b) {
            (ConstValue::Int(a), ConstValue::Int(b)) => binary_int(&a, op, &b),
            (ConstValue::Float(a), ConstValue::Float(b)) => binary_float(&a, op, &b),
            (ConstValue::Complex(a), ConstValue::Complex(b)) => binary_complex(a, op, b),
            (ConstValue::String(a), ConstValue::String(b)) => binary_string(a, op, &b),
            (ConstValue::Bool(a), ConstValue::Bool(b)) => binary_bool(a, op, b),
            _ => None,
        };
        result.ok_or_else(mismatch)
    }

    fn shift(&self, op: BinaryOp, count: &ConstValue) -> Result<ConstValue> {
        let value = match self {
            ConstValue::Int(i) => i.clone(),
            ConstValue::Float(_) | ConstValue::Complex(_) => self
                .to_int()
                .ok_or_else(|| Error::mismatch(op.name(), &[self.kind(), count.kind()]))?,
            _ => return Err(Error::mismatch(op.name(), &[self.kind(), count.kind()])),
        };

        let invalid = || Error::InvalidShift(count.to_string());
        let n = match count.to_int() {
            Some(n) if !n.is_negative() => n,
            _ => return Err(invalid()),
        };

        let shifted = match (op, n.to_usize()) {
            (BinaryOp::Shl, Some(n)) => value << n,
            (BinaryOp::Shl, None) => return Err(invalid()),
            (_, Some(n)) => value >> n,
            // Everything has been shifted out.
            (_, None) if value.is_negative() => BigInt::from(-1),
            (_, None) => BigInt::zero(),
        };
        Ok(ConstValue::Int(shifted))
    }
}

// Brings both operands to their least common kind.
fn unify(a: &ConstValue, b: &ConstValue) -> Option<(ConstValue, ConstValue)> {
    let (ka, kb) = (a.kind(), b.kind());
    if ka == Kind::Unknown || kb == Kind::Unknown {
        return None;
    }
    if ka == kb {
        return Some((a.clone(), b.clone()));
    }
    if !ka.is_numeric() || !kb.is_numeric() {
        return None;
    }
    let kind = ka.max(kb);
    Some((a.promote(kind)?, b.promote(kind)?))
}

fn compare(a: &ConstValue, op: BinaryOp, b: &ConstValue) -> Option<bool> {
    let ordering = match (a, b) {
        (ConstValue::Int(a), ConstValue::Int(b)) => a.cmp(b),
        (ConstValue::Float(a), ConstValue::Float(b)) => a.cmp(b),
        (ConstValue::String(a), ConstValue::String(b)) => a.cmp(b),
        (ConstValue::Bool(a), ConstValue::Bool(b)) => {
            return equality(a == b, op);
        }
        (ConstValue::Complex(a), ConstValue::Complex(b)) => {
            return equality(a == b, op);
        }
        _ => return None,
    };
    Some(match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => return None,
    })
}

fn equality(equal: bool, op: BinaryOp) -> Option<bool> {
    match op {
        BinaryOp::Eq => Some(equal),
        BinaryOp::Ne => Some(!equal),
        _ => None,
    }
}

fn binary_int(a: &BigInt, op: BinaryOp, b: &BigInt) -> Option<ConstValue> {
    Some(ConstValue::Int(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        // Truncates toward zero, like the remainder below.
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::AndNot => a & &(!b),
        _ => return None,
    }))
}

fn binary_float(a: &BigRational, op: BinaryOp, b: &BigRational) -> Option<ConstValue> {
    Some(ConstValue::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => return None,
    }))
}

fn binary_complex(
    a: Complex<BigRational>,
    op: BinaryOp,
    b: Complex<BigRational>,
) -> Option<ConstValue> {
    Some(ConstValue::Complex(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => return None,
    }))
}

fn binary_string(mut a: Vec<u8>, op: BinaryOp, b: &[u8]) -> Option<ConstValue> {
    match op {
        BinaryOp::Add => {
            a.extend_from_slice(b);
            Some(ConstValue::String(a))
        }
        _ => None,
    }
}

fn binary_bool(a: bool, op: BinaryOp, b: bool) -> Option<ConstValue> {
    match op {
        BinaryOp::LogicalAnd => Some(ConstValue::Bool(a && b)),
        BinaryOp::LogicalOr => Some(ConstValue::Bool(a || b)),
        _ => None,
    }
}

fn fmt_rational(r: &BigRational, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if r.is_integer() {
        return write!(f, "{}", r.numer());
    }
    // Short decimal form only when it is exact.
    match r.to_f64() {
        Some(v) if BigRational::from_float(v).as_ref() == Some(r) => write!(f, "{}", v),
        _ => write!(f, "{}/{}", r.numer(), r.denom()),
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::String(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Float(r) => fmt_rational(r, f),
            ConstValue::Complex(c) => {
                write!(f, "(")?;
                fmt_rational(&c.re, f)?;
                if c.im.is_negative() {
                    write!(f, " - ")?;
                    fmt_rational(&-c.im.clone(), f)?;
                } else {
                    write!(f, " + ")?;
                    fmt_rational(&c.im, f)?;
                }
                write!(f, "i)")
            }
            ConstValue::Unknown => write!(f, "unknown"),
        }
    }
}
