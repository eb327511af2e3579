//! Literal decoding
//!
//! The lexer has already checked the digit layout of numeric literals;
//! these functions turn the raw text into exact values.

use crate::errors::SyntaxError;
use crate::token::Span;
use crate::value::ConstValue;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Num;
use std::iter::Peekable;
use std::result;
use std::str::Chars;

type Result<T> = result::Result<T, SyntaxError>;

pub fn int_value(span: Span, lit: &str) -> Result<ConstValue> {
    parse_int(lit)
        .map(ConstValue::Int)
        .ok_or_else(|| SyntaxError::new(span, format!("invalid integer literal {}", lit)))
}

fn parse_int(lit: &str) -> Option<BigInt> {
    let s = lit.replace('_', "");
    let lower = s.to_ascii_lowercase();
    if let Some(digits) = lower.strip_prefix("0x") {
        BigInt::from_str_radix(digits, 16).ok()
    } else if let Some(digits) = lower.strip_prefix("0o") {
        BigInt::from_str_radix(digits, 8).ok()
    } else if let Some(digits) = lower.strip_prefix("0b") {
        BigInt::from_str_radix(digits, 2).ok()
    } else if s.len() > 1 && s.starts_with('0') {
        BigInt::from_str_radix(&s[1..], 8).ok()
    } else {
        BigInt::from_str_radix(&s, 10).ok()
    }
}

/// Decimal float literal as an exact rational: `2.5` is 5/2.
pub fn float_value(span: Span, lit: &str) -> Result<ConstValue> {
    exact_decimal(span, lit).map(ConstValue::Float)
}

fn exact_decimal(span: Span, lit: &str) -> Result<BigRational> {
    let invalid = || SyntaxError::new(span, format!("invalid float literal {}", lit));
    let s = lit.replace('_', "");
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s.as_str(), ""),
    };
    let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let digits = format!("{}{}", whole, frac);
    let numer = BigInt::from_str_radix(&digits, 10).map_err(|_| invalid())?;

    let exp: i64 = if exponent.is_empty() {
        0
    } else {
        exponent.parse().map_err(|_| invalid())?
    };
    let scale = exp - frac.len() as i64;
    let power = u32::try_from(scale.unsigned_abs())
        .map_err(|_| SyntaxError::new(span, format!("exponent too large in {}", lit)))?;
    let factor = BigInt::from(10u32).pow(power);

    Ok(if scale >= 0 {
        BigRational::from_integer(numer * factor)
    } else {
        BigRational::new(numer, factor)
    })
}

/// `<number>i`; a leading-zero integer mantissa is decimal here.
pub fn imag_value(span: Span, lit: &str) -> Result<ConstValue> {
    let body = &lit[..lit.len() - 1];
    let lower = body.to_ascii_lowercase();
    let prefixed = ["0x", "0o", "0b"].iter().any(|p| lower.starts_with(p));

    let value = if prefixed {
        let i = parse_int(body).ok_or_else(|| {
            SyntaxError::new(span, format!("invalid imaginary literal {}", lit))
        })?;
        BigRational::from_integer(i)
    } else {
        exact_decimal(span, body)?
    };
    Ok(ConstValue::imag(value))
}

pub fn string_value(span: Span, lit: &str) -> Result<ConstValue> {
    if let Some(raw) = lit.strip_prefix('`') {
        let body = raw.strip_suffix('`').unwrap_or(raw);
        let bytes = body.bytes().filter(|&b| b != b'\r').collect();
        return Ok(ConstValue::String(bytes));
    }

    let body = &lit[1..lit.len() - 1];
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }
        match unescape(span, &mut chars, '"')? {
            Unescaped::Byte(b) => out.push(b),
            Unescaped::Char(c) => push_char(&mut out, c),
        }
    }
    Ok(ConstValue::String(out))
}

/// Rune literals are integer constants holding the code point.
pub fn rune_value(span: Span, lit: &str) -> Result<ConstValue> {
    let body = &lit[1..lit.len() - 1];
    let mut chars = body.chars().peekable();
    let value = match chars.next() {
        None => return Err(SyntaxError::new(span, "empty rune literal or unescaped ' in rune literal")),
        Some('\\') => match unescape(span, &mut chars, '\'')? {
            Unescaped::Byte(b) => u32::from(b),
            Unescaped::Char(c) => u32::from(c),
        },
        Some(c) => u32::from(c),
    };
    if chars.next().is_some() {
        return Err(SyntaxError::new(span, "more than one character in rune literal"));
    }
    Ok(ConstValue::Int(BigInt::from(value)))
}

enum Unescaped {
    Byte(u8),
    Char(char),
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

// Decodes the escape following a backslash.
fn unescape(span: Span, chars: &mut Peekable<Chars<'_>>, quote: char) -> Result<Unescaped> {
    let Some(c) = chars.next() else {
        return Err(SyntaxError::new(span, "escape sequence not terminated"));
    };
    let simple = match c {
        'a' => Some('\x07'),
        'b' => Some('\x08'),
        'f' => Some('\x0c'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0b'),
        '\\' => Some('\\'),
        c if c == quote => Some(c),
        _ => None,
    };
    if let Some(ch) = simple {
        return Ok(Unescaped::Char(ch));
    }

    let (count, radix) = match c {
        '0'..='7' => (2, 8),
        'x' => (2, 16),
        'u' => (4, 16),
        'U' => (8, 16),
        _ => {
            return Err(SyntaxError::new(span, format!("unknown escape sequence \\{}", c)));
        }
    };

    let mut value = if radix == 8 { c.to_digit(8).unwrap_or(0) } else { 0 };
    for _ in 0..count {
        let digit = chars.next().and_then(|d| d.to_digit(radix)).ok_or_else(|| {
            SyntaxError::new(span, format!("illegal character in escape sequence \\{}", c))
        })?;
        value = value * radix + digit;
    }

    match c {
        '0'..='7' | 'x' => u8::try_from(value)
            .map(Unescaped::Byte)
            .map_err(|_| SyntaxError::new(span, "octal escape value > 255")),
        _ => char::from_u32(value)
            .map(Unescaped::Char)
            .ok_or_else(|| SyntaxError::new(span, "escape sequence is invalid Unicode code point")),
    }
}
