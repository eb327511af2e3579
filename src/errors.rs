use crate::token::Span;
use crate::value::Kind;
use std::result;
use thiserror::Error;

/// Malformed input, reported before anything is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{span}: {message}")]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
}

impl SyntaxError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    pub fn expected(span: Span, expected: &str, found: &str) -> Self {
        Self::new(span, format!("expected '{}', found {}", expected, found))
    }

    pub fn unexpected_expected(span: Span, found: &str, expected: &str) -> Self {
        Self::new(
            span,
            format!("syntax error: unexpected {}, expected {}", found, expected),
        )
    }
}

/// Every failure the engine can report. The first one encountered wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("undefined: {0}")]
    UnknownIdentifier(String),

    #[error("{name}: {reason}")]
    Namespace { name: String, reason: String },

    #[error("invalid operation: operator {op} not defined on {}", describe_operands(.operands))]
    TypeMismatch { op: &'static str, operands: Vec<Kind> },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid shift count {0}")]
    InvalidShift(String),

    #[error("cannot represent {kind} constant as {target}")]
    NotRepresentable { kind: Kind, target: &'static str },
}

impl Error {
    pub(crate) fn namespace(name: &str, reason: &str) -> Self {
        Error::Namespace {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn mismatch(op: &'static str, operands: &[Kind]) -> Self {
        Error::TypeMismatch {
            op,
            operands: operands.to_vec(),
        }
    }

    pub(crate) fn not_representable(kind: Kind, target: &'static str) -> Self {
        Error::NotRepresentable { kind, target }
    }
}

fn describe_operands(kinds: &[Kind]) -> String {
    match kinds {
        [k] => format!("untyped {}", k),
        [l, r] if l == r => format!("untyped {}", l),
        [l, r] => format!("mismatched kinds untyped {} and untyped {}", l, r),
        _ => "operands".to_string(),
    }
}

pub type Result<T> = result::Result<T, Error>;
