use crate::token::Span;
use crate::value::ConstValue;
use std::fmt;

/// Index of a node in an `ExprTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Span, ConstValue),
    Ident(Span, Ident),
    Unary(Span, UnaryOp, ExprId),
    Binary(Span, ExprId, BinaryOp, ExprId),
    Paren(Span, ExprId),
}

/// A parsed expression. Nodes live in one flat table and refer to their
/// operands by `ExprId`, so neither building nor dropping a tree recurses
/// on its depth.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExprTree {
    nodes: Vec<Expr>,
}

impl ExprTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr);
        id
    }

    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    /// The last node added, which is the whole expression once parsing
    /// has finished.
    pub fn root(&self) -> Option<ExprId> {
        self.nodes.len().checked_sub(1).map(|i| ExprId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Possibly qualified name; resolved against a scope only at evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>,
    pub name: String,
}

impl Ident {
    pub fn parse(text: &str) -> Self {
        match text.split_once('.') {
            Some((ns, name)) => Self {
                qualifier: Some(ns.to_string()),
                name: name.to_string(),
            },
            None => Self {
                qualifier: None,
                name: text.to_string(),
            },
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(ns) => write!(f, "{}.{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LogicalOr,
    LogicalAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    And,
    AndNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    /// Bitwise complement, `^x`
    Complement,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(s, _) => *s,
            Expr::Ident(s, _) => *s,
            Expr::Unary(s, _, _) => *s,
            Expr::Binary(s, _, _, _) => *s,
            Expr::Paren(s, _) => *s,
        }
    }
}

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::AndNot => "&^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }
}

impl UnaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Complement => "^",
        }
    }
}
