use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// `ns.name`, kept whole until evaluation
    QualifiedIdent,
    IntLit,
    FloatLit,
    ImagLit,
    RuneLit,
    StringLit,

    True,
    False,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AmpCaret,

    AmpAmp,
    PipePipe,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    LParen,
    RParen,

    Bang,

    Eof,
}

impl TokenKind {
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        match s {
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            _ => None,
        }
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::ImagLit
                | TokenKind::RuneLit
                | TokenKind::StringLit
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::QualifiedIdent => "qualified identifier",
            TokenKind::IntLit => "integer literal",
            TokenKind::FloatLit => "float literal",
            TokenKind::ImagLit => "imaginary literal",
            TokenKind::RuneLit => "rune literal",
            TokenKind::StringLit => "string literal",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::AmpCaret => "&^",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Bang => "!",
            TokenKind::Eof => "EOF",
        }
    }
}

/// Source position; `offset` is a byte index, `line`/`col` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(offset: usize, line: usize, col: usize) -> Self {
        Self { offset, line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, literal: String) -> Self {
        Self {
            kind,
            span,
            literal,
        }
    }

    /// Text used when this token shows up in an error message.
    pub fn found(&self) -> String {
        if self.kind == TokenKind::Eof {
            "EOF".to_string()
        } else if self.kind.is_literal() {
            format!("literal {}", self.literal)
        } else if matches!(self.kind, TokenKind::Ident | TokenKind::QualifiedIdent) {
            format!("name {}", self.literal)
        } else {
            self.literal.clone()
        }
    }
}
