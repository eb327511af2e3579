use crate::errors::SyntaxError;
use crate::token::{Span, Token, TokenKind};
use std::result;

type Result<T> = result::Result<T, SyntaxError>;

/// Split `source` into tokens, ending with a single `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_char_at(&self, pos: usize) -> Option<char> {
        self.source.get(pos..).and_then(|s| s.chars().next())
    }

    fn span(&self) -> Span {
        Span::new(self.pos, self.line, self.col)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_ahead(1) == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_ahead(1) == Some(b'*') => {
                    let span = self.span();
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(ch) = self.advance() {
                        if ch == '*' && self.peek() == Some(b'/') {
                            self.advance();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(SyntaxError::new(span, "comment not terminated"));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_name(&mut self) {
        self.advance();
        while let Some(ch) = self.peek_char() {
            if is_ident_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }

    // Identifiers may carry one qualifier: `ns.name`.
    fn scan_identifier(&mut self, span: Span) -> Result<Token> {
        self.scan_name();
        let mut kind = TokenKind::Ident;

        if self.peek() == Some(b'.') && self.peek_char_at(self.pos + 1).is_some_and(is_ident_start)
        {
            self.advance(); // .
            self.scan_name();
            kind = TokenKind::QualifiedIdent;

            if self.peek() == Some(b'.')
                && self.peek_char_at(self.pos + 1).is_some_and(is_ident_start)
            {
                return Err(SyntaxError::new(
                    self.span(),
                    format!(
                        "nested selector on {} is not supported",
                        &self.source[span.offset..self.pos]
                    ),
                ));
            }
        }

        let literal = &self.source[span.offset..self.pos];
        if kind == TokenKind::Ident {
            kind = TokenKind::from_keyword(literal).unwrap_or(TokenKind::Ident);
        }
        Ok(Token::new(kind, span, literal.to_string()))
    }

    // Consumes decimal digits and separators, returning the first digit
    // that is not valid in `base`.
    fn scan_digits(&mut self, base: u32) -> Option<(Span, char)> {
        let mut invalid = None;
        while let Some(ch) = self.peek() {
            let is_digit = if base == 16 {
                ch.is_ascii_hexdigit()
            } else {
                ch.is_ascii_digit()
            };
            if !is_digit && ch != b'_' {
                break;
            }
            if invalid.is_none() && ch != b'_' && (ch as char).to_digit(base).is_none() {
                invalid = Some((self.span(), ch as char));
            }
            self.advance();
        }
        invalid
    }

    fn scan_number(&mut self, span: Span) -> Result<Token> {
        let mut base = 10;
        let mut prefix = None;
        let mut is_float = false;
        let mut invalid_digit = None;

        if self.peek() != Some(b'.') {
            if self.peek() == Some(b'0') {
                self.advance();
                match self.peek().map(|c| c.to_ascii_lowercase()) {
                    Some(b'x') => {
                        self.advance();
                        base = 16;
                        prefix = Some('x');
                    }
                    Some(b'o') => {
                        self.advance();
                        base = 8;
                        prefix = Some('o');
                    }
                    Some(b'b') => {
                        self.advance();
                        base = 2;
                        prefix = Some('b');
                    }
                    _ => {
                        base = 8;
                        prefix = Some('0');
                    }
                }
            }

            let digits_start = self.pos;
            invalid_digit = self.scan_digits(base);
            if matches!(prefix, Some('x' | 'o' | 'b')) && self.pos == digits_start {
                return Err(SyntaxError::new(
                    span,
                    format!("{} literal has no digits", base_name(base)),
                ));
            }
        }

        if self.peek() == Some(b'.') {
            if matches!(prefix, Some('x' | 'o' | 'b')) {
                return Err(SyntaxError::new(
                    self.span(),
                    format!("invalid radix point in {} literal", base_name(base)),
                ));
            }
            is_float = true;
            self.advance(); // .
            self.scan_digits(10);
        }

        match self.peek().map(|c| c.to_ascii_lowercase()) {
            Some(b'e') if prefix != Some('x') => {
                if matches!(prefix, Some('o' | 'b')) {
                    return Err(SyntaxError::new(
                        self.span(),
                        "'e' exponent requires decimal mantissa",
                    ));
                }
                is_float = true;
                self.advance(); // e
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.advance();
                }
                let exp_start = self.pos;
                self.scan_digits(10);
                if self.pos == exp_start {
                    return Err(SyntaxError::new(self.span(), "exponent has no digits"));
                }
            }
            Some(b'p') if prefix == Some('x') => {
                return Err(SyntaxError::new(
                    self.span(),
                    "hexadecimal floating-point literals are not supported",
                ));
            }
            _ => {}
        }

        let kind = if self.peek() == Some(b'i') {
            self.advance();
            TokenKind::ImagLit
        } else if is_float {
            TokenKind::FloatLit
        } else {
            TokenKind::IntLit
        };

        // A leading-zero literal is octal only when it stays an integer.
        let report_digit = match prefix {
            Some('0') => kind == TokenKind::IntLit,
            Some(_) => true,
            None => false,
        };
        if report_digit && let Some((at, ch)) = invalid_digit {
            return Err(SyntaxError::new(
                at,
                format!("invalid digit '{}' in {} literal", ch, base_name(base)),
            ));
        }

        let literal = &self.source[span.offset..self.pos];
        if let Some(i) = invalid_separator(literal) {
            return Err(SyntaxError::new(
                Span::new(span.offset + i, span.line, span.col + i),
                "'_' must separate successive digits",
            ));
        }
        Ok(Token::new(kind, span, literal.to_string()))
    }

    fn scan_quoted(&mut self, span: Span, quote: char, kind: TokenKind) -> Result<Token> {
        self.advance(); // opening quote
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    let what = if quote == '\'' { "rune" } else { "string" };
                    return Err(SyntaxError::new(
                        span,
                        format!("{} literal not terminated", what),
                    ));
                }
                Some('\\') => {
                    self.advance();
                    if self.peek_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some(ch) => {
                    self.advance();
                    if ch == quote {
                        break;
                    }
                }
            }
        }
        let literal = &self.source[span.offset..self.pos];
        Ok(Token::new(kind, span, literal.to_string()))
    }

    fn scan_raw_string(&mut self, span: Span) -> Result<Token> {
        self.advance(); // `
        loop {
            match self.advance() {
                None => return Err(SyntaxError::new(span, "raw string literal not terminated")),
                Some('`') => break,
                Some(_) => {}
            }
        }
        let literal = &self.source[span.offset..self.pos];
        Ok(Token::new(TokenKind::StringLit, span, literal.to_string()))
    }

    fn make_token(&mut self, kind: TokenKind, span: Span, len: usize) -> Token {
        for _ in 0..len {
            self.advance();
        }
        Token::new(kind, span, kind.description().to_string())
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments()?;

        let span = self.span();
        let Some(ch) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, span, String::new()));
        };
        let next = self.peek_ahead(1);

        let token = match ch {
            c if is_ident_start(c) => return self.scan_identifier(span),
            '0'..='9' => return self.scan_number(span),
            '.' if next.is_some_and(|c| c.is_ascii_digit()) => return self.scan_number(span),
            '"' => return self.scan_quoted(span, '"', TokenKind::StringLit),
            '\'' => return self.scan_quoted(span, '\'', TokenKind::RuneLit),
            '`' => return self.scan_raw_string(span),
            '+' => self.make_token(TokenKind::Plus, span, 1),
            '-' => self.make_token(TokenKind::Minus, span, 1),
            '*' => self.make_token(TokenKind::Star, span, 1),
            '/' => self.make_token(TokenKind::Slash, span, 1),
            '%' => self.make_token(TokenKind::Percent, span, 1),
            '&' => match next {
                Some(b'&') => self.make_token(TokenKind::AmpAmp, span, 2),
                Some(b'^') => self.make_token(TokenKind::AmpCaret, span, 2),
                _ => self.make_token(TokenKind::Amp, span, 1),
            },
            '|' => match next {
                Some(b'|') => self.make_token(TokenKind::PipePipe, span, 2),
                _ => self.make_token(TokenKind::Pipe, span, 1),
            },
            '^' => self.make_token(TokenKind::Caret, span, 1),
            '<' => match next {
                Some(b'<') => self.make_token(TokenKind::Shl, span, 2),
                Some(b'=') => self.make_token(TokenKind::LtEq, span, 2),
                _ => self.make_token(TokenKind::Lt, span, 1),
            },
            '>' => match next {
                Some(b'>') => self.make_token(TokenKind::Shr, span, 2),
                Some(b'=') => self.make_token(TokenKind::GtEq, span, 2),
                _ => self.make_token(TokenKind::Gt, span, 1),
            },
            '=' if next == Some(b'=') => self.make_token(TokenKind::EqEq, span, 2),
            '!' => match next {
                Some(b'=') => self.make_token(TokenKind::NotEq, span, 2),
                _ => self.make_token(TokenKind::Bang, span, 1),
            },
            '(' => self.make_token(TokenKind::LParen, span, 1),
            ')' => self.make_token(TokenKind::RParen, span, 1),
            other => {
                return Err(SyntaxError::new(
                    span,
                    format!("invalid character {:?}", other),
                ));
            }
        };
        Ok(token)
    }
}

fn base_name(base: u32) -> &'static str {
    match base {
        16 => "hexadecimal",
        8 => "octal",
        2 => "binary",
        _ => "decimal",
    }
}

// Index of the first misplaced '_' in a numeric literal. A base prefix
// counts as a digit, so `0x_ff` is fine but `1__0` and `1_` are not.
fn invalid_separator(lit: &str) -> Option<usize> {
    let x = lit.as_bytes();
    let mut hex = false;
    let mut prev_class = b'.';
    let mut i = 0;

    if x.len() >= 2 && x[0] == b'0' {
        let p = x[1].to_ascii_lowercase();
        if matches!(p, b'x' | b'o' | b'b') {
            hex = p == b'x';
            prev_class = b'0';
            i = 2;
        }
    }

    while i < x.len() {
        let p = prev_class;
        let d = x[i];
        if d == b'_' {
            if p != b'0' {
                return Some(i);
            }
            prev_class = b'_';
        } else if d.is_ascii_digit() || (hex && d.is_ascii_hexdigit()) {
            prev_class = b'0';
        } else {
            if p == b'_' {
                return Some(i - 1);
            }
            prev_class = b'.';
        }
        i += 1;
    }

    if prev_class == b'_' {
        Some(x.len() - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn operators_take_longest_match() {
        assert_eq!(
            kinds("a &^ b << 2 >= c && !d"),
            vec![
                TokenKind::Ident,
                TokenKind::AmpCaret,
                TokenKind::Ident,
                TokenKind::Shl,
                TokenKind::IntLit,
                TokenKind::GtEq,
                TokenKind::Ident,
                TokenKind::AmpAmp,
                TokenKind::Bang,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn qualified_identifier_is_one_token() {
        let tokens = tokenize("2*time.D").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::QualifiedIdent);
        assert_eq!(tokens[2].literal, "time.D");
        assert_eq!(tokens[2].span.offset, 2);
    }

    #[test]
    fn nested_selector_is_rejected() {
        let err = tokenize("a.b.c").unwrap_err();
        assert!(err.message.contains("nested selector"), "{}", err);
    }

    #[test]
    fn numeric_literal_forms() {
        assert_eq!(
            kinds("0777 0xFF 0b1010 0o17 2.5 .5 1. 1e3 2i 1.5i 1_000"),
            vec![
                TokenKind::IntLit,
                TokenKind::IntLit,
                TokenKind::IntLit,
                TokenKind::IntLit,
                TokenKind::FloatLit,
                TokenKind::FloatLit,
                TokenKind::FloatLit,
                TokenKind::FloatLit,
                TokenKind::ImagLit,
                TokenKind::ImagLit,
                TokenKind::IntLit,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn leading_zero_decimal_float_is_allowed() {
        assert_eq!(kinds("09.5")[0], TokenKind::FloatLit);
        assert_eq!(kinds("09i")[0], TokenKind::ImagLit);
    }

    #[test]
    fn malformed_numbers() {
        assert!(tokenize("09").unwrap_err().message.contains("invalid digit '9'"));
        assert!(tokenize("0b102").unwrap_err().message.contains("binary"));
        assert!(tokenize("0x").unwrap_err().message.contains("no digits"));
        assert!(tokenize("1e+").unwrap_err().message.contains("exponent"));
        assert!(tokenize("1__0").unwrap_err().message.contains("'_'"));
        assert!(tokenize("1_").unwrap_err().message.contains("'_'"));
        assert!(tokenize("0x_ff").is_ok());
        assert!(tokenize("0b1e3").unwrap_err().message.contains("decimal mantissa"));
    }

    #[test]
    fn keywords_and_comments() {
        assert_eq!(
            kinds("true /* both */ || false // done"),
            vec![
                TokenKind::True,
                TokenKind::PipePipe,
                TokenKind::False,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_literals() {
        assert!(tokenize("\"abc").unwrap_err().message.contains("not terminated"));
        assert!(tokenize("`abc").unwrap_err().message.contains("not terminated"));
        assert!(tokenize("'a").unwrap_err().message.contains("not terminated"));
        assert!(tokenize("/* open").unwrap_err().message.contains("comment"));
    }

    #[test]
    fn invalid_character_reports_position() {
        let err = tokenize("1 +\n  $").unwrap_err();
        assert_eq!(err.span, Span::new(6, 2, 3));
        assert!(err.message.contains("invalid character"));
    }
}
