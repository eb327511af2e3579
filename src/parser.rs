use crate::ast::*;
use crate::errors::SyntaxError;
use crate::lexer;
use crate::literal;
use crate::token::{Span, Token, TokenKind};
use crate::value::ConstValue;
use std::result;

type Result<T> = result::Result<T, SyntaxError>;

/// Deepest chain of unary operators or parentheses accepted.
pub const MAX_NESTING: usize = 100_000;

/// Lex and parse a complete expression.
pub fn parse_expr(source: &str) -> Result<ExprTree> {
    let tokens = lexer::tokenize(source)?;
    Parser::new(tokens).parse()
}

// Operators waiting for their operands.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Unary(Span, UnaryOp),
    Binary(Span, BinaryOp),
    Paren(Span),
}

/// Operator-precedence parser. Operands and pending operators are kept on
/// explicit stacks, so nesting depth costs heap rather than call stack.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    tree: ExprTree,
    operands: Vec<ExprId>,
    pending: Vec<Pending>,
}

impl Parser {
    /// `tokens` must end with an `Eof` token, as produced by `lexer::tokenize`.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, span, String::new()));
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            tree: ExprTree::new(),
            operands: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn curr(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn curr_kind(&self) -> TokenKind {
        self.curr().kind
    }

    fn curr_span(&self) -> Span {
        self.curr().span
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.curr_kind() == kind {
            let tok = self.curr().clone();
            self.advance();
            Ok(tok)
        } else {
            Err(SyntaxError::expected(
                self.curr_span(),
                kind.description(),
                &self.curr().found(),
            ))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError::new(
                self.curr_span(),
                "expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // Source = Expression EOF
    pub fn parse(mut self) -> Result<ExprTree> {
        self.parse_expression()?;
        if self.curr_kind() != TokenKind::Eof {
            return Err(SyntaxError::unexpected_expected(
                self.curr_span(),
                &self.curr().found(),
                "end of expression",
            ));
        }
        Ok(self.tree)
    }

    // Expression = UnaryExpr { binary_op UnaryExpr }
    // UnaryExpr  = { unary_op } Operand
    // Operand    = Literal | identifier | QualifiedIdent | "(" Expression ")"
    fn parse_expression(&mut self) -> Result<()> {
        loop {
            self.parse_prefixes()?;
            let operand = self.parse_operand()?;
            self.operands.push(operand);

            // Close every parenthesis that ends here, then look for an
            // operator to continue with.
            loop {
                self.reduce_unary();
                if let Some(op) = self.match_binary_op() {
                    let span = self.curr_span();
                    self.advance(); // binary_op
                    self.reduce_binary(precedence(op));
                    self.pending.push(Pending::Binary(span, op));
                    break;
                }
                self.reduce_binary(0);
                if !matches!(self.pending.last(), Some(Pending::Paren(_))) {
                    return Ok(());
                }
                self.expect(TokenKind::RParen)?;
                if let Some(Pending::Paren(span)) = self.pending.pop() {
                    let inner = self.pop_operand();
                    let id = self.tree.add(Expr::Paren(span, inner));
                    self.operands.push(id);
                    self.leave();
                }
            }
        }
    }

    // Queues unary operators and opening parentheses ahead of an operand.
    fn parse_prefixes(&mut self) -> Result<()> {
        loop {
            let span = self.curr_span();
            if let Some(op) = self.match_unary_op() {
                self.enter()?;
                self.advance(); // unary_op
                self.pending.push(Pending::Unary(span, op));
            } else if self.curr_kind() == TokenKind::LParen {
                self.enter()?;
                self.advance(); // (
                self.pending.push(Pending::Paren(span));
            } else {
                return Ok(());
            }
        }
    }

    fn reduce_unary(&mut self) {
        while let Some(&Pending::Unary(span, op)) = self.pending.last() {
            self.pending.pop();
            let operand = self.pop_operand();
            let id = self.tree.add(Expr::Unary(span, op, operand));
            self.operands.push(id);
            self.leave();
        }
    }

    // Binary operators are left-associative: everything pending at the same
    // or a tighter level is applied first.
    fn reduce_binary(&mut self, min_prec: u8) {
        while let Some(&Pending::Binary(span, op)) = self.pending.last() {
            if precedence(op) < min_prec {
                break;
            }
            self.pending.pop();
            let right = self.pop_operand();
            let left = self.pop_operand();
            let id = self.tree.add(Expr::Binary(span, left, op, right));
            self.operands.push(id);
        }
    }

    // Every pending operator was pushed after its left operand and is
    // reduced only after its right one, so the stack is never short.
    fn pop_operand(&mut self) -> ExprId {
        self.operands.pop().unwrap_or(ExprId::default())
    }

    fn match_binary_op(&self) -> Option<BinaryOp> {
        match self.curr_kind() {
            TokenKind::PipePipe => Some(BinaryOp::LogicalOr),
            TokenKind::AmpAmp => Some(BinaryOp::LogicalAnd),
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::Ne),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::Ge),
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Pipe => Some(BinaryOp::Or),
            TokenKind::Caret => Some(BinaryOp::Xor),
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            TokenKind::Shl => Some(BinaryOp::Shl),
            TokenKind::Shr => Some(BinaryOp::Shr),
            TokenKind::Amp => Some(BinaryOp::And),
            TokenKind::AmpCaret => Some(BinaryOp::AndNot),
            _ => None,
        }
    }

    fn match_unary_op(&self) -> Option<UnaryOp> {
        match self.curr_kind() {
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Caret => Some(UnaryOp::Complement),
            _ => None,
        }
    }

    fn parse_operand(&mut self) -> Result<ExprId> {
        let span = self.curr_span();
        let literal = self.curr().literal.clone();
        let value = match self.curr_kind() {
            TokenKind::Ident | TokenKind::QualifiedIdent => {
                self.advance(); // identifier
                return Ok(self.tree.add(Expr::Ident(span, Ident::parse(&literal))));
            }
            TokenKind::True => ConstValue::Bool(true),
            TokenKind::False => ConstValue::Bool(false),
            TokenKind::IntLit => literal::int_value(span, &literal)?,
            TokenKind::FloatLit => literal::float_value(span, &literal)?,
            TokenKind::ImagLit => literal::imag_value(span, &literal)?,
            TokenKind::RuneLit => literal::rune_value(span, &literal)?,
            TokenKind::StringLit => literal::string_value(span, &literal)?,
            _ => {
                return Err(SyntaxError::unexpected_expected(
                    span,
                    &self.curr().found(),
                    "expression",
                ));
            }
        };
        self.advance(); // literal
        Ok(self.tree.add(Expr::Literal(span, value)))
    }
}

// Go's binary operator precedence, loosest first.
fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::LogicalOr => 1,
        BinaryOp::LogicalAnd => 2,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 3,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
        BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Shl
        | BinaryOp::Shr
        | BinaryOp::And
        | BinaryOp::AndNot => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    // Prefix form of a parsed expression, e.g. `(+ 1 (* 2 3))`.
    fn render(tree: &ExprTree, id: ExprId) -> String {
        match tree.get(id) {
            Expr::Literal(_, v) => v.to_string(),
            Expr::Ident(_, i) => i.to_string(),
            Expr::Unary(_, op, e) => format!("({} {})", op.name(), render(tree, *e)),
            Expr::Binary(_, l, op, r) => {
                format!("({} {} {})", op.name(), render(tree, *l), render(tree, *r))
            }
            Expr::Paren(_, e) => format!("[{}]", render(tree, *e)),
        }
    }

    fn shape(src: &str) -> String {
        let tree = parse_expr(src).unwrap();
        render(&tree, tree.root().unwrap())
    }

    // Runs `f` on a fresh thread with the default stack size.
    fn on_thread<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        thread::spawn(f).join().unwrap()
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert_eq!(shape("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(shape("1 * 2 + 3"), "(+ (* 1 2) 3)");
    }

    #[test]
    fn shift_binds_like_multiplication() {
        assert_eq!(
            shape("1<<100 + 2 - 1<<100"),
            "(- (+ (<< 1 100) 2) (<< 1 100))"
        );
    }

    #[test]
    fn same_level_is_left_associative() {
        assert_eq!(shape("8 - 4 - 2"), "(- (- 8 4) 2)");
        assert_eq!(shape("8 / 4 % 3 * 2"), "(* (% (/ 8 4) 3) 2)");
    }

    #[test]
    fn binary_caret_is_additive_and_unary_caret_is_complement() {
        assert_eq!(shape("^1 ^ 2"), "(^ (^ 1) 2)");
    }

    #[test]
    fn unary_binds_tighter_than_any_binary_operator() {
        assert_eq!(shape("-1 * -2"), "(* (- 1) (- 2))");
        assert_eq!(shape("1 + -2 * 3"), "(+ 1 (* (- 2) 3))");
        assert_eq!(shape("!-+x"), "(! (- (+ x)))");
        assert_eq!(shape("-(1 + 2) * 3"), "(* (- [(+ 1 2)]) 3)");
    }

    #[test]
    fn logical_precedence() {
        assert_eq!(shape("true || false && true"), "(|| true (&& false true))");
        assert_eq!(shape("1 < 2 == true"), "(== (< 1 2) true)");
        assert_eq!(shape("a && b || c && d"), "(|| (&& a b) (&& c d))");
    }

    #[test]
    fn parentheses_group() {
        assert_eq!(shape("(1 + 2) * 3"), "(* [(+ 1 2)] 3)");
        assert_eq!(shape("((1))"), "[[1]]");
        assert_eq!(shape("2 * (3 - (4 + 5))"), "(* 2 [(- 3 [(+ 4 5)])])");
    }

    #[test]
    fn nodes_keep_their_token_positions() {
        let tree = parse_expr("x + -(y)").unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.get(root).span().offset, 2);
        let Expr::Binary(_, lhs, _, rhs) = tree.get(root) else {
            panic!("expected a binary node");
        };
        assert_eq!(tree.get(*lhs).span().offset, 0);
        assert_eq!(tree.get(*rhs).span().offset, 4);
        let Expr::Unary(_, _, paren) = tree.get(*rhs) else {
            panic!("expected a unary node");
        };
        assert_eq!(tree.get(*paren).span().offset, 5);
    }

    #[test]
    fn qualified_identifier_splits_at_dot() {
        let tree = parse_expr("time.D").unwrap();
        match tree.get(tree.root().unwrap()) {
            Expr::Ident(_, ident) => {
                assert_eq!(ident.qualifier.as_deref(), Some("time"));
                assert_eq!(ident.name, "D");
                assert_eq!(ident.to_string(), "time.D");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn errors_carry_offending_position() {
        let err = parse_expr("(1 + 2").unwrap_err();
        assert_eq!(err.span.offset, 6);
        assert!(err.message.contains("expected ')'"), "{}", err);

        let err = parse_expr("1 2").unwrap_err();
        assert_eq!(err.span.offset, 2);
        assert!(err.message.contains("end of expression"), "{}", err);

        let err = parse_expr("1 + * 2").unwrap_err();
        assert_eq!(err.span.offset, 4);

        let err = parse_expr("(1))").unwrap_err();
        assert_eq!(err.span.offset, 3);

        assert!(parse_expr("").is_err());
        assert!(parse_expr(")").is_err());
        assert!(parse_expr("()").is_err());
        assert!(parse_expr("1 +").is_err());
        assert!(parse_expr("-").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        on_thread(|| {
            let deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
            let err = parse_expr(&deep).unwrap_err();
            assert!(err.message.contains("nested too deeply"));
            assert_eq!(err.span.offset, MAX_NESTING);

            let unary = format!("{}1", "-".repeat(MAX_NESTING + 1));
            assert!(parse_expr(&unary).is_err());
        });
    }

    #[test]
    fn nesting_at_the_limit_parses() {
        let tree = on_thread(|| {
            let src = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
            parse_expr(&src).unwrap()
        });
        assert_eq!(tree.len(), MAX_NESTING + 1);

        let tree = on_thread(|| parse_expr(&format!("{}1", "-".repeat(MAX_NESTING))).unwrap());
        assert_eq!(tree.len(), MAX_NESTING + 1);

        // Parentheses and unary operators share one budget.
        let half = MAX_NESTING / 2;
        let src = format!("{}1{}", "-(".repeat(half), ")".repeat(half));
        assert!(on_thread(move || parse_expr(&src).is_ok()));
    }

    #[test]
    fn long_operator_chains_are_flat_to_parse() {
        let tree = on_thread(|| parse_expr(&format!("1{}", "+1".repeat(200_000))).unwrap());
        assert_eq!(tree.len(), 400_001);
        match tree.get(tree.root().unwrap()) {
            Expr::Binary(_, _, op, _) => assert_eq!(*op, BinaryOp::Add),
            other => panic!("unexpected {:?}", other),
        }
    }
}
