//! Expression evaluation

use crate::ast::{BinaryOp, Expr, ExprId, ExprTree, UnaryOp};
use crate::errors::{Error, Result, SyntaxError};
use crate::parser;
use crate::scope::Scope;
use crate::value::ConstValue;
use tracing::trace;

/// Parse `source` and evaluate it against `scope`.
pub fn evaluate(source: &str, scope: &Scope) -> Result<ConstValue> {
    let tree = parser::parse_expr(source)?;
    let value = Evaluator::new(scope).evaluate(&tree)?;
    trace!("evaluated {:?} to {} constant {}", source, value.kind(), value);
    Ok(value)
}

// Work left to do. Operands are computed onto the value stack before the
// task that consumes them runs.
#[derive(Debug, Clone, Copy)]
enum Task {
    Visit(ExprId),
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// Left operand of `&&`/`||` is on the stack; the right one is pending.
    Logical(BinaryOp, ExprId),
}

/// Walks an expression tree, resolving names through a scope.
///
/// Operands are evaluated left to right and the first error stops the
/// walk. Explicit stacks stand in for recursion, so arbitrarily long
/// operator chains evaluate in constant call-stack space.
pub struct Evaluator<'s> {
    scope: &'s Scope,
}

impl<'s> Evaluator<'s> {
    pub fn new(scope: &'s Scope) -> Self {
        Self { scope }
    }

    pub fn evaluate(&self, tree: &ExprTree) -> Result<ConstValue> {
        let Some(root) = tree.root() else {
            return Err(SyntaxError::new(Default::default(), "empty expression").into());
        };
        let mut tasks = vec![Task::Visit(root)];
        let mut values: Vec<ConstValue> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(id) => match tree.get(id) {
                    Expr::Literal(_, value) => values.push(value.clone()),
                    Expr::Ident(_, ident) => values.push(self.scope.resolve(ident)?),
                    Expr::Paren(_, inner) => tasks.push(Task::Visit(*inner)),
                    Expr::Unary(_, op, operand) => {
                        tasks.push(Task::Unary(*op));
                        tasks.push(Task::Visit(*operand));
                    }
                    Expr::Binary(_, lhs, op, rhs) if is_logical(*op) => {
                        tasks.push(Task::Logical(*op, *rhs));
                        tasks.push(Task::Visit(*lhs));
                    }
                    Expr::Binary(_, lhs, op, rhs) => {
                        tasks.push(Task::Binary(*op));
                        tasks.push(Task::Visit(*rhs));
                        tasks.push(Task::Visit(*lhs));
                    }
                },
                Task::Unary(op) => {
                    let operand = pop(&mut values);
                    values.push(operand.unary_op(op)?);
                }
                Task::Binary(op) => {
                    let right = pop(&mut values);
                    let left = pop(&mut values);
                    values.push(left.binary_op(op, &right)?);
                }
                Task::Logical(op, rhs) => {
                    let left = pop(&mut values);
                    let ConstValue::Bool(l) = left else {
                        return Err(Error::mismatch(op.name(), &[left.kind()]));
                    };
                    // The right operand is only evaluated when the left one
                    // does not already decide the result.
                    let decided = match op {
                        BinaryOp::LogicalAnd => !l,
                        _ => l,
                    };
                    values.push(left);
                    if !decided {
                        tasks.push(Task::Binary(op));
                        tasks.push(Task::Visit(rhs));
                    }
                }
            }
        }
        Ok(pop(&mut values))
    }
}

fn is_logical(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
}

// Tasks are scheduled after the visits that produce their operands, so the
// stack always holds them.
fn pop(values: &mut Vec<ConstValue>) -> ConstValue {
    values.pop().unwrap_or(ConstValue::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;
    use num_bigint::BigInt;

    fn eval(src: &str) -> Result<ConstValue> {
        evaluate(src, &Scope::new())
    }

    #[test]
    fn literal_forms() {
        for (src, want) in [
            ("0777", 511),
            ("0xFF", 255),
            ("0b1010 ^ 0b0101", 15),
            ("0xFF - 0b11111110", 1),
            ("'a' + 1", 98),
        ] {
            assert_eq!(eval(src).unwrap(), ConstValue::Int(BigInt::from(want)), "{}", src);
        }
    }

    #[test]
    fn exact_big_arithmetic() {
        assert_eq!(
            eval("1<<100 + 2 - 1<<100").unwrap(),
            ConstValue::Int(BigInt::from(2))
        );
    }

    #[test]
    fn short_circuit_skips_right_operand() {
        assert_eq!(eval("false && undefinedVar").unwrap(), ConstValue::Bool(false));
        assert_eq!(eval("true || 1/0 == 1").unwrap(), ConstValue::Bool(true));
        assert_eq!(
            eval("true && undefinedVar"),
            Err(Error::UnknownIdentifier("undefinedVar".to_string()))
        );
    }

    #[test]
    fn logical_operands_must_be_bool() {
        assert!(matches!(
            eval("1 && true"),
            Err(Error::TypeMismatch { op: "&&", .. })
        ));
        assert!(matches!(
            eval("false || 1"),
            Err(Error::TypeMismatch { op: "||", .. })
        ));
    }

    #[test]
    fn first_error_wins() {
        assert_eq!(eval("1/0 + x"), Err(Error::DivisionByZero));
        assert_eq!(
            eval("x + 1/0"),
            Err(Error::UnknownIdentifier("x".to_string()))
        );
    }

    #[test]
    fn unary_operators() {
        assert_eq!(eval("-(3)").unwrap(), ConstValue::Int(BigInt::from(-3)));
        assert_eq!(eval("!true").unwrap(), ConstValue::Bool(false));
        assert_eq!(eval("^0").unwrap(), ConstValue::Int(BigInt::from(-1)));
        assert_eq!(
            eval("-\"s\""),
            Err(Error::TypeMismatch {
                op: "-",
                operands: vec![Kind::String]
            })
        );
        assert!(eval("^1.5").is_err());
    }

    #[test]
    fn comparisons_yield_bool() {
        assert_eq!(eval("1 < 1.5").unwrap(), ConstValue::Bool(true));
        assert_eq!(eval("\"abc\" >= \"abd\"").unwrap(), ConstValue::Bool(false));
        assert_eq!(eval("2i == 2i").unwrap(), ConstValue::Bool(true));
        assert!(eval("true == 1").is_err());
    }

    #[test]
    fn syntax_errors_are_wrapped() {
        assert!(matches!(eval("1 +"), Err(Error::Syntax(_))));
    }

    #[test]
    fn repeated_evaluation_is_deterministic() {
        let src = "(1<<70) / 3 + 2.5 * 1i";
        assert_eq!(eval(src).unwrap(), eval(src).unwrap());
    }

    fn on_thread<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::spawn(f).join().unwrap()
    }

    #[test]
    fn long_chains_evaluate_on_a_default_stack() {
        let sum = on_thread(|| eval(&format!("1{}", "+1".repeat(200_000))));
        assert_eq!(sum.unwrap(), ConstValue::Int(BigInt::from(200_001)));

        let product = on_thread(|| eval(&format!("1{}", " * 2 / 2".repeat(100_000))));
        assert_eq!(product.unwrap(), ConstValue::Int(BigInt::from(1)));

        let all = on_thread(|| eval(&format!("true{}", " && 1 < 2".repeat(100_000))));
        assert_eq!(all.unwrap(), ConstValue::Bool(true));

        // Short-circuits on the first operand, so the unknown names are never looked up.
        let none = on_thread(|| eval(&format!("false{}", " && x".repeat(100_000))));
        assert_eq!(none.unwrap(), ConstValue::Bool(false));
    }

    #[test]
    fn deep_nesting_evaluates_on_a_default_stack() {
        let parens = on_thread(|| {
            let n = parser::MAX_NESTING;
            eval(&format!("{}7{}", "(".repeat(n), ")".repeat(n)))
        });
        assert_eq!(parens.unwrap(), ConstValue::Int(BigInt::from(7)));

        // An even number of negations cancels out.
        let negations = on_thread(|| eval(&format!("{}7", "-".repeat(parser::MAX_NESTING))));
        assert_eq!(negations.unwrap(), ConstValue::Int(BigInt::from(7)));

        let half = parser::MAX_NESTING / 2;
        let mixed = on_thread(move || eval(&format!("{}7{}", "-(".repeat(half), ")".repeat(half))));
        assert_eq!(mixed.unwrap(), ConstValue::Int(BigInt::from(7)));

        let right_leaning = on_thread(move || {
            eval(&format!("{}1{}", "1 + (".repeat(half), ")".repeat(half)))
        });
        assert_eq!(
            right_leaning.unwrap(),
            ConstValue::Int(BigInt::from(half + 1))
        );
    }
}
