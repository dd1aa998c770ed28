//! Restricted expression language for learner answers.
//!
//! Grammar, lowest precedence first: `+ -`, `* /`, unary `-`, `^`
//! (right-associative), then literals, `x`, `y`, `pi`/`π`, `e`, parenthesized
//! groups and calls to `sin cos tan sqrt exp abs`.
//!
//! Input is tokenized into whole identifiers before anything is resolved, so
//! the constant `e` never leaks into names such as `exp` or `sqrt`.

mod ast;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Constant, Expr, Function, Variable};

use tracing::debug;

use crate::error::{GradError, GradResult};
use crate::geometry::Point;

/// Parse an expression into an AST without evaluating it.
pub fn parse(input: &str) -> GradResult<Expr> {
    if input.trim().is_empty() {
        return Err(GradError::parse("expression is empty"));
    }
    let tokens = lexer::lex(input)?;
    parser::parse_tokens(&tokens, input.len())
}

/// Parse and evaluate `input` with `x` and `y` bound to the coordinates of `point`.
pub fn evaluate(input: &str, point: Point) -> GradResult<f64> {
    let result = parse(input).and_then(|expr| expr.eval(point));
    if let Err(e) = &result {
        debug!("evaluating {input:?} at {point}: {e}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_linear_combination() {
        assert_eq!(evaluate("2*x+3*y", at(1.0, 2.0)).unwrap(), 8.0);
    }

    #[test]
    fn test_exp_is_not_corrupted_by_e() {
        assert_eq!(evaluate("exp(x)", at(0.0, 0.0)).unwrap(), 1.0);
    }

    #[test]
    fn test_constant_e() {
        assert!(close(evaluate("e", at(0.0, 0.0)).unwrap(), std::f64::consts::E));
        assert!(close(
            evaluate("e^x - exp(x)", at(1.3, 0.0)).unwrap(),
            0.0
        ));
    }

    #[test]
    fn test_pi_spellings() {
        let a = evaluate("pi", at(0.0, 0.0)).unwrap();
        let b = evaluate("π", at(0.0, 0.0)).unwrap();
        assert_eq!(a, b);
        assert!(close(a, std::f64::consts::PI));
    }

    #[test]
    fn test_all_functions() {
        let p = at(0.5, -2.0);
        assert!(close(evaluate("sin(x)", p).unwrap(), 0.5f64.sin()));
        assert!(close(evaluate("cos(x)", p).unwrap(), 0.5f64.cos()));
        assert!(close(evaluate("tan(x)", p).unwrap(), 0.5f64.tan()));
        assert!(close(evaluate("sqrt(x)", p).unwrap(), 0.5f64.sqrt()));
        assert!(close(evaluate("exp(y)", p).unwrap(), (-2.0f64).exp()));
        assert_eq!(evaluate("abs(y)", p).unwrap(), 2.0);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("1 + 2 * 3", at(0.0, 0.0)).unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3", at(0.0, 0.0)).unwrap(), 9.0);
        assert_eq!(evaluate("-x^2", at(3.0, 0.0)).unwrap(), -9.0);
        assert_eq!(evaluate("2^3^2", at(0.0, 0.0)).unwrap(), 512.0);
        assert_eq!(evaluate("8/4/2", at(0.0, 0.0)).unwrap(), 1.0);
        assert_eq!(evaluate("2*-3*x", at(1.0, 0.0)).unwrap(), -6.0);
    }

    #[test]
    fn test_nested_calls() {
        let v = evaluate("2*cos(2*x)*sin(y)", at(0.0, std::f64::consts::FRAC_PI_2)).unwrap();
        assert!(close(v, 2.0));
    }

    #[test]
    fn test_division_by_zero_is_domain_error() {
        assert!(evaluate("1/x", at(0.0, 0.0)).unwrap_err().is_domain());
    }

    #[test]
    fn test_unclosed_call_is_parse_error() {
        assert!(evaluate("sin(", at(0.0, 0.0)).unwrap_err().is_parse());
    }

    #[test]
    fn test_even_root_of_negative_is_domain_error() {
        assert!(evaluate("sqrt(y)", at(0.0, -1.0)).unwrap_err().is_domain());
        assert!(evaluate("y^0.5", at(0.0, -1.0)).unwrap_err().is_domain());
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(evaluate("", at(0.0, 0.0)).unwrap_err().is_parse());
        assert!(evaluate("   ", at(0.0, 0.0)).unwrap_err().is_parse());
    }

    #[test]
    fn test_identifiers_are_case_sensitive() {
        assert!(evaluate("X", at(1.0, 1.0)).unwrap_err().is_parse());
        assert!(evaluate("Sin(x)", at(1.0, 1.0)).unwrap_err().is_parse());
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(evaluate("  2 *  x ", at(4.0, 0.0)).unwrap(), 8.0);
    }
}
