use crate::error::{GradError, GradResult, Span};
use crate::expr::ast::{BinaryOp, Constant, Expr, Function, Variable};
use crate::expr::lexer::{Token, TokenKind};

// Binding powers, low to high. Unary minus sits between the multiplicative
// operators and `^`, so `-x^2` is `-(x^2)` and `-3*x` is `(-3)*x`.
const ADDITIVE: u8 = 1;
const MULTIPLICATIVE: u8 = 2;
const UNARY: u8 = 3;
const POWER: u8 = 4;

/// Deepest nesting of parentheses, signs, exponents and calls accepted.
const MAX_DEPTH: usize = 64;
/// Longest accepted token stream. Left-leaning chains such as `x+x+...+x`
/// grow the tree without nesting, so length is capped as well.
const MAX_TOKENS: usize = 1024;

/// Parse tokens into an AST using Pratt parsing.
pub(crate) fn parse_tokens(tokens: &[Token], input_len: usize) -> GradResult<Expr> {
    if tokens.is_empty() {
        return Err(GradError::parse("expression is empty"));
    }
    if tokens.len() > MAX_TOKENS {
        return Err(GradError::parse_at(
            format!("expression is too long (more than {MAX_TOKENS} tokens)"),
            tokens[MAX_TOKENS].span,
        ));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        input_len,
    };
    let expr = parser.parse_expr(0)?;

    match parser.current() {
        None => Ok(expr),
        Some(Token {
            kind: TokenKind::RightParen,
            span,
        }) => Err(GradError::parse_at("unbalanced ')'", *span)),
        Some(token) => Err(GradError::parse_at(
            format!(
                "unexpected {}; use '*' for multiplication",
                token.kind.describe()
            ),
            token.span,
        )),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    input_len: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn end_span(&self) -> Span {
        Span::at(self.input_len)
    }

    fn parse_expr(&mut self, min_precedence: u8) -> GradResult<Expr> {
        if self.depth >= MAX_DEPTH {
            let span = self.current().map_or_else(|| self.end_span(), |t| t.span);
            return Err(GradError::parse_at("expression is nested too deeply", span));
        }
        self.depth += 1;
        let result = self.parse_binary(min_precedence);
        self.depth -= 1;
        result
    }

    fn parse_binary(&mut self, min_precedence: u8) -> GradResult<Expr> {
        let mut left = self.parse_prefix()?;

        while let Some(token) = self.current() {
            let (op, precedence) = match token.kind {
                TokenKind::Plus => (BinaryOp::Add, ADDITIVE),
                TokenKind::Minus => (BinaryOp::Sub, ADDITIVE),
                TokenKind::Star => (BinaryOp::Mul, MULTIPLICATIVE),
                TokenKind::Slash => (BinaryOp::Div, MULTIPLICATIVE),
                TokenKind::Caret => (BinaryOp::Pow, POWER),
                _ => break,
            };

            if precedence < min_precedence {
                break;
            }
            self.advance();

            // `^` is right-associative and its exponent may carry a sign: 2^-1.
            let rhs = if op == BinaryOp::Pow {
                self.parse_expr(UNARY)?
            } else {
                self.parse_expr(precedence + 1)?
            };

            left = Expr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(rhs),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> GradResult<Expr> {
        let token = self.current().ok_or_else(|| {
            GradError::parse_at("unexpected end of expression", self.end_span())
        })?;

        match &token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(*n))
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr(UNARY)?;
                Ok(Expr::Neg(Box::new(operand)))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect_right_paren(token.span)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                self.parse_identifier(name, token.span)
            }
            other => Err(GradError::parse_at(
                format!("unexpected {}", other.describe()),
                token.span,
            )),
        }
    }

    fn parse_identifier(&mut self, name: &str, span: Span) -> GradResult<Expr> {
        match name {
            "x" => return Ok(Expr::Var(Variable::X)),
            "y" => return Ok(Expr::Var(Variable::Y)),
            "pi" | "π" => return Ok(Expr::Const(Constant::Pi)),
            "e" => return Ok(Expr::Const(Constant::E)),
            _ => {}
        }

        let func = Function::from_name(name)
            .ok_or_else(|| GradError::parse_at(format!("unknown identifier '{name}'"), span))?;

        match self.current() {
            Some(Token {
                kind: TokenKind::LeftParen,
                span: open,
            }) => {
                self.advance();
                let arg = self.parse_expr(0)?;
                self.expect_right_paren(*open)?;
                Ok(Expr::Call {
                    func,
                    arg: Box::new(arg),
                })
            }
            _ => Err(GradError::parse_at(
                format!("function '{name}' needs a parenthesized argument"),
                span,
            )),
        }
    }

    fn expect_right_paren(&mut self, open: Span) -> GradResult<()> {
        match self.current() {
            Some(Token {
                kind: TokenKind::RightParen,
                ..
            }) => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(GradError::parse_at(
                format!("expected ')' but found {}", token.kind.describe()),
                token.span,
            )),
            None => Err(GradError::parse_at("unbalanced '('", open)),
        }
    }
}
