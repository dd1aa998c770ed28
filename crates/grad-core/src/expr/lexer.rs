use crate::error::{GradError, GradResult, Span};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    /// Always a whole identifier: `exp` is never split into `e` and `xp`.
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number {n}"),
            Self::Ident(name) => format!("'{name}'"),
            Self::Plus => "'+'".into(),
            Self::Minus => "'-'".into(),
            Self::Star => "'*'".into(),
            Self::Slash => "'/'".into(),
            Self::Caret => "'^'".into(),
            Self::LeftParen => "'('".into(),
            Self::RightParen => "')'".into(),
        }
    }
}

pub(crate) fn lex(input: &str) -> GradResult<Vec<Token>> {
    let mut tokens = Vec::with_capacity(input.len() / 2 + 1);
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let mut end = start;
            let mut dots = 0;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() {
                    end = i + d.len_utf8();
                } else if d == '.' {
                    dots += 1;
                    end = i + 1;
                } else {
                    break;
                }
                chars.next();
            }
            let text = &input[start..end];
            let span = Span::new(start, end);
            if dots > 1 || text == "." {
                return Err(GradError::parse_at(format!("invalid number '{text}'"), span));
            }
            let value: f64 = text
                .parse()
                .map_err(|_| GradError::parse_at(format!("invalid number '{text}'"), span))?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                span,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Ident(input[start..end].to_string()),
                span: Span::new(start, end),
            });
            continue;
        }

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            other => {
                return Err(GradError::parse_at(
                    format!("unexpected character '{other}'"),
                    Span::new(start, start + other.len_utf8()),
                ))
            }
        };
        chars.next();
        tokens.push(Token {
            kind,
            span: Span::new(start, start + c.len_utf8()),
        });
    }

    Ok(tokens)
}
