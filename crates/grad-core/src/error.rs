use std::fmt;

use thiserror::Error;

/// Byte range of a token in an expression, used to point at parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

impl fmt::Display for Span {
    /// 1-indexed, since it is shown to learners.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end <= self.start + 1 {
            write!(f, "at position {}", self.start + 1)
        } else {
            write!(f, "at positions {}-{}", self.start + 1, self.end)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradError {
    /// Missing or empty learner input, rejected before evaluation.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("parse error: {message}{}", span_suffix(.span))]
    Parse {
        message: String,
        span: Option<Span>,
    },

    /// The expression is well-formed but undefined at the requested point.
    #[error("domain error: {0}")]
    Domain(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// A session operation was invoked from a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl GradError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            span: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, span: Span) -> Self {
        Self::Parse {
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}

pub type GradResult<T> = Result<T, GradError>;

fn span_suffix(span: &Option<Span>) -> String {
    span.map(|s| format!(" {s}")).unwrap_or_default()
}
