//! Collected signature diagnostics and the combined error message.

use chumsky::error::Simple;

use crate::span::Span;
use crate::token::Token;

/// A located error found while lexing, parsing, or validating a
/// signature. All errors for one signature are collected and reported
/// together.
#[derive(Debug, Clone)]
pub struct SignatureError {
    pub span: Span,
    pub message: String,
}

impl SignatureError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    /// Convert a chumsky `Simple<Token>` error.
    pub fn from_chumsky(err: Simple<Token>) -> Self {
        let span = err.span();
        let expected: Vec<String> = err
            .expected()
            .map(|e| match e {
                Some(tok) => format!("'{tok}'"),
                None => "end of input".to_string(),
            })
            .collect();
        let message = if expected.is_empty() {
            format!("{err}")
        } else {
            let expected_str = expected.join(", ");
            match err.found() {
                Some(found) => format!("expected {expected_str}, found '{found}'"),
                None => format!("expected {expected_str}"),
            }
        };
        Self { span, message }
    }

    /// 1-based line and 0-based column of the error position.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let upto = self.span.start.min(source.len());
        let mut line = 1;
        let mut col = 0;
        for byte in source.as_bytes()[..upto].iter() {
            if *byte == b'\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    /// One entry of the combined diagnostic: `line L:C message`.
    pub fn format(&self, source: &str) -> String {
        let (line, col) = self.line_col(source);
        format!("line {line}:{col} {}", self.message)
    }
}

/// Build the single combined diagnostic for a signature definition.
/// The prefix text is stable so callers can pattern-match on it.
pub fn combined_diagnostic(signature: &str, errors: &[SignatureError]) -> String {
    let mut message = format!(
        "Syntax error(s) in signature definition {signature}. \nNote that procedure/function name, possible map keys, input and output names must have at least 2 character:\n"
    );
    for (i, error) in errors.iter().enumerate() {
        if i > 0 {
            message.push('\n');
        }
        message.push_str(&error.format(signature));
    }
    message
}
