//! HAML Compiler Driver
//!
//! Walks the token stream of a template line by line, keeps the stack of open
//! elements that indentation closes again, and writes everything through a
//! [`Generator`] backend. The backend decides what host language comes out;
//! this crate only knows the template grammar.
//!
//! Also home to the pieces every backend shares: the [`CodeBuffer`] for literal
//! text, the [`FilterRegistry`] for `:name` blocks, and the text helpers in
//! [`runtime`].

pub mod compiler;
pub mod element;
pub mod filters;
pub mod generator;
pub mod options;
pub mod runtime;

#[cfg(test)]
mod testing;

pub use compiler::{compile_with, Compilation, Compiler};
pub use element::{Element, ElementStack, TagOptions};
pub use filters::{default_filters, FilterFn, FilterRegistry};
pub use generator::{
    scan_balanced_expression, split_interpolations, CodeBuffer, DynamicAttributes, EmbedMode,
    Generator, TextPart, TextProcessing,
};
pub use options::CompileOptions;

use haml_lexer::{LexerError, ParsePoint};

/// Template error, attributed to the construct it occurred in.
///
/// Displays in the template diagnostic format, source line and caret included.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", render(.point, .message))]
pub struct ParseError {
    pub message: String,
    pub point: ParsePoint,
}

fn render(point: &ParsePoint, message: &str) -> String {
    point.error_message(message)
}

impl ParseError {
    pub fn new(message: impl Into<String>, point: ParsePoint) -> Self {
        Self {
            message: message.into(),
            point,
        }
    }
}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        ParseError::new(e.message, ParsePoint::new(e.line, e.column, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::new(
            "Expected EOL or EOF",
            ParsePoint::new(2, 4, "%p(a='b')x"),
        );
        assert_eq!(
            error.to_string(),
            "Expected EOL or EOF at line 2 and character 4:\n%p(a='b')x\n---^"
        );
    }

    #[test]
    fn test_from_lexer_error() {
        let error: ParseError = LexerError {
            message: "Only one token can be pushed back".to_string(),
            line: 3,
            column: 1,
        }
        .into();
        assert_eq!(error.message, "Only one token can be pushed back");
        assert_eq!(error.point.line, 3);
    }
}
