//! HAML Lexer
//!
//! Pull-based, mode-aware tokeniser for HAML templates. The driver asks for one
//! token at a time, can push the current token back once and can look further
//! ahead without disturbing the stream. Line and column counters feed the
//! template diagnostics built from a [`ParsePoint`].
//!
//! # Example
//!
//! ```
//! use haml_lexer::{TokenKind, Tokeniser};
//!
//! let tokens = Tokeniser::tokenize("%p.intro");
//! let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![TokenKind::Element, TokenKind::ClassSelector, TokenKind::Eof]
//! );
//! ```

pub mod point;
pub mod source;
pub mod token;
pub mod tokeniser;

pub use point::ParsePoint;
pub use source::SourceBuffer;
pub use token::{is_self_closing_tag, Span, Token, TokenKind, SELF_CLOSING_TAGS};
pub use tokeniser::{LexerMode, Tokeniser};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
