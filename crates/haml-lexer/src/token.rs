/// A position in source text, tracking line and column for error reporting.
///
/// `start` and `end` are byte offsets into the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Token classification for HAML source.
///
/// Which kinds can be produced depends on the active [`LexerMode`](crate::LexerMode):
/// selectors, markers and filters only appear in the default mode, `CodeId` only
/// inside an attribute hash, `HtmlIdentifier` and `String` only inside an attribute list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structure
    Eof,
    Ws,
    Eol,
    ContinueLine,

    // Line prefixes and selectors
    Element,       // %div
    IdSelector,    // #main
    ClassSelector, // .foo
    ObjectRef,     // [item]
    Comment,       // -#
    EscapeHtml,    // &=
    UnescapeHtml,  // !=
    Doctype,       // !!!
    Filter,        // :javascript

    // Attribute modes
    HtmlIdentifier,
    CodeId,
    String,

    // Punctuation
    Equal,
    Exclamation,
    Minus,
    Amp,
    Lt,
    Gt,
    Tilde,
    Slash,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Colon,

    Unknown,
}

impl TokenKind {
    /// True for the tokens that terminate a logical line.
    pub fn ends_line(self) -> bool {
        matches!(self, TokenKind::Eol | TokenKind::ContinueLine | TokenKind::Eof)
    }
}

/// A token produced by the tokeniser.
///
/// `matched` is the raw text consumed from the source; `text` is the semantic part
/// (the element name without `%`, a string without its quotes, and so on).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub matched: String,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, matched: &str, text: &str, span: Span) -> Self {
        Self {
            kind,
            matched: matched.to_string(),
            text: text.to_string(),
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self::new(TokenKind::Eof, "", "", span)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn ends_line(&self) -> bool {
        self.kind.ends_line()
    }
}

/// Elements rendered as `<tag/>` when the line gives them no contents.
pub const SELF_CLOSING_TAGS: &[&str] = &["meta", "img", "link", "script", "br", "hr"];

/// Check if a tag name belongs to the self-closing set.
pub fn is_self_closing_tag(tag: &str) -> bool {
    SELF_CLOSING_TAGS.contains(&tag)
}
