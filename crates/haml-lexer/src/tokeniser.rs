use std::sync::LazyLock;

use regex::Regex;

use crate::point::ParsePoint;
use crate::source::SourceBuffer;
use crate::token::{Span, Token, TokenKind};
use crate::LexerError;

/// Lexer mode determines which token patterns are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerMode {
    /// Template lines: selectors, line markers, filters.
    #[default]
    Default,
    /// Inside `( … )`: html attribute names and quoted strings.
    AttrList,
    /// Inside `{ … }`: code identifiers used as hash keys.
    AttrHash,
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("token pattern is valid")
}

static REST_OF_LINE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[^\r\n]*"));

/// How the semantic text of a token is cut out of the matched text.
#[derive(Debug, Clone, Copy)]
enum Extract {
    Whole,
    Sigil,
    Delimited,
}

impl Extract {
    fn apply(self, matched: &str) -> &str {
        match self {
            Extract::Whole => matched,
            Extract::Sigil => &matched[1..],
            Extract::Delimited => &matched[1..matched.len() - 1],
        }
    }
}

type Rule = (TokenKind, Regex, Extract);

/// Whitespace is recognised in every mode.
static WHITESPACE_RULES: LazyLock<Vec<Rule>> =
    LazyLock::new(|| vec![(TokenKind::Ws, pattern(r"^[ \t]+"), Extract::Whole)]);

static DEFAULT_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        (TokenKind::ContinueLine, pattern(r"^\|[ \t]*(\r\n|\n|\r)"), Extract::Whole),
        (TokenKind::Element, pattern(r"^%[a-zA-Z][a-zA-Z0-9]*"), Extract::Sigil),
        (TokenKind::IdSelector, pattern(r"^#[a-zA-Z0-9_\-]+"), Extract::Sigil),
        (TokenKind::ClassSelector, pattern(r"^\.[a-zA-Z0-9_\-]+"), Extract::Sigil),
        (TokenKind::Comment, pattern(r"^-#"), Extract::Whole),
        (TokenKind::EscapeHtml, pattern(r"^&="), Extract::Whole),
        (TokenKind::UnescapeHtml, pattern(r"^!="), Extract::Whole),
        (TokenKind::ObjectRef, pattern(r"^\[[a-zA-Z_][a-zA-Z0-9_]*\]"), Extract::Delimited),
        (TokenKind::Doctype, pattern(r"^!!!"), Extract::Whole),
        (TokenKind::Filter, pattern(r"^:\w+"), Extract::Sigil),
    ]
});

static ATTR_HASH_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![(TokenKind::CodeId, pattern(r"^[a-zA-Z_][a-zA-Z0-9_]*"), Extract::Whole)]
});

static ATTR_LIST_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        (TokenKind::HtmlIdentifier, pattern(r"^[a-zA-Z][a-zA-Z0-9\-]*"), Extract::Whole),
        (TokenKind::String, pattern(r"^'[^'\n]*'"), Extract::Delimited),
        (TokenKind::String, pattern(r#"^"[^"\n]*""#), Extract::Delimited),
    ]
});

fn punctuation(ch: char) -> Option<TokenKind> {
    let kind = match ch {
        '{' => TokenKind::OpenBrace,
        '}' => TokenKind::CloseBrace,
        ',' => TokenKind::Comma,
        ':' => TokenKind::Colon,
        '/' => TokenKind::Slash,
        '(' => TokenKind::OpenBracket,
        ')' => TokenKind::CloseBracket,
        '=' => TokenKind::Equal,
        '!' => TokenKind::Exclamation,
        '-' => TokenKind::Minus,
        '&' => TokenKind::Amp,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        '~' => TokenKind::Tilde,
        _ => return None,
    };
    Some(kind)
}

/// Where the lexer is: byte cursor plus the counters derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    pos: usize,
    line: usize,
    column: usize,
    line_start: usize,
}

/// Everything `look_ahead` has to put back.
#[derive(Debug, Clone)]
struct LexerState {
    cursor: Cursor,
    token: Token,
    previous: Option<Token>,
    token_start: Cursor,
}

/// HAML tokeniser.
///
/// Pull-based: the driver asks for one token at a time with [`next_token`], may push
/// the current token back once, and may peek further ahead with [`look_ahead`].
/// The active [`LexerMode`] decides which patterns are tried.
///
/// [`next_token`]: Tokeniser::next_token
/// [`look_ahead`]: Tokeniser::look_ahead
pub struct Tokeniser<'a> {
    buffer: SourceBuffer<'a>,
    line: usize,
    column: usize,
    line_start: usize,
    mode: LexerMode,
    token: Token,
    previous: Option<Token>,
    token_start: Cursor,
}

impl<'a> Tokeniser<'a> {
    /// Create a tokeniser positioned before the first token.
    ///
    /// Until [`next_token`](Tokeniser::next_token) is called the current token is an
    /// empty `Eol`, the start of the first line.
    pub fn new(source: &'a str) -> Self {
        let start = Cursor {
            pos: 0,
            line: 1,
            column: 0,
            line_start: 0,
        };
        Self {
            buffer: SourceBuffer::new(source),
            line: start.line,
            column: start.column,
            line_start: start.line_start,
            mode: LexerMode::Default,
            token: Token::new(TokenKind::Eol, "", "", Span::new(0, 0, 1, 1)),
            previous: None,
            token_start: start,
        }
    }

    /// Tokenise a whole source in the default mode, including the final `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut tokeniser = Tokeniser::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = tokeniser.next_token().clone();
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    // --- Token stream ---

    /// Scan the next token and make it current.
    pub fn next_token(&mut self) -> &Token {
        let start = self.cursor();
        let token = self.scan();
        self.previous = Some(std::mem::replace(&mut self.token, token));
        self.token_start = start;
        &self.token
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    pub fn previous(&self) -> Option<&Token> {
        self.previous.as_ref()
    }

    pub fn is_eol_or_eof(&self) -> bool {
        self.token.ends_line()
    }

    /// Make the previous token current again and rewind to where the current one began.
    pub fn push_back(&mut self) -> Result<(), LexerError> {
        if self.token.is(TokenKind::Eof) {
            return Err(self.error("Cannot push back the end of input"));
        }
        let previous = self
            .previous
            .take()
            .ok_or_else(|| self.error("Only one token can be pushed back"))?;
        self.restore_cursor(self.token_start);
        self.token = previous;
        Ok(())
    }

    /// The token that would be current after `count` more calls to `next_token`.
    ///
    /// Nothing observable changes: cursor, counters and both held tokens are restored.
    pub fn look_ahead(&mut self, count: usize) -> Token {
        let saved = self.save();
        for _ in 0..count {
            self.next_token();
        }
        let token = self.token.clone();
        self.restore(saved);
        token
    }

    pub fn mode(&self) -> LexerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: LexerMode) {
        self.mode = mode;
    }

    pub fn clear_mode(&mut self) {
        self.mode = LexerMode::Default;
    }

    // --- Line helpers ---

    /// Take the rest of the logical line, starting with the current token.
    ///
    /// Leaves the tokeniser on the token that ends the line: `Eol`, `Eof`, or the
    /// `ContinueLine` marker closing a run of `|`-continued lines.
    pub fn skip_to_end_of_line(&mut self) -> String {
        let mut text = String::new();
        if self.token.ends_line() {
            return text;
        }
        text.push_str(&self.token.matched);

        while let Some(segment) = self.continued_segment() {
            text.push_str(segment);
            self.advance(segment.len());
            self.next_token();
            if !self.token.is(TokenKind::ContinueLine) || self.continued_segment().is_none() {
                return text;
            }
        }

        let line = self.rest_of_line();
        text.push_str(line);
        self.advance(line.len());
        self.next_token();
        text
    }

    /// Indent level of a whitespace run: tabs count as two columns, and every two
    /// columns (rounded up) make one level.
    pub fn calculate_indent(whitespace: &str) -> usize {
        let width: usize = whitespace
            .chars()
            .map(|ch| if ch == '\t' { 2 } else { 1 })
            .sum();
        (width + 1) / 2
    }

    pub fn current_parse_point(&self) -> ParsePoint {
        ParsePoint::new(self.line, self.column, self.current_line())
    }

    /// Format `message` as a diagnostic at the current position.
    pub fn parse_error(&self, message: &str) -> String {
        self.current_parse_point().error_message(message)
    }

    // --- Raw access for expression scanners ---

    /// Match `pattern` at the cursor without consuming anything.
    pub fn match_region(&self, pattern: &Regex) -> Option<&'a str> {
        self.buffer.match_region(pattern)
    }

    /// The character `offset` characters past the cursor.
    pub fn peek_char(&self, offset: usize) -> Option<char> {
        self.buffer.peek(offset)
    }

    /// Consume one raw character, keeping the line and column counters in step.
    pub fn consume_char(&mut self) -> Option<char> {
        let ch = self.buffer.peek(0)?;
        self.advance(ch.len_utf8());
        Some(ch)
    }

    /// Byte offset of the cursor.
    pub fn offset(&self) -> usize {
        self.buffer.position()
    }

    pub fn source_slice(&self, start: usize, end: usize) -> &'a str {
        self.buffer.slice(start, end)
    }

    // --- Scanning ---

    fn scan(&mut self) -> Token {
        if self.buffer.empty() {
            let pos = self.buffer.position();
            return Token::eof(Span::new(pos, pos, self.line, self.column + 1));
        }

        if let Some(token) = self.scan_eol() {
            return token;
        }
        if let Some(token) = self.scan_rules(&WHITESPACE_RULES) {
            return token;
        }

        let rules: &[Rule] = match self.mode {
            LexerMode::Default => &DEFAULT_RULES,
            LexerMode::AttrHash => &ATTR_HASH_RULES,
            LexerMode::AttrList => &ATTR_LIST_RULES,
        };
        if let Some(token) = self.scan_rules(rules) {
            return token;
        }

        let ch = self.buffer.peek(0).unwrap_or('\0');
        let kind = punctuation(ch).unwrap_or(TokenKind::Unknown);
        let start = self.buffer.position();
        let matched = self.buffer.slice(start, start + ch.len_utf8());
        self.emit(kind, matched, matched)
    }

    fn scan_eol(&mut self) -> Option<Token> {
        let len = match (self.buffer.peek(0), self.buffer.peek(1)) {
            (Some('\r'), Some('\n')) => 2,
            (Some('\n'), _) | (Some('\r'), _) => 1,
            _ => return None,
        };
        let start = self.buffer.position();
        let matched = self.buffer.slice(start, start + len);
        Some(self.emit(TokenKind::Eol, matched, matched))
    }

    fn scan_rules(&mut self, rules: &[Rule]) -> Option<Token> {
        let (kind, matched, text) = rules.iter().find_map(|(kind, regex, extract)| {
            self.buffer
                .match_region(regex)
                .map(|matched| (*kind, matched, extract.apply(matched)))
        })?;
        Some(self.emit(kind, matched, text))
    }

    /// Build a token for text starting at the cursor and consume it.
    fn emit(&mut self, kind: TokenKind, matched: &str, text: &str) -> Token {
        let start = self.buffer.position();
        let span = Span::new(start, start + matched.len(), self.line, self.column + 1);
        let token = Token::new(kind, matched, text, span);
        self.advance(matched.len());
        token
    }

    /// Consume `len` bytes, updating the line and column counters.
    fn advance(&mut self, len: usize) {
        let end = self.buffer.position() + len;
        while self.buffer.position() < end {
            match self.buffer.consume() {
                Some('\r') => {
                    if self.buffer.peek(0) == Some('\n') {
                        self.buffer.consume();
                    }
                    self.new_line();
                }
                Some('\n') => self.new_line(),
                Some(_) => self.column += 1,
                None => break,
            }
        }
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 0;
        self.line_start = self.buffer.position();
    }

    fn rest_of_line(&self) -> &'a str {
        self.buffer.match_region(&REST_OF_LINE).unwrap_or("")
    }

    /// Text before a trailing `|` when the rest of the line continues onto the next.
    fn continued_segment(&self) -> Option<&'a str> {
        let line = self.rest_of_line();
        let segment = line.trim_end_matches([' ', '\t']).strip_suffix('|')?;
        let followed_by_newline = self.buffer.remaining().len() > line.len();
        followed_by_newline.then_some(segment)
    }

    /// Source text of the line the cursor is on, without its terminator.
    fn current_line(&self) -> &'a str {
        self.buffer
            .slice(self.line_start, usize::MAX)
            .split(['\r', '\n'])
            .next()
            .unwrap_or("")
    }

    // --- State ---

    fn cursor(&self) -> Cursor {
        Cursor {
            pos: self.buffer.position(),
            line: self.line,
            column: self.column,
            line_start: self.line_start,
        }
    }

    fn restore_cursor(&mut self, cursor: Cursor) {
        self.buffer.set_position(cursor.pos);
        self.line = cursor.line;
        self.column = cursor.column;
        self.line_start = cursor.line_start;
    }

    fn save(&mut self) -> LexerState {
        self.buffer.mark();
        LexerState {
            cursor: self.cursor(),
            token: self.token.clone(),
            previous: self.previous.clone(),
            token_start: self.token_start,
        }
    }

    fn restore(&mut self, state: LexerState) {
        self.buffer.reset();
        self.restore_cursor(state.cursor);
        self.token = state.token;
        self.previous = state.previous;
        self.token_start = state.token_start;
    }

    fn error(&self, message: &str) -> LexerError {
        LexerError {
            message: message.to_string(),
            line: self.line,
            column: self.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: tokenise in the default mode and return token kinds.
    fn kinds(source: &str) -> Vec<TokenKind> {
        Tokeniser::tokenize(source)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    /// Helper: tokenise in the given mode and return (kind, text) pairs.
    fn in_mode(source: &str, mode: LexerMode) -> Vec<(TokenKind, String)> {
        let mut tokeniser = Tokeniser::new(source);
        tokeniser.set_mode(mode);
        let mut out = Vec::new();
        loop {
            let token = tokeniser.next_token();
            if token.is(TokenKind::Eof) {
                return out;
            }
            out.push((token.kind, token.text.clone()));
        }
    }

    // =========================================================================
    // Structure: empty, newlines, EOF
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut tokeniser = Tokeniser::new("a");
        tokeniser.next_token();
        for _ in 0..3 {
            assert_eq!(tokeniser.next_token().kind, TokenKind::Eof);
        }
    }

    #[test]
    fn test_line_endings() {
        let tokens = Tokeniser::tokenize("\n\r\n\r");
        let matched: Vec<&str> = tokens.iter().map(|t| t.matched.as_str()).collect();
        assert_eq!(matched, vec!["\n", "\r\n", "\r", ""]);
        assert!(tokens[..3].iter().all(|t| t.is(TokenKind::Eol)));
    }

    #[test]
    fn test_line_counter_treats_crlf_as_one_newline() {
        let mut tokeniser = Tokeniser::new("a\r\nb\nc");
        while !tokeniser.next_token().is(TokenKind::Eof) {}
        assert_eq!(tokeniser.current_parse_point().line, 3);
    }

    // =========================================================================
    // Default mode
    // =========================================================================

    #[test]
    fn test_element_with_selectors() {
        let tokens = Tokeniser::tokenize("%div#main.foo.bar");
        let pairs: Vec<(TokenKind, &str)> =
            tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                (TokenKind::Element, "div"),
                (TokenKind::IdSelector, "main"),
                (TokenKind::ClassSelector, "foo"),
                (TokenKind::ClassSelector, "bar"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_line_markers() {
        assert_eq!(kinds("-#"), vec![TokenKind::Comment, TokenKind::Eof]);
        assert_eq!(kinds("&="), vec![TokenKind::EscapeHtml, TokenKind::Eof]);
        assert_eq!(kinds("!="), vec![TokenKind::UnescapeHtml, TokenKind::Eof]);
        assert_eq!(kinds("!!!"), vec![TokenKind::Doctype, TokenKind::Eof]);
        assert_eq!(kinds("= x"), vec![TokenKind::Equal, TokenKind::Ws, TokenKind::Unknown, TokenKind::Eof]);
    }

    #[test]
    fn test_object_reference_and_filter() {
        let tokens = Tokeniser::tokenize("[item]:javascript");
        assert_eq!(tokens[0].kind, TokenKind::ObjectRef);
        assert_eq!(tokens[0].text, "item");
        assert_eq!(tokens[0].matched, "[item]");
        assert_eq!(tokens[1].kind, TokenKind::Filter);
        assert_eq!(tokens[1].text, "javascript");
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("{},:/()=!-&<>~"),
            vec![
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Slash,
                TokenKind::OpenBracket,
                TokenKind::CloseBracket,
                TokenKind::Equal,
                TokenKind::Exclamation,
                TokenKind::Minus,
                TokenKind::Amp,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Tilde,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_consumes_one_character() {
        let tokens = Tokeniser::tokenize("é?");
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].matched, "é");
        assert_eq!(tokens[1].matched, "?");
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn test_continue_line_marker() {
        assert_eq!(
            kinds("|  \nx"),
            vec![TokenKind::ContinueLine, TokenKind::Unknown, TokenKind::Eof]
        );
    }

    #[test]
    fn test_whitespace_before_selectors() {
        assert_eq!(
            kinds("  %p"),
            vec![TokenKind::Ws, TokenKind::Element, TokenKind::Eof]
        );
    }

    // =========================================================================
    // Modes
    // =========================================================================

    #[test]
    fn test_attribute_list_mode() {
        assert_eq!(
            in_mode("title='x' data-id=\"7\"", LexerMode::AttrList),
            vec![
                (TokenKind::HtmlIdentifier, "title".to_string()),
                (TokenKind::Equal, "=".to_string()),
                (TokenKind::String, "x".to_string()),
                (TokenKind::Ws, " ".to_string()),
                (TokenKind::HtmlIdentifier, "data-id".to_string()),
                (TokenKind::Equal, "=".to_string()),
                (TokenKind::String, "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_attribute_hash_mode() {
        assert_eq!(
            in_mode("a_b: 1", LexerMode::AttrHash),
            vec![
                (TokenKind::CodeId, "a_b".to_string()),
                (TokenKind::Colon, ":".to_string()),
                (TokenKind::Ws, " ".to_string()),
                (TokenKind::Unknown, "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_selectors_inactive_outside_default_mode() {
        let tokens = in_mode("%p", LexerMode::AttrHash);
        assert_eq!(tokens[0].0, TokenKind::Unknown);
        assert_eq!(tokens[1].0, TokenKind::CodeId);
    }

    #[test]
    fn test_clear_mode_returns_to_default() {
        let mut tokeniser = Tokeniser::new("%p");
        tokeniser.set_mode(LexerMode::AttrList);
        tokeniser.clear_mode();
        assert_eq!(tokeniser.mode(), LexerMode::Default);
        assert_eq!(tokeniser.next_token().kind, TokenKind::Element);
    }

    // =========================================================================
    // Pushback and lookahead
    // =========================================================================

    #[test]
    fn test_push_back_restores_previous_token() {
        let mut tokeniser = Tokeniser::new("  %p\n");
        tokeniser.next_token();
        tokeniser.next_token();
        assert_eq!(tokeniser.kind(), TokenKind::Element);
        tokeniser.push_back().unwrap();
        assert_eq!(tokeniser.kind(), TokenKind::Ws);
        assert_eq!(tokeniser.next_token().kind, TokenKind::Element);
        assert_eq!(tokeniser.next_token().kind, TokenKind::Eol);
    }

    #[test]
    fn test_push_back_twice_is_rejected() {
        let mut tokeniser = Tokeniser::new("%p.a");
        tokeniser.next_token();
        tokeniser.next_token();
        tokeniser.push_back().unwrap();
        let err = tokeniser.push_back().unwrap_err();
        assert!(err.message.contains("Only one token"));
    }

    #[test]
    fn test_push_back_at_eof_is_rejected() {
        let mut tokeniser = Tokeniser::new("a");
        tokeniser.next_token();
        tokeniser.next_token();
        assert!(tokeniser.push_back().is_err());
    }

    #[test]
    fn test_push_back_across_newline_restores_line_counter() {
        let mut tokeniser = Tokeniser::new("a\n  b");
        tokeniser.next_token();
        tokeniser.next_token();
        tokeniser.next_token();
        assert_eq!(tokeniser.current_parse_point().line, 2);
        tokeniser.push_back().unwrap();
        assert_eq!(tokeniser.kind(), TokenKind::Eol);
        assert_eq!(tokeniser.current_parse_point().line, 2);
        assert_eq!(tokeniser.current_parse_point().column, 0);
    }

    #[test]
    fn test_look_ahead_is_pure() {
        let mut tokeniser = Tokeniser::new("%p\n  %a\n");
        tokeniser.next_token();
        let before = tokeniser.current_parse_point();
        for _ in 0..3 {
            assert_eq!(tokeniser.look_ahead(1).kind, TokenKind::Eol);
            assert_eq!(tokeniser.look_ahead(2).kind, TokenKind::Ws);
            assert_eq!(tokeniser.look_ahead(3).text, "a");
        }
        assert_eq!(tokeniser.current_parse_point(), before);
        assert_eq!(tokeniser.kind(), TokenKind::Element);
        assert_eq!(tokeniser.next_token().kind, TokenKind::Eol);
        assert_eq!(tokeniser.next_token().kind, TokenKind::Ws);
    }

    #[test]
    fn test_look_ahead_keeps_push_back_available() {
        let mut tokeniser = Tokeniser::new("  %p");
        tokeniser.next_token();
        tokeniser.next_token();
        tokeniser.look_ahead(2);
        tokeniser.push_back().unwrap();
        assert_eq!(tokeniser.kind(), TokenKind::Ws);
    }

    // =========================================================================
    // Line helpers
    // =========================================================================

    #[test]
    fn test_skip_to_end_of_line() {
        let mut tokeniser = Tokeniser::new("%p Hello there\nnext");
        tokeniser.next_token();
        tokeniser.next_token();
        tokeniser.next_token();
        assert_eq!(tokeniser.skip_to_end_of_line(), "Hello there");
        assert_eq!(tokeniser.kind(), TokenKind::Eol);
    }

    #[test]
    fn test_skip_to_end_of_line_on_last_token() {
        let mut tokeniser = Tokeniser::new("a\nb");
        tokeniser.next_token();
        assert_eq!(tokeniser.skip_to_end_of_line(), "a");
        assert_eq!(tokeniser.kind(), TokenKind::Eol);
    }

    #[test]
    fn test_skip_to_end_of_line_at_eof() {
        let mut tokeniser = Tokeniser::new("tail");
        tokeniser.next_token();
        assert_eq!(tokeniser.skip_to_end_of_line(), "tail");
        assert_eq!(tokeniser.kind(), TokenKind::Eof);
        assert_eq!(tokeniser.skip_to_end_of_line(), "");
    }

    #[test]
    fn test_skip_to_end_of_line_joins_continued_lines() {
        let mut tokeniser = Tokeniser::new("= a + |\n  b + |\n  c |\n%p");
        tokeniser.next_token();
        tokeniser.next_token();
        assert_eq!(tokeniser.skip_to_end_of_line(), " a +   b +   c ");
        assert_eq!(tokeniser.kind(), TokenKind::ContinueLine);
        assert_eq!(tokeniser.next_token().kind, TokenKind::Element);
    }

    #[test]
    fn test_trailing_pipe_at_eof_is_text() {
        let mut tokeniser = Tokeniser::new("a |");
        tokeniser.next_token();
        assert_eq!(tokeniser.skip_to_end_of_line(), "a |");
        assert_eq!(tokeniser.kind(), TokenKind::Eof);
    }

    #[test]
    fn test_calculate_indent() {
        for n in 0..10 {
            assert_eq!(Tokeniser::calculate_indent(&" ".repeat(n)), (n + 1) / 2);
        }
        assert_eq!(Tokeniser::calculate_indent("\t"), 1);
        assert_eq!(Tokeniser::calculate_indent("\t\t"), 2);
        assert_eq!(Tokeniser::calculate_indent("\t "), 2);
        assert_eq!(Tokeniser::calculate_indent(" "), 1);
    }

    #[test]
    fn test_parse_point_tracks_line_text() {
        let mut tokeniser = Tokeniser::new("%p\n  %a(href)\n");
        for _ in 0..4 {
            tokeniser.next_token();
        }
        let point = tokeniser.current_parse_point();
        assert_eq!(point.line, 2);
        assert_eq!(point.column, 4);
        assert_eq!(point.line_text, "  %a(href)");
    }

    #[test]
    fn test_parse_error_format() {
        let mut tokeniser = Tokeniser::new("%p{");
        tokeniser.next_token();
        tokeniser.next_token();
        assert_eq!(
            tokeniser.parse_error("Expected '}'"),
            "Expected '}' at line 1 and character 3:\n%p{\n--^"
        );
    }

    #[test]
    fn test_raw_character_access() {
        let mut tokeniser = Tokeniser::new("a: b\nc");
        tokeniser.next_token();
        assert_eq!(tokeniser.peek_char(0), Some(':'));
        assert_eq!(tokeniser.consume_char(), Some(':'));
        let start = tokeniser.offset();
        while tokeniser.peek_char(0).is_some_and(|c| c != '\n') {
            tokeniser.consume_char();
        }
        assert_eq!(tokeniser.source_slice(start, tokeniser.offset()), " b");
        assert_eq!(tokeniser.next_token().kind, TokenKind::Eol);
        assert_eq!(tokeniser.current_parse_point().line, 2);
    }
}
