use regex::Regex;

/// Cursor over the immutable template source.
///
/// The cursor is a byte offset and always sits on a character boundary. Line and
/// column bookkeeping is left to the [`Tokeniser`](crate::Tokeniser); this type only
/// knows where it is.
#[derive(Debug, Clone)]
pub struct SourceBuffer<'a> {
    source: &'a str,
    pos: usize,
    mark: usize,
}

impl<'a> SourceBuffer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            mark: 0,
        }
    }

    pub fn empty(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// The character `offset` characters past the cursor, if any.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Consume one character.
    pub fn consume(&mut self) -> Option<char> {
        let ch = self.remaining().chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Save the cursor. Only one mark is held at a time.
    pub fn mark(&mut self) -> usize {
        self.mark = self.pos;
        self.mark
    }

    /// Return to the last mark.
    pub fn reset(&mut self) {
        self.pos = self.mark;
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(self.source.is_char_boundary(pos));
        self.pos = pos.min(self.source.len());
    }

    /// The unconsumed tail of the source.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// A slice of the source by byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start.min(self.source.len())..end.min(self.source.len())]
    }

    /// Match `pattern` at the cursor only. The cursor is not advanced.
    ///
    /// Patterns are expected to start with `^`; a match that does not begin at the
    /// cursor is rejected either way.
    pub fn match_region(&self, pattern: &Regex) -> Option<&'a str> {
        let rest = self.remaining();
        pattern
            .find(rest)
            .filter(|m| m.start() == 0)
            .map(|m| &rest[..m.end()])
    }
}
