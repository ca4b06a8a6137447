//! The backend contract the compiler driver writes through.
//!
//! A generator turns the driver's callbacks into host-language source. Literal
//! HTML goes through a [`CodeBuffer`], which holds it as pending text until the
//! next piece of code has to be written and then renders it with the backend's
//! flush function.

use std::sync::LazyLock;

use haml_lexer::{ParsePoint, Tokeniser};
use regex::Regex;

use crate::options::CompileOptions;
use crate::ParseError;

/// How the value of an embedded expression is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMode {
    /// `=` and `&=`
    Escape,
    /// `~`
    Preserve,
    /// `!=`
    Raw,
}

/// Processing applied to literal text before it is buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextProcessing {
    #[default]
    None,
    EscapeHtml,
    PreserveWhitespace,
}

impl TextProcessing {
    /// Embed mode used for `#{}` expressions inside text processed this way.
    pub fn embed_mode(self) -> EmbedMode {
        match self {
            TextProcessing::None => EmbedMode::Raw,
            TextProcessing::EscapeHtml => EmbedMode::Escape,
            TextProcessing::PreserveWhitespace => EmbedMode::Preserve,
        }
    }
}

/// Attributes of a tag that can only be resolved when the template renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicAttributes {
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    /// `( … )` attributes, in source order.
    pub attributes: Vec<(String, String)>,
    /// `{ … }` entries: key and the source of its value expression.
    pub hash: Vec<(String, String)>,
    /// `[ref]` expression whose `id` and `class` merge in at render time.
    pub object_ref: Option<String>,
}

impl DynamicAttributes {
    pub fn is_dynamic(&self) -> bool {
        !self.hash.is_empty() || self.object_ref.is_some()
    }
}

/// Pending literal text in front of the generated code.
#[derive(Debug)]
pub struct CodeBuffer {
    pending: String,
    output: String,
    render: fn(&str) -> String,
}

impl CodeBuffer {
    /// `render` turns a run of literal text into the code that emits it.
    pub fn new(render: fn(&str) -> String) -> Self {
        Self {
            pending: String::new(),
            output: String::new(),
            render,
        }
    }

    /// Queue literal text.
    pub fn append(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    /// Write generated code, flushing pending text in front of it.
    pub fn append_to_output(&mut self, code: &str) {
        if code.is_empty() {
            return;
        }
        self.flush();
        self.output.push_str(code);
    }

    pub fn flush(&mut self) {
        if !self.pending.is_empty() {
            let code = (self.render)(&self.pending);
            self.output.push_str(&code);
            self.pending.clear();
        }
    }

    /// Drop trailing whitespace from the pending text.
    pub fn trim_whitespace(&mut self) {
        let kept = self
            .pending
            .trim_end_matches([' ', '\t', '\n', '\r'])
            .len();
        self.pending.truncate(kept);
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Flush and hand over everything generated so far.
    pub fn take_output(&mut self) -> String {
        self.flush();
        std::mem::take(&mut self.output)
    }
}

/// Code-generation backend driven by the compiler.
pub trait Generator {
    /// Write the preamble. Called once, before anything else.
    fn init_output(&mut self, options: &CompileOptions);

    fn buffer(&mut self) -> &mut CodeBuffer;

    /// Indent level of the line being compiled.
    fn set_indent(&mut self, indent: usize);

    /// A `-` line: raw code followed by the line ending it came with.
    fn append_code_line(&mut self, line: &str, eol: &str);

    /// An expression whose value is written into the output.
    fn append_embedded_code(
        &mut self,
        indent_text: &str,
        expression: &str,
        mode: EmbedMode,
        point: &ParsePoint,
    );

    /// Literal text, with `#{}` expressions expanded when `interpolate` is set.
    fn append_text_contents(
        &mut self,
        text: &str,
        interpolate: bool,
        point: &ParsePoint,
        processing: TextProcessing,
    );

    /// The attribute part of an open tag that has a hash or an object reference.
    fn generate_code_for_dynamic_attributes(
        &mut self,
        attributes: &DynamicAttributes,
        point: &ParsePoint,
    );

    fn line_matches_start_function_block(&self, line: &str) -> bool;

    fn line_matches_start_block(&self, line: &str) -> bool;

    /// Close a block opened by a `-` line. `tokeniser` sits on the first token
    /// of the line that caused the close.
    fn close_off_code_block(&mut self, tokeniser: &Tokeniser<'_>);

    fn close_off_function_block(&mut self, tokeniser: &Tokeniser<'_>);

    /// Consume one attribute-hash value expression, stopping before a top-level
    /// `,` or `}`.
    fn scan_embedded_code(&mut self, tokeniser: &mut Tokeniser<'_>) -> Result<String, ParseError>;

    /// Finish the output and return it. Called once, last.
    fn close_and_return_output(&mut self) -> String;
}

// =============================================================================
// Expression scanning
// =============================================================================

/// Consume one expression from the raw source after the current token.
///
/// Stops before a `,` or `}` at nesting depth zero, and always at the end of
/// the line: an expression never spans lines.
/// Brackets must balance and quoted strings are skipped whole. Returns the
/// expression source, trimmed.
pub fn scan_balanced_expression(tokeniser: &mut Tokeniser<'_>) -> Result<String, ParseError> {
    let start = tokeniser.offset();
    let mut closers: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;

    while let Some(ch) = tokeniser.peek_char(0) {
        if let Some(open) = quote {
            match ch {
                '\n' | '\r' => break,
                '\\' => {
                    tokeniser.consume_char();
                }
                c if c == open => quote = None,
                _ => {}
            }
            tokeniser.consume_char();
            continue;
        }

        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '(' => closers.push(')'),
            '[' => closers.push(']'),
            '{' => closers.push('}'),
            ')' | ']' | '}' => match closers.pop() {
                Some(expected) if expected == ch => {}
                None if ch == '}' => break,
                _ => {
                    return Err(ParseError::new(
                        "Unbalanced brackets in attribute hash expression",
                        tokeniser.current_parse_point(),
                    ))
                }
            },
            '\n' | '\r' => break,
            ',' if closers.is_empty() => break,
            _ => {}
        }
        tokeniser.consume_char();
    }

    if quote.is_some() || !closers.is_empty() {
        return Err(ParseError::new(
            "Unterminated expression in attribute hash",
            tokeniser.current_parse_point(),
        ));
    }
    Ok(tokeniser
        .source_slice(start, tokeniser.offset())
        .trim()
        .to_string())
}

// =============================================================================
// Interpolation
// =============================================================================

static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\{([^}]*)\}").expect("interpolation pattern is valid")
});

/// A piece of a text line: literal text or a `#{}` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPart<'a> {
    Literal(&'a str),
    Code(&'a str),
}

/// Split `text` at its `#{…}` expressions.
///
/// `\#{…}` stays literal and loses the backslash; `\\#{…}` is still an expression.
pub fn split_interpolations(text: &str) -> Vec<TextPart<'_>> {
    let mut parts = Vec::new();
    let mut index = 0;
    for caps in INTERPOLATION.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let before = &text[..whole.start()];
        let escaped = before.ends_with('\\') && !before.ends_with("\\\\");
        if escaped {
            push_literal(&mut parts, &text[index..whole.start() - 1]);
            push_literal(&mut parts, whole.as_str());
        } else {
            push_literal(&mut parts, &text[index..whole.start()]);
            let code = caps.get(1).map_or("", |m| m.as_str());
            parts.push(TextPart::Code(code));
        }
        index = whole.end();
    }
    push_literal(&mut parts, &text[index..]);
    parts
}

fn push_literal<'a>(parts: &mut Vec<TextPart<'a>>, text: &'a str) {
    if !text.is_empty() {
        parts.push(TextPart::Literal(text));
    }
}
