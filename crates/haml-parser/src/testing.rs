//! Generator that writes literal text verbatim and code callbacks as `<% … %>`
//! markers, so driver tests can assert on readable output.

use std::sync::LazyLock;

use haml_lexer::{ParsePoint, TokenKind, Tokeniser};
use regex::Regex;

use crate::generator::{
    scan_balanced_expression, split_interpolations, CodeBuffer, DynamicAttributes, EmbedMode,
    Generator, TextPart, TextProcessing,
};
use crate::options::CompileOptions;
use crate::runtime::{indent_text, process_text};
use crate::ParseError;

static CLOSING_BRACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\}").unwrap());

fn verbatim(text: &str) -> String {
    text.to_string()
}

pub struct RecordingGenerator {
    buffer: CodeBuffer,
    indent: usize,
    pub options: Option<CompileOptions>,
}

impl RecordingGenerator {
    pub fn new() -> Self {
        Self {
            buffer: CodeBuffer::new(verbatim),
            indent: 0,
            options: None,
        }
    }

    fn closed_by_source(tokeniser: &Tokeniser<'_>) -> bool {
        tokeniser.kind() == TokenKind::Minus && tokeniser.match_region(&CLOSING_BRACE).is_some()
    }
}

impl Generator for RecordingGenerator {
    fn init_output(&mut self, options: &CompileOptions) {
        self.options = Some(options.clone());
    }

    fn buffer(&mut self) -> &mut CodeBuffer {
        &mut self.buffer
    }

    fn set_indent(&mut self, indent: usize) {
        self.indent = indent;
    }

    fn append_code_line(&mut self, line: &str, eol: &str) {
        self.buffer
            .append_to_output(&format!("<%- {} %>{eol}", line.trim()));
    }

    fn append_embedded_code(
        &mut self,
        _indent_text: &str,
        expression: &str,
        mode: EmbedMode,
        _point: &ParsePoint,
    ) {
        let sigil = match mode {
            EmbedMode::Escape => "=",
            EmbedMode::Preserve => "~",
            EmbedMode::Raw => "!",
        };
        self.buffer
            .append_to_output(&format!("<%{sigil} {} %>", expression.trim()));
    }

    fn append_text_contents(
        &mut self,
        text: &str,
        interpolate: bool,
        point: &ParsePoint,
        processing: TextProcessing,
    ) {
        if !interpolate {
            self.buffer.append(&process_text(text, processing));
            return;
        }
        for part in split_interpolations(text) {
            match part {
                TextPart::Literal(literal) => self.buffer.append(&process_text(literal, processing)),
                TextPart::Code(code) => {
                    let indent = indent_text(self.indent + 1);
                    self.append_embedded_code(&indent, code, processing.embed_mode(), point);
                }
            }
        }
    }

    fn generate_code_for_dynamic_attributes(
        &mut self,
        attributes: &DynamicAttributes,
        _point: &ParsePoint,
    ) {
        let pairs = |entries: &[(String, String)]| {
            entries
                .iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut parts = Vec::new();
        if !attributes.ids.is_empty() {
            parts.push(format!("id={}", attributes.ids.join(",")));
        }
        if !attributes.classes.is_empty() {
            parts.push(format!("class={}", attributes.classes.join(",")));
        }
        if !attributes.attributes.is_empty() {
            parts.push(format!("list={}", pairs(&attributes.attributes)));
        }
        if !attributes.hash.is_empty() {
            parts.push(format!("hash={}", pairs(&attributes.hash)));
        }
        if let Some(object_ref) = &attributes.object_ref {
            parts.push(format!("ref={object_ref}"));
        }
        self.buffer
            .append_to_output(&format!("<%@ {} %>", parts.join(" ")));
    }

    fn line_matches_start_function_block(&self, line: &str) -> bool {
        line.contains("function") && self.line_matches_start_block(line)
    }

    fn line_matches_start_block(&self, line: &str) -> bool {
        line.trim_end().ends_with('{')
    }

    fn close_off_code_block(&mut self, tokeniser: &Tokeniser<'_>) {
        if !Self::closed_by_source(tokeniser) {
            self.buffer.append_to_output("<%- } %>\n");
        }
    }

    fn close_off_function_block(&mut self, tokeniser: &Tokeniser<'_>) {
        if !Self::closed_by_source(tokeniser) {
            self.buffer.append_to_output("<%- }); %>\n");
        }
    }

    fn scan_embedded_code(&mut self, tokeniser: &mut Tokeniser<'_>) -> Result<String, ParseError> {
        scan_balanced_expression(tokeniser)
    }

    fn close_and_return_output(&mut self) -> String {
        self.buffer.take_output()
    }
}
