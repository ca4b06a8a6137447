//! JavaScript function-body generator.
//!
//! The generated body expects a `context` parameter and a global `haml` object
//! carrying the HamlRuntime helpers. Literal HTML accumulates in an `html`
//! array that is joined and returned at the end:
//!
//! ```text
//!   var handleError = haml.HamlRuntime._raiseError;
//!   var html = [];
//!   var hashFunction = null, objRefFn = null;
//!   with (context || {}) {
//!     html.push("<p>\n");
//!     ...
//!   }
//!   return html.join("");
//! ```
//!
//! Embedded expressions are emitted as plain JavaScript, not through `eval`.

use std::sync::LazyLock;

use haml_lexer::{ParsePoint, TokenKind, Tokeniser};
use haml_parser::runtime::{indent_text, process_text};
use haml_parser::{
    scan_balanced_expression, split_interpolations, CodeBuffer, CompileOptions,
    DynamicAttributes, EmbedMode, Generator, ParseError, TextPart, TextProcessing,
};
use regex::Regex;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("block pattern is valid")
}

static FUNCTION_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"function\s*\((,?\s*\w+)*\)\s*\{\s*$"));
static BLOCK: LazyLock<Regex> = LazyLock::new(|| pattern(r"\{\s*$"));
static CLOSING_BRACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*\}"));

/// Hash keys that have to be quoted in an object literal.
const RESERVED_WORDS: [&str; 2] = ["class", "for"];

/// `text` as a double-quoted JavaScript string literal.
///
/// JSON leaves U+2028 and U+2029 raw, but older engines read them as line
/// terminators inside a string.
pub fn js_string(text: &str) -> String {
    js_literal(&serde_json::Value::String(text.to_string()))
}

fn js_literal(value: &serde_json::Value) -> String {
    value
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

fn flush_code(text: &str) -> String {
    format!("    html.push({});\n", js_string(text))
}

#[derive(Debug)]
pub struct JavascriptGenerator {
    buffer: CodeBuffer,
    indent: usize,
}

impl Default for JavascriptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl JavascriptGenerator {
    pub fn new() -> Self {
        Self {
            buffer: CodeBuffer::new(flush_code),
            indent: 0,
        }
    }

    /// Whether the `-` line the tokeniser sits on closes the block itself.
    fn closed_by_source(tokeniser: &Tokeniser<'_>) -> bool {
        tokeniser.kind() == TokenKind::Minus && tokeniser.match_region(&CLOSING_BRACE).is_some()
    }

    fn close_block(&mut self, closer: &str) {
        let code = format!("{}{closer}\n", indent_text(self.indent));
        self.buffer.append_to_output(&code);
    }

    /// `{key: value, …}` with reserved keys quoted.
    fn object_literal(entries: &[(String, String)]) -> String {
        let fields: Vec<String> = entries
            .iter()
            .map(|(key, value)| {
                if RESERVED_WORDS.contains(&key.as_str()) {
                    format!("{}: {value}", js_string(key))
                } else {
                    format!("{key}: {value}")
                }
            })
            .collect();
        format!("{{{}}}", fields.join(", "))
    }

    /// The attribute list as a JSON object. Later duplicates win.
    fn attribute_map(attributes: &[(String, String)]) -> String {
        let map: serde_json::Map<String, serde_json::Value> = attributes
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect();
        js_literal(&serde_json::Value::Object(map))
    }
}

impl Generator for JavascriptGenerator {
    fn init_output(&mut self, options: &CompileOptions) {
        let handler = if options.tolerate_faults {
            "_logError"
        } else {
            "_raiseError"
        };
        self.buffer.append_to_output(&format!(
            "  var handleError = haml.HamlRuntime.{handler};\n\
             \x20 var html = [];\n\
             \x20 var hashFunction = null, objRefFn = null;\n\
             \x20 with (context || {{}}) {{\n"
        ));
    }

    fn buffer(&mut self) -> &mut CodeBuffer {
        &mut self.buffer
    }

    fn set_indent(&mut self, indent: usize) {
        self.indent = indent;
    }

    fn append_code_line(&mut self, line: &str, eol: &str) {
        let code = format!("{}{line}{eol}", indent_text(self.indent));
        self.buffer.append_to_output(&code);
    }

    fn append_embedded_code(
        &mut self,
        indent_text: &str,
        expression: &str,
        mode: EmbedMode,
        point: &ParsePoint,
    ) {
        let expression = match expression.trim() {
            "" => "\"\"",
            trimmed => trimmed,
        };
        let push = match mode {
            EmbedMode::Escape => "html.push(haml.HamlRuntime.escapeHTML(String(value)));",
            EmbedMode::Preserve => "html.push(haml.HamlRuntime.perserveWhitespace(String(value)));",
            EmbedMode::Raw => "html.push(String(value));",
        };
        let it = indent_text;
        let code = format!(
            "{it}try {{\n\
             {it}    var value = {expression};\n\
             {it}    value = value === null ? \"\" : value;\n\
             {it}    {push}\n\
             {it}}} catch (e) {{\n\
             {it}  handleError(haml.HamlRuntime.templateError({line}, {column}, {text},\n\
             {it}    \"Error evaluating expression - \" + e));\n\
             {it}}}\n",
            line = point.line,
            column = point.column,
            text = js_string(&point.line_text),
        );
        self.buffer.append_to_output(&code);
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
        point: &ParsePoint,
    ) {
        let mut code = String::new();
        if attributes.hash.is_empty() {
            code.push_str("    hashFunction = null;\n");
        } else {
            code.push_str(&format!(
                "    hashFunction = function () {{ return {}; }};\n",
                Self::object_literal(&attributes.hash)
            ));
        }
        match &attributes.object_ref {
            Some(object_ref) => code.push_str(&format!(
                "    objRefFn = function () {{ return {object_ref}; }};\n"
            )),
            None => code.push_str("    objRefFn = null;\n"),
        }

        let classes: Vec<String> = attributes.classes.iter().map(|c| js_string(c)).collect();
        code.push_str(&format!(
            "    html.push(haml.HamlRuntime.generateElementAttributes(context, {id}, [{classes}], objRefFn, {list}, hashFunction, {line}, {column}, {text}, handleError));\n",
            id = js_string(&attributes.ids.join("-")),
            classes = classes.join(","),
            list = Self::attribute_map(&attributes.attributes),
            line = point.line,
            column = point.column,
            text = js_string(&point.line_text),
        ));
        self.buffer.append_to_output(&code);
    }

    fn line_matches_start_function_block(&self, line: &str) -> bool {
        FUNCTION_BLOCK.is_match(line)
    }

    fn line_matches_start_block(&self, line: &str) -> bool {
        BLOCK.is_match(line)
    }

    fn close_off_code_block(&mut self, tokeniser: &Tokeniser<'_>) {
        if !Self::closed_by_source(tokeniser) {
            self.close_block("}");
        }
    }

    fn close_off_function_block(&mut self, tokeniser: &Tokeniser<'_>) {
        if !Self::closed_by_source(tokeniser) {
            self.close_block("});");
        }
    }

    fn scan_embedded_code(&mut self, tokeniser: &mut Tokeniser<'_>) -> Result<String, ParseError> {
        scan_balanced_expression(tokeniser)
    }

    fn close_and_return_output(&mut self) -> String {
        let mut output = self.buffer.take_output();
        output.push_str("  }\n  return html.join(\"\");\n");
        output
    }
}
