//! Compiler driver.
//!
//! One pass over the token stream. Each line's indent closes whatever is open at
//! that depth or deeper, then exactly one construct handler runs. Output goes
//! through the [`Generator`]; nothing here knows the target language.

use std::sync::LazyLock;

use haml_lexer::{is_self_closing_tag, LexerMode, ParsePoint, Token, TokenKind, Tokeniser};
use regex::Regex;

use crate::element::{Element, ElementStack, TagOptions};
use crate::filters::FilterRegistry;
use crate::generator::{DynamicAttributes, EmbedMode, Generator, TextProcessing};
use crate::options::CompileOptions;
use crate::runtime::{self, indent_text, render_static_attributes, trim_start_chars};
use crate::ParseError;

static CONDITIONAL_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[.*\]\s*$").expect("conditional comment pattern is valid")
});

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// The generated function body.
    pub code: String,
    /// Faults skipped in tolerant mode, in source order.
    pub diagnostics: Vec<ParseError>,
}

/// Compile `source` through `generator`, looking filters up in `filters`.
pub fn compile_with<'a>(
    generator: &'a mut dyn Generator,
    template_name: &'a str,
    source: &'a str,
    options: &'a CompileOptions,
    filters: &'a FilterRegistry,
) -> Result<Compilation, ParseError> {
    let mut compiler = Compiler::new(generator, template_name, source, options, filters);
    compiler.run()?;
    Ok(compiler.finish())
}

/// Everything one compile owns.
pub struct Compiler<'a> {
    tokeniser: Tokeniser<'a>,
    generator: &'a mut dyn Generator,
    elements: ElementStack,
    template_name: &'a str,
    options: &'a CompileOptions,
    filters: &'a FilterRegistry,
    diagnostics: Vec<ParseError>,
}

/// What a template line declares before its contents.
#[derive(Debug, Default)]
struct LineHead {
    element: Option<String>,
    attributes: DynamicAttributes,
    options: TagOptions,
}

impl LineHead {
    fn has_element(&self) -> bool {
        self.element.is_some() || !self.attributes.ids.is_empty() || !self.attributes.classes.is_empty()
    }
}

impl<'a> Compiler<'a> {
    pub fn new(
        generator: &'a mut dyn Generator,
        template_name: &'a str,
        source: &'a str,
        options: &'a CompileOptions,
        filters: &'a FilterRegistry,
    ) -> Self {
        Self {
            tokeniser: Tokeniser::new(source),
            generator,
            elements: ElementStack::new(),
            template_name,
            options,
            filters,
            diagnostics: Vec::new(),
        }
    }

    /// Compile every line, then close whatever is still open.
    pub fn run(&mut self) -> Result<(), ParseError> {
        log::debug!("compiling template '{}'", self.template_name);
        self.generator.init_output(self.options);

        self.tokeniser.next_token();
        while !self.tokeniser.token().is(TokenKind::Eof) {
            if self.at_line_end() {
                let eol = self.newline();
                self.generator.buffer().append(&eol);
                self.tokeniser.next_token();
            } else {
                self.line()?;
            }
        }

        self.close_elements(0);
        Ok(())
    }

    /// Finish the output. Call once, after [`run`](Compiler::run).
    pub fn finish(self) -> Compilation {
        let code = self.generator.close_and_return_output();
        log::debug!(
            "compiled template '{}': {} bytes, {} skipped faults",
            self.template_name,
            code.len(),
            self.diagnostics.len()
        );
        Compilation {
            code,
            diagnostics: self.diagnostics,
        }
    }

    fn line(&mut self) -> Result<(), ParseError> {
        let indent = self.whitespace();
        self.generator.set_indent(indent);

        if let Err(error) = self.construct(indent) {
            self.tolerate(error)?;
            return self.skip_to_next_line_with_indent(indent);
        }
        Ok(())
    }

    /// Record `error` as a diagnostic in tolerant mode, otherwise return it.
    fn tolerate(&mut self, error: ParseError) -> Result<(), ParseError> {
        if !self.options.tolerate_faults {
            return Err(error);
        }
        log::warn!("{}: {}", self.template_name, error);
        self.diagnostics.push(error);
        Ok(())
    }

    fn construct(&mut self, indent: usize) -> Result<(), ParseError> {
        match self.tokeniser.kind() {
            TokenKind::Eof => return Ok(()),
            TokenKind::Eol | TokenKind::ContinueLine => {
                let blank = indent_text(indent) + &self.newline();
                self.generator.buffer().append(&blank);
                self.tokeniser.next_token();
                return Ok(());
            }
            _ => {}
        }

        self.close_elements(indent);
        self.generator.set_indent(indent);

        match self.tokeniser.kind() {
            TokenKind::Doctype => self.doctype(indent),
            TokenKind::Equal | TokenKind::EscapeHtml | TokenKind::UnescapeHtml | TokenKind::Tilde => {
                self.embedded_code(indent, None)
            }
            TokenKind::Minus => self.code_line(indent),
            TokenKind::Comment => self.silent_comment(indent),
            TokenKind::Slash => self.html_comment(indent),
            TokenKind::Amp => self.escaped_line(indent),
            TokenKind::Filter => self.filter_block(indent),
            _ => self.template_line(indent),
        }
    }

    // =========================================================================
    // Line constructs
    // =========================================================================

    /// `!!! [keyword [encoding]]`
    fn doctype(&mut self, indent: usize) -> Result<(), ParseError> {
        self.generator.buffer().append(&indent_text(indent));
        self.tokeniser.next_token();
        self.skip_whitespace();
        let params = self.tokeniser.skip_to_end_of_line();
        let line = runtime::doctype(&params) + &self.newline();
        self.generator.buffer().append(&line);
        self.consume_line_end();
        Ok(())
    }

    /// `= expr`, `&= expr`, `!= expr` and `~ expr`, alone or after a tag.
    fn embedded_code(&mut self, indent: usize, tag: Option<TagOptions>) -> Result<(), ParseError> {
        let mode = match self.tokeniser.kind() {
            TokenKind::Tilde => EmbedMode::Preserve,
            TokenKind::UnescapeHtml => EmbedMode::Raw,
            _ => EmbedMode::Escape,
        };
        let point = self.tokeniser.current_parse_point();
        self.tokeniser.next_token();
        let expression = self.tokeniser.skip_to_end_of_line();

        let indent_text = indent_text(indent);
        let inner_whitespace = tag.map_or(true, |options| options.inner_whitespace);
        if inner_whitespace {
            self.generator.buffer().append(&indent_text);
        }
        self.generator
            .append_embedded_code(&indent_text, &expression, mode, &point);
        if inner_whitespace {
            let eol = self.newline();
            self.generator.buffer().append(&eol);
            self.consume_line_end();
        }
        Ok(())
    }

    /// `- code`
    fn code_line(&mut self, indent: usize) -> Result<(), ParseError> {
        self.tokeniser.next_token();
        let line = self.tokeniser.skip_to_end_of_line();
        let eol = self.newline();
        self.generator.set_indent(indent);
        self.generator.append_code_line(&line, &eol);
        self.consume_line_end();

        if self.generator.line_matches_start_function_block(&line) {
            self.elements.set(indent, Element::FunctionBlock);
        } else if self.generator.line_matches_start_block(&line) {
            self.elements.set(indent, Element::CodeBlock);
        }
        Ok(())
    }

    /// `-#` swallows the line and everything nested under it.
    fn silent_comment(&mut self, indent: usize) -> Result<(), ParseError> {
        self.take_block(indent);
        Ok(())
    }

    /// `/ text` or `/[condition]`, closed when indentation drops back.
    fn html_comment(&mut self, indent: usize) -> Result<(), ParseError> {
        self.generator
            .buffer()
            .append(&format!("{}<!--", indent_text(indent)));
        self.tokeniser.next_token();
        let contents = self.tokeniser.skip_to_end_of_line();
        self.generator.buffer().append(&contents);

        let eol = self.newline();
        if CONDITIONAL_COMMENT.is_match(&contents) {
            self.elements.set(indent, Element::ConditionalComment { eol });
            self.generator.buffer().append(">");
        } else {
            self.elements.set(indent, Element::HtmlComment { eol });
        }

        if self.tag_has_contents(indent) {
            self.generator.buffer().append("\n");
        }
        self.consume_line_end();
        Ok(())
    }

    /// `& text`: the text is HTML-escaped and not interpolated.
    fn escaped_line(&mut self, indent: usize) -> Result<(), ParseError> {
        let point = self.tokeniser.current_parse_point();
        self.generator.buffer().append(&indent_text(indent));
        self.tokeniser.next_token();
        self.skip_whitespace();
        let contents = self.tokeniser.skip_to_end_of_line();
        self.generator
            .append_text_contents(&contents, false, &point, TextProcessing::EscapeHtml);
        let eol = self.newline();
        self.generator.buffer().append(&eol);
        self.consume_line_end();
        Ok(())
    }

    /// `:name` followed by an indented block handed to the named filter.
    fn filter_block(&mut self, indent: usize) -> Result<(), ParseError> {
        let name = self.tokeniser.token().text.clone();
        let point = self.tokeniser.current_parse_point();
        let filters = self.filters;
        let filter = filters.get(&name).ok_or_else(|| {
            self.error(&format!(
                "Filter '{name}' not registered. Filter functions need to be added to the filter registry"
            ))
        })?;

        let lines = self.take_block(indent);
        log::debug!("applying filter '{}' to {} lines", name, lines.len());
        // The block is already consumed, so a tolerated fault needs no resync.
        filter(&lines, &mut *self.generator, indent, &point).or_else(|error| self.tolerate(error))
    }

    // =========================================================================
    // Template lines
    // =========================================================================

    /// `%tag#id.class[ref](attrs){hash}/>< contents`, or a plain text line.
    fn template_line(&mut self, indent: usize) -> Result<(), ParseError> {
        let mut head = LineHead {
            element: self.element_name(),
            ..LineHead::default()
        };
        self.selectors(&mut head.attributes);

        let has_element = head.has_element();
        let mut point = self.tokeniser.current_parse_point();
        if has_element {
            head.attributes.object_ref = self.object_reference();
            head.attributes.attributes = self.attribute_list()?;
            point = self.tokeniser.current_parse_point();
            head.attributes.hash = self.attribute_hash()?;
            self.tag_modifiers(&mut head.options);

            if head.options.self_closing && self.has_inline_contents() {
                return Err(ParseError::new(
                    "A self-closing tag can not have any contents",
                    point,
                ));
            }
            let name = head.element.as_deref().unwrap_or("div");
            if !head.options.self_closing {
                head.options.self_closing =
                    is_self_closing_tag(name) && !self.tag_has_contents(indent);
            }
            self.open_element(indent, &head, &point);
        }

        self.skip_whitespace();
        match self.tokeniser.kind() {
            TokenKind::Equal | TokenKind::EscapeHtml | TokenKind::UnescapeHtml | TokenKind::Tilde => {
                self.embedded_code(indent + 1, Some(head.options))
            }
            _ => self.text_contents(indent, &head, &point),
        }
    }

    fn text_contents(
        &mut self,
        indent: usize,
        head: &LineHead,
        point: &ParsePoint,
    ) -> Result<(), ParseError> {
        // Whitespace after a leading `!` deepens the text's indent.
        let (contents, interpolate, extra_indent) =
            if self.tokeniser.token().is(TokenKind::Exclamation) {
                self.tokeniser.next_token();
                let extra_indent = self.whitespace();
                (self.tokeniser.skip_to_end_of_line(), false, extra_indent)
            } else {
                let line = self.tokeniser.skip_to_end_of_line();
                let line = match line.strip_prefix('\\') {
                    Some(escaped) => escaped.to_string(),
                    None => line,
                };
                (line, true, 0)
            };

        if !contents.is_empty() {
            let has_element = head.has_element();
            let framed = if has_element {
                head.options.inner_whitespace
            } else {
                self.elements.parent_inner_whitespace(indent)
            };
            let text = if framed {
                let depth = if has_element { indent + 1 } else { indent + extra_indent };
                indent_text(depth) + &contents
            } else {
                contents.trim().to_string()
            };
            self.generator
                .append_text_contents(&text, interpolate, point, TextProcessing::None);
            let eol = self.newline();
            self.generator.buffer().append(&eol);
        }

        self.eol_or_eof()
    }

    fn open_element(&mut self, indent: usize, head: &LineHead, point: &ParsePoint) {
        let name = head.element.clone().unwrap_or_else(|| "div".to_string());
        let options = head.options;

        if !options.outer_whitespace {
            self.generator.buffer().trim_whitespace();
        }
        if indent > 0 && options.outer_whitespace && self.elements.parent_inner_whitespace(indent) {
            self.generator.buffer().append(&indent_text(indent));
        }
        self.generator.buffer().append(&format!("<{name}"));

        let attributes = &head.attributes;
        if attributes.is_dynamic() {
            self.generator
                .generate_code_for_dynamic_attributes(attributes, point);
        } else {
            let rendered = render_static_attributes(
                &attributes.ids,
                &attributes.classes,
                &attributes.attributes,
            );
            self.generator.buffer().append(&rendered);
        }

        if options.self_closing {
            self.generator.buffer().append("/>");
            if options.outer_whitespace {
                self.generator.buffer().append("\n");
            }
        } else {
            self.generator.buffer().append(">");
            if options.inner_whitespace {
                self.generator.buffer().append("\n");
            }
            self.elements.set(indent, Element::Tag { name, options });
        }
    }

    fn element_name(&mut self) -> Option<String> {
        if !self.tokeniser.token().is(TokenKind::Element) {
            return None;
        }
        let name = self.tokeniser.token().text.clone();
        self.tokeniser.next_token();
        Some(name)
    }

    /// `#id` and `.class` in any order; both accumulate.
    fn selectors(&mut self, attributes: &mut DynamicAttributes) {
        loop {
            let token = self.tokeniser.token();
            match token.kind {
                TokenKind::IdSelector => attributes.ids.push(token.text.clone()),
                TokenKind::ClassSelector => attributes.classes.push(token.text.clone()),
                _ => return,
            }
            self.tokeniser.next_token();
        }
    }

    fn object_reference(&mut self) -> Option<String> {
        if !self.tokeniser.token().is(TokenKind::ObjectRef) {
            return None;
        }
        let reference = self.tokeniser.token().text.clone();
        self.tokeniser.next_token();
        Some(reference)
    }

    /// Trailing `/` (self-closing), `>` (no outer whitespace), `<` (no inner whitespace).
    fn tag_modifiers(&mut self, options: &mut TagOptions) {
        if self.tokeniser.token().is(TokenKind::Slash) {
            options.self_closing = true;
            self.tokeniser.next_token();
        }
        loop {
            match self.tokeniser.kind() {
                TokenKind::Gt if options.outer_whitespace => options.outer_whitespace = false,
                TokenKind::Lt if options.inner_whitespace => options.inner_whitespace = false,
                _ => return,
            }
            self.tokeniser.next_token();
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Run `parse` with the tokeniser in `mode`, returning to the default mode
    /// whatever the outcome.
    fn in_mode<T>(
        &mut self,
        mode: LexerMode,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.tokeniser.set_mode(mode);
        let result = parse(self);
        self.tokeniser.clear_mode();
        result
    }

    /// `(name="value" name=value …)`, possibly spanning lines.
    fn attribute_list(&mut self) -> Result<Vec<(String, String)>, ParseError> {
        if !self.tokeniser.token().is(TokenKind::OpenBracket) {
            return Ok(Vec::new());
        }
        let attributes = self.in_mode(LexerMode::AttrList, |compiler| {
            compiler.tokeniser.next_token();
            let mut attributes = Vec::new();
            loop {
                match compiler.tokeniser.kind() {
                    TokenKind::CloseBracket => return Ok(attributes),
                    TokenKind::HtmlIdentifier => attributes.push(compiler.attribute()?),
                    TokenKind::Ws | TokenKind::Eol => {
                        compiler.tokeniser.next_token();
                    }
                    _ => {
                        return Err(compiler.error(
                            "Expecting either an attribute name to continue the attributes or a closing bracket to end",
                        ))
                    }
                }
            }
        })?;
        self.tokeniser.next_token();
        Ok(attributes)
    }

    /// `name = "value"` inside an attribute list.
    fn attribute(&mut self) -> Result<(String, String), ParseError> {
        let name = self.tokeniser.token().text.clone();
        self.tokeniser.next_token();
        self.skip_whitespace();
        if !self.tokeniser.token().is(TokenKind::Equal) {
            return Err(self.error("Expected '=' after attribute name"));
        }
        self.tokeniser.next_token();
        self.skip_whitespace();
        if !matches!(
            self.tokeniser.kind(),
            TokenKind::String | TokenKind::HtmlIdentifier
        ) {
            return Err(self.error(
                "Expected a quoted string or an identifier for the attribute value",
            ));
        }
        let value = self.tokeniser.token().text.clone();
        self.tokeniser.next_token();
        Ok((name, value))
    }

    /// `{key: expr, …}`; each value expression is scanned by the generator.
    fn attribute_hash(&mut self) -> Result<Vec<(String, String)>, ParseError> {
        if !self.tokeniser.token().is(TokenKind::OpenBrace) {
            return Ok(Vec::new());
        }
        let entries = self.in_mode(LexerMode::AttrHash, |compiler| {
            compiler.tokeniser.next_token();
            let mut entries = Vec::new();
            loop {
                compiler.skip_blank();
                match compiler.tokeniser.kind() {
                    TokenKind::CloseBrace => return Ok(entries),
                    TokenKind::CodeId => entries.push(compiler.hash_entry()?),
                    _ => {
                        return Err(compiler.error("Expected an identifier for the attribute hash key"))
                    }
                }

                compiler.tokeniser.next_token();
                compiler.skip_blank();
                match compiler.tokeniser.kind() {
                    TokenKind::Comma => {
                        compiler.tokeniser.next_token();
                    }
                    TokenKind::CloseBrace => return Ok(entries),
                    _ => {
                        return Err(compiler.error("Expected ',' or '}' after attribute hash value"))
                    }
                }
            }
        })?;
        self.tokeniser.next_token();
        Ok(entries)
    }

    /// `key: expr`. Leaves the tokeniser just after the expression.
    fn hash_entry(&mut self) -> Result<(String, String), ParseError> {
        let key = self.tokeniser.token().text.clone();
        self.tokeniser.next_token();
        self.skip_whitespace();
        if !self.tokeniser.token().is(TokenKind::Colon) {
            return Err(self.error("Expected ':' after attribute hash key"));
        }
        let value = self.generator.scan_embedded_code(&mut self.tokeniser)?;
        if value.is_empty() {
            return Err(self.error(&format!(
                "Expected an expression for attribute hash key '{key}'"
            )));
        }
        Ok((key, value))
    }

    // =========================================================================
    // Closing
    // =========================================================================

    /// Close every open construct at `indent` or deeper, deepest first.
    fn close_elements(&mut self, indent: usize) {
        let Some(highest) = self.elements.highest() else {
            return;
        };
        for depth in (indent..=highest).rev() {
            self.close_element(depth);
        }
    }

    fn close_element(&mut self, depth: usize) {
        let Some(element) = self.elements.take(depth) else {
            return;
        };
        self.generator.set_indent(depth);

        match element {
            Element::HtmlComment { eol } => {
                let close = format!("{}-->{eol}", indent_text(depth));
                self.generator.buffer().append(&close);
            }
            Element::ConditionalComment { eol } => {
                let close = format!("{}<![endif]-->{eol}", indent_text(depth));
                self.generator.buffer().append(&close);
            }
            Element::CodeBlock => self.generator.close_off_code_block(&self.tokeniser),
            Element::FunctionBlock => self.generator.close_off_function_block(&self.tokeniser),
            Element::Tag { name, options } => {
                if options.inner_whitespace {
                    self.generator.buffer().append(&indent_text(depth));
                } else {
                    self.generator.buffer().trim_whitespace();
                }
                self.generator.buffer().append(&format!("</{name}>"));
                if options.outer_whitespace && self.elements.parent_inner_whitespace(depth) {
                    self.generator.buffer().append("\n");
                }
            }
        }
    }

    // =========================================================================
    // Blocks and recovery
    // =========================================================================

    /// Consume the rest of the current line and every following line indented
    /// deeper than `indent`, returning those lines without their first
    /// `2 * indent` characters.
    ///
    /// Blank lines are part of the block when it carries on below them.
    fn take_block(&mut self, indent: usize) -> Vec<String> {
        self.tokeniser.skip_to_end_of_line();
        self.consume_line_end();

        let mut lines = Vec::new();
        loop {
            let token = self.tokeniser.token().clone();
            let blank = match token.kind {
                TokenKind::Eof => return lines,
                TokenKind::Eol | TokenKind::ContinueLine => true,
                TokenKind::Ws => self.tokeniser.look_ahead(1).ends_line(),
                _ => false,
            };

            if blank {
                if !self.block_continues(indent) {
                    return lines;
                }
                lines.push(String::new());
                if token.is(TokenKind::Ws) {
                    self.tokeniser.next_token();
                }
                self.consume_line_end();
                continue;
            }

            if Self::indent_of(&token) <= indent {
                return lines;
            }
            let line = self.tokeniser.skip_to_end_of_line();
            lines.push(trim_start_chars(&line, 2 * indent).to_string());
            self.consume_line_end();
        }
    }

    /// Whether a line indented deeper than `indent` follows the blank line the
    /// tokeniser is on, with nothing but blank lines in between.
    fn block_continues(&mut self, indent: usize) -> bool {
        let mut ahead = 1;
        loop {
            let token = self.tokeniser.look_ahead(ahead);
            match token.kind {
                TokenKind::Eol | TokenKind::ContinueLine => ahead += 1,
                TokenKind::Ws => {
                    let after = self.tokeniser.look_ahead(ahead + 1);
                    if after.is(TokenKind::Eof) {
                        return false;
                    }
                    if after.ends_line() {
                        ahead += 2;
                        continue;
                    }
                    return Self::indent_of(&token) > indent;
                }
                _ => return false,
            }
        }
    }

    /// After a fault: skip the rest of the line and any deeper lines, stopping at
    /// the first line indented at most `indent`.
    fn skip_to_next_line_with_indent(&mut self, indent: usize) -> Result<(), ParseError> {
        self.tokeniser.clear_mode();
        self.tokeniser.skip_to_end_of_line();
        self.consume_line_end();

        while !self.tokeniser.token().is(TokenKind::Eof) {
            let had_whitespace = self.tokeniser.token().is(TokenKind::Ws);
            let line_indent = self.whitespace();
            if line_indent <= indent || self.tokeniser.is_eol_or_eof() {
                if had_whitespace && !self.tokeniser.token().is(TokenKind::Eof) {
                    self.tokeniser.push_back()?;
                }
                return Ok(());
            }
            self.tokeniser.skip_to_end_of_line();
            self.consume_line_end();
        }
        Ok(())
    }

    /// Whether the tag or comment on this line has contents: inline text, or a
    /// more deeply indented line right below.
    fn tag_has_contents(&mut self, indent: usize) -> bool {
        if self.has_inline_contents() {
            return true;
        }
        let ahead = match self.tokeniser.kind() {
            TokenKind::Eof => return false,
            TokenKind::Ws => 2,
            _ => 1,
        };
        let next = self.tokeniser.look_ahead(ahead);
        next.is(TokenKind::Ws) && Self::indent_of(&next) > indent
    }

    fn has_inline_contents(&mut self) -> bool {
        if self.tokeniser.token().is(TokenKind::Ws) {
            !self.tokeniser.look_ahead(1).ends_line()
        } else {
            !self.tokeniser.is_eol_or_eof()
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    /// Consume a leading whitespace token and return its indent level.
    fn whitespace(&mut self) -> usize {
        if !self.tokeniser.token().is(TokenKind::Ws) {
            return 0;
        }
        let indent = Tokeniser::calculate_indent(&self.tokeniser.token().text);
        self.tokeniser.next_token();
        indent
    }

    fn skip_whitespace(&mut self) {
        if self.tokeniser.token().is(TokenKind::Ws) {
            self.tokeniser.next_token();
        }
    }

    fn skip_blank(&mut self) {
        while matches!(self.tokeniser.kind(), TokenKind::Ws | TokenKind::Eol) {
            self.tokeniser.next_token();
        }
    }

    fn indent_of(token: &Token) -> usize {
        if token.is(TokenKind::Ws) {
            Tokeniser::calculate_indent(&token.text)
        } else {
            0
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(
            self.tokeniser.kind(),
            TokenKind::Eol | TokenKind::ContinueLine
        )
    }

    fn consume_line_end(&mut self) {
        if self.at_line_end() {
            self.tokeniser.next_token();
        }
    }

    fn eol_or_eof(&mut self) -> Result<(), ParseError> {
        if self.at_line_end() {
            self.tokeniser.next_token();
            Ok(())
        } else if self.tokeniser.token().is(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.error("Expected EOL or EOF"))
        }
    }

    /// The line ending to write for the current token: the newline itself, the
    /// newline after a `|` marker, or `\n` at the end of input.
    fn newline(&self) -> String {
        let token = self.tokeniser.token();
        match token.kind {
            TokenKind::Eol => token.matched.clone(),
            TokenKind::ContinueLine => token.matched[1..]
                .trim_start_matches([' ', '\t'])
                .to_string(),
            _ => "\n".to_string(),
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::new(message, self.tokeniser.current_parse_point())
    }
}
