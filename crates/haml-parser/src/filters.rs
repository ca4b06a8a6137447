//! Named filters for `:name` blocks.
//!
//! A filter receives the block's lines (already stripped of the enclosing
//! indentation), the generator, the indent of the `:name` line and where the
//! block started.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use haml_lexer::ParsePoint;

use crate::generator::{Generator, TextProcessing};
use crate::runtime::{indent_text, trim_start_chars};
use crate::ParseError;

pub type FilterFn =
    dyn Fn(&[String], &mut dyn Generator, usize, &ParsePoint) -> Result<(), ParseError> + Send + Sync;

/// Filters by name. Read-only once built, so one registry can serve any number
/// of compiles.
#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Box<FilterFn>>,
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("FilterRegistry").field("filters", &names).finish()
    }
}

impl FilterRegistry {
    /// A registry with no filters at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// `plain`, `javascript`, `css`, `cdata`, `preserve` and `escaped`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("plain", plain);
        registry.register("javascript", javascript);
        registry.register("css", css);
        registry.register("cdata", cdata);
        registry.register("preserve", preserve);
        registry.register("escaped", escaped);
        registry
    }

    /// Add a filter, replacing any filter already registered under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&[String], &mut dyn Generator, usize, &ParsePoint) -> Result<(), ParseError>
            + Send
            + Sync
            + 'static,
    {
        self.filters.insert(name.into(), Box::new(filter));
    }

    pub fn get(&self, name: &str) -> Option<&FilterFn> {
        self.filters.get(name).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.keys().map(String::as_str).collect()
    }
}

static DEFAULT_FILTERS: LazyLock<FilterRegistry> = LazyLock::new(FilterRegistry::with_builtins);

/// The shared registry of built-in filters.
pub fn default_filters() -> &'static FilterRegistry {
    &DEFAULT_FILTERS
}

// =============================================================================
// Built-in filters
// =============================================================================

fn plain(
    lines: &[String],
    generator: &mut dyn Generator,
    indent: usize,
    point: &ParsePoint,
) -> Result<(), ParseError> {
    let prefix = indent_text(indent.saturating_sub(1));
    for line in lines {
        generator.append_text_contents(&format!("{prefix}{line}\n"), true, point, TextProcessing::None);
    }
    Ok(())
}

fn escaped(
    lines: &[String],
    generator: &mut dyn Generator,
    indent: usize,
    point: &ParsePoint,
) -> Result<(), ParseError> {
    let prefix = indent_text(indent.saturating_sub(1));
    for line in lines {
        generator.append_text_contents(
            &format!("{prefix}{line}\n"),
            true,
            point,
            TextProcessing::EscapeHtml,
        );
    }
    Ok(())
}

/// Wrap the block in `open` / `close`, with CDATA markers one level deeper.
fn wrapped(
    lines: &[String],
    generator: &mut dyn Generator,
    indent: usize,
    point: &ParsePoint,
    (open, cdata_open, cdata_close, close): (&str, &str, &str, &str),
) {
    let outer = indent_text(indent);
    let inner = indent_text(indent + 1);
    generator.buffer().append(&format!("{outer}{open}\n{inner}{cdata_open}\n"));
    for line in lines {
        generator.append_text_contents(&format!("{inner}{line}\n"), true, point, TextProcessing::None);
    }
    generator.buffer().append(&format!("{inner}{cdata_close}\n{outer}{close}\n"));
}

fn javascript(
    lines: &[String],
    generator: &mut dyn Generator,
    indent: usize,
    point: &ParsePoint,
) -> Result<(), ParseError> {
    let markers = (
        r#"<script type="text/javascript">"#,
        "//<![CDATA[",
        "//]]>",
        "</script>",
    );
    wrapped(lines, generator, indent, point, markers);
    Ok(())
}

fn css(
    lines: &[String],
    generator: &mut dyn Generator,
    indent: usize,
    point: &ParsePoint,
) -> Result<(), ParseError> {
    let markers = (r#"<style type="text/css">"#, "/*<![CDATA[*/", "/*]]>*/", "</style>");
    wrapped(lines, generator, indent, point, markers);
    Ok(())
}

fn cdata(
    lines: &[String],
    generator: &mut dyn Generator,
    indent: usize,
    point: &ParsePoint,
) -> Result<(), ParseError> {
    let prefix = indent_text(indent);
    generator.buffer().append(&format!("{prefix}<![CDATA[\n"));
    for line in lines {
        generator.append_text_contents(&format!("{prefix}{line}\n"), true, point, TextProcessing::None);
    }
    generator.buffer().append(&format!("{prefix}]]>\n"));
    Ok(())
}

/// Join the block into one line, keeping the line breaks as `&#x000A;`.
fn preserve(
    lines: &[String],
    generator: &mut dyn Generator,
    indent: usize,
    point: &ParsePoint,
) -> Result<(), ParseError> {
    generator.append_text_contents(&indent_text(indent), false, point, TextProcessing::None);
    let joined = lines
        .iter()
        .map(|line| trim_start_chars(line, 2))
        .collect::<Vec<_>>()
        .join("&#x000A; ");
    generator.append_text_contents(&format!("{joined}\n"), true, point, TextProcessing::None);
    Ok(())
}
