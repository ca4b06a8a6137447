//! Text helpers shared by the compiler and the generated templates.
//!
//! The generated code calls the runtime library's versions of these at render
//! time; the compiler uses them directly for everything known at compile time.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::generator::TextProcessing;

static INLINE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[a-zA-Z]+>[^<]*</[a-zA-Z]+>").expect("inline element pattern is valid")
});

/// Two spaces per indent level.
pub fn indent_text(indent: usize) -> String {
    "  ".repeat(indent)
}

/// Escape the five HTML special characters. `'` becomes `&#39;`.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Encode newlines inside simple `<tag>…</tag>` runs as `&#x000A;` so the
/// browser keeps them.
pub fn preserve_whitespace(text: &str) -> String {
    INLINE_ELEMENT
        .replace_all(text, |caps: &Captures| caps[0].replace('\n', "&#x000A;"))
        .into_owned()
}

pub fn process_text(text: &str, processing: TextProcessing) -> String {
    match processing {
        TextProcessing::None => text.to_string(),
        TextProcessing::EscapeHtml => escape_html(text),
        TextProcessing::PreserveWhitespace => preserve_whitespace(text),
    }
}

/// Drop up to `count` leading characters.
pub fn trim_start_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((index, _)) => &line[index..],
        None => "",
    }
}

// =============================================================================
// Doctypes
// =============================================================================

const HTML5_DOCTYPE: &str = "<!DOCTYPE html>";

/// Doctype declaration for the parameters following `!!!`.
///
/// Unknown keywords and an empty parameter list give the HTML5 doctype.
pub fn doctype(params: &str) -> String {
    let mut params = params.split_whitespace();
    let declaration = match params.next() {
        Some("XML") => {
            let encoding = params.next().unwrap_or("utf-8");
            return format!("<?xml version='1.0' encoding='{encoding}' ?>");
        }
        Some("Strict") => {
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#
        }
        Some("Frameset") => {
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#
        }
        Some("1.1") => {
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#
        }
        Some("Basic") => {
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML Basic 1.1//EN" "http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd">"#
        }
        Some("Mobile") => {
            r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#
        }
        Some("RDFa") => {
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML+RDFa 1.0//EN" "http://www.w3.org/MarkUp/DTD/xhtml-rdfa-1.dtd">"#
        }
        _ => HTML5_DOCTYPE,
    };
    declaration.to_string()
}

// =============================================================================
// Static attributes
// =============================================================================

#[derive(Debug)]
enum AttributeValue {
    Single(String),
    /// `id` and `for` values joined with `-`, or classes joined with a space.
    List(Vec<String>),
}

/// Attributes merged in the order they were first seen.
#[derive(Debug, Default)]
struct AttributeSet {
    entries: Vec<(String, AttributeValue)>,
}

impl AttributeSet {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// `id` and `for` accumulate into a list, `class` always does, anything else
    /// is overwritten in place.
    fn combine(&mut self, name: &str, value: &str) {
        let accumulates = matches!(name, "id" | "for");
        if accumulates && value.is_empty() {
            return;
        }
        let Some(index) = self.position(name) else {
            let value = if name == "class" {
                AttributeValue::List(vec![value.to_string()])
            } else {
                AttributeValue::Single(value.to_string())
            };
            self.entries.push((name.to_string(), value));
            return;
        };

        let entry = &mut self.entries[index].1;
        match entry {
            AttributeValue::List(values) if accumulates || name == "class" => {
                values.push(value.to_string())
            }
            AttributeValue::Single(first) if accumulates => {
                *entry = AttributeValue::List(vec![std::mem::take(first), value.to_string()]);
            }
            _ => *entry = AttributeValue::Single(value.to_string()),
        }
    }

    fn render(&self) -> String {
        let mut html = String::new();
        for (name, value) in &self.entries {
            let rendered = match value {
                AttributeValue::List(values) if name == "class" => values.join(" "),
                AttributeValue::List(values) => values.join("-"),
                AttributeValue::Single(_) if is_boolean_attribute(name) => name.clone(),
                AttributeValue::Single(value) => value.clone(),
            };
            html.push_str(&format!(" {name}=\"{rendered}\""));
        }
        html
    }
}

fn is_boolean_attribute(name: &str) -> bool {
    matches!(name, "selected" | "checked" | "disabled")
}

/// Render attributes known at compile time, in the form ` name="value"`.
///
/// Ids come first, then classes, then the attribute list in source order.
pub fn render_static_attributes(
    ids: &[String],
    classes: &[String],
    attributes: &[(String, String)],
) -> String {
    let mut set = AttributeSet::default();
    for id in ids {
        set.combine("id", id);
    }
    for class in classes {
        set.combine("class", class);
    }
    for (name, value) in attributes {
        set.combine(name, value);
    }
    set.render()
}
