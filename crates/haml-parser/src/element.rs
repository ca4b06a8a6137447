//! Open constructs, indexed by indent depth.

/// Whitespace and closing behaviour of one tag, fixed when its line is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagOptions {
    pub self_closing: bool,
    /// Newline and indent just inside the tag (cleared by `<`).
    pub inner_whitespace: bool,
    /// Newline and indent around the tag (cleared by `>`).
    pub outer_whitespace: bool,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self {
            self_closing: false,
            inner_whitespace: true,
            outer_whitespace: true,
        }
    }
}

/// A construct left open at some indent, waiting for indentation to drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Tag { name: String, options: TagOptions },
    /// `/ text`, closed with `-->` and the line ending it was opened with.
    HtmlComment { eol: String },
    /// `/[if IE]`, closed with `<![endif]-->`.
    ConditionalComment { eol: String },
    CodeBlock,
    FunctionBlock,
}

/// Sparse stack of open constructs: slot `d` holds what was opened at indent `d`.
///
/// Slots past the end read as empty, and `set` grows the backing vector on demand.
#[derive(Debug, Default)]
pub struct ElementStack {
    slots: Vec<Option<Element>>,
}

impl ElementStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, depth: usize) -> Option<&Element> {
        self.slots.get(depth).and_then(Option::as_ref)
    }

    pub fn set(&mut self, depth: usize, element: Element) {
        if self.slots.len() <= depth {
            self.slots.resize(depth + 1, None);
        }
        self.slots[depth] = Some(element);
    }

    pub fn take(&mut self, depth: usize) -> Option<Element> {
        let element = self.slots.get_mut(depth).and_then(Option::take);
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        element
    }

    /// Index of the deepest slot that may be occupied.
    pub fn highest(&self) -> Option<usize> {
        self.slots.len().checked_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Whether content at `depth` may be framed by newlines and indentation.
    ///
    /// True at depth 0, and below anything that is not a tag; otherwise the parent
    /// tag's inner whitespace flag decides.
    pub fn parent_inner_whitespace(&self, depth: usize) -> bool {
        if depth == 0 {
            return true;
        }
        match self.get(depth - 1) {
            Some(Element::Tag { options, .. }) => options.inner_whitespace,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag(name: &str, inner_whitespace: bool) -> Element {
        Element::Tag {
            name: name.to_string(),
            options: TagOptions {
                inner_whitespace,
                ..TagOptions::default()
            },
        }
    }

    #[test]
    fn test_missing_slots_read_as_empty() {
        let mut stack = ElementStack::new();
        assert_eq!(stack.get(4), None);
        stack.set(3, Element::CodeBlock);
        assert_eq!(stack.get(0), None);
        assert_eq!(stack.get(3), Some(&Element::CodeBlock));
        assert_eq!(stack.highest(), Some(3));
    }

    #[test]
    fn test_take_shrinks_trailing_empty_slots() {
        let mut stack = ElementStack::new();
        stack.set(0, tag("div", true));
        stack.set(2, tag("p", true));
        assert_eq!(stack.take(2), Some(tag("p", true)));
        assert_eq!(stack.highest(), Some(0));
        assert_eq!(stack.take(2), None);
        stack.take(0);
        assert!(stack.is_empty());
        assert_eq!(stack.highest(), None);
    }

    #[test]
    fn test_parent_inner_whitespace() {
        let mut stack = ElementStack::new();
        assert!(stack.parent_inner_whitespace(0));
        assert!(stack.parent_inner_whitespace(1));

        stack.set(0, tag("p", false));
        assert!(!stack.parent_inner_whitespace(1));
        assert!(stack.parent_inner_whitespace(0));

        stack.set(1, Element::HtmlComment { eol: "\n".into() });
        assert!(stack.parent_inner_whitespace(2));
    }
}
