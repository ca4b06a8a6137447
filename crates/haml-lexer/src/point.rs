/// Snapshot of where the tokeniser was when a construct started.
///
/// `column` counts the characters consumed on the current line, so a caret drawn
/// with `column - 1` dashes lands on the last consumed character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePoint {
    pub line: usize,
    pub column: usize,
    pub line_text: String,
}

impl ParsePoint {
    pub fn new(line: usize, column: usize, line_text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            line_text: line_text.into(),
        }
    }

    /// Render `message` in the template diagnostic format:
    ///
    /// ```text
    /// <message> at line <N> and character <C>:
    /// <source line>
    /// ----^
    /// ```
    pub fn error_message(&self, message: &str) -> String {
        format!(
            "{message} at line {} and character {}:\n{}\n{}^",
            self.line,
            self.column,
            self.line_text,
            "-".repeat(self.column.saturating_sub(1))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_message_format() {
        let point = ParsePoint::new(3, 5, "%p(a b)");
        assert_eq!(
            point.error_message("Expected '=' after attribute name"),
            "Expected '=' after attribute name at line 3 and character 5:\n%p(a b)\n----^"
        );
    }

    #[test]
    fn test_error_message_at_line_start() {
        let point = ParsePoint::new(1, 0, ":missing");
        assert_eq!(
            point.error_message("Oops"),
            "Oops at line 1 and character 0:\n:missing\n^"
        );
    }
}
