//! Table source format detection.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::segment::{pipe_table_spans, Claims};

static TABLE_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<table\b").expect("static regex"));

/// Format of a table source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// HTML `<table>` markup
    Html,
    /// Markdown pipe table
    Markdown,
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableFormat::Html => write!(f, "HTML"),
            TableFormat::Markdown => write!(f, "Markdown"),
        }
    }
}

/// Detect the table format of a string.
///
/// # Returns
/// * `Some(TableFormat::Html)` if the text contains a `<table>` tag
/// * `Some(TableFormat::Markdown)` if it contains a pipe table with a
///   header separator, or every non-blank line is fenced by pipes
/// * `None` otherwise
///
/// # Example
/// ```
/// use docscore::detect::{detect_table_format, TableFormat};
///
/// assert_eq!(detect_table_format("<table></table>"), Some(TableFormat::Html));
/// assert_eq!(detect_table_format("| a |\n|---|"), Some(TableFormat::Markdown));
/// assert_eq!(detect_table_format("plain"), None);
/// ```
pub fn detect_table_format(text: &str) -> Option<TableFormat> {
    if TABLE_OPEN_RE.is_match(text) {
        return Some(TableFormat::Html);
    }
    if !pipe_table_spans(text, &Claims::new()).is_empty() || is_pipe_fenced(text) {
        return Some(TableFormat::Markdown);
    }
    None
}

/// Check if text is a table in any supported format.
pub fn is_table(text: &str) -> bool {
    detect_table_format(text).is_some()
}

/// Every non-blank line starts and ends with a pipe.
fn is_pipe_fenced(text: &str) -> bool {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
    lines.peek().is_some() && lines.all(|l| l.len() > 1 && l.starts_with('|') && l.ends_with('|'))
}
