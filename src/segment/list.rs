//! Typed-block segmentation.
//!
//! Blocks are visited in document order (pre-order) with an explicit stack,
//! so deeply nested lists cannot exhaust the call stack.

use crate::model::{fields, BlockKind, Table, TypedBlock};
use crate::render::table_to_html;

use super::{Buckets, Category};

/// Route every block (and its descendants) into the buckets.
pub(crate) fn collect(blocks: &[TypedBlock], buckets: &mut Buckets<'_>) {
    let mut stack: Vec<&TypedBlock> = blocks.iter().rev().collect();

    while let Some(block) = stack.pop() {
        visit(block, buckets);
        stack.extend(block.children.iter().rev());
    }
}

fn visit(block: &TypedBlock, buckets: &mut Buckets<'_>) {
    match &block.kind {
        kind if kind.is_code() => {
            if let Some(code) = block.text_or_field(fields::CODE) {
                buckets.push(Category::Code, &code);
            }
        }
        kind if kind.is_formula() => {
            if let Some(latex) = block.text_or_field(fields::FORMULA) {
                buckets.push(Category::Formula, strip_math_delimiters(&latex));
            }
        }
        BlockKind::Table => {
            if let Some(table) = table_text(block) {
                buckets.push(Category::Table, &table);
            }
        }
        kind if kind.is_textual() => {
            let text = flatten_text(block, buckets);
            buckets.push(Category::Text, &text);
        }
        _ => {}
    }
}

/// Table source text of a block.
///
/// Row data carries no header, so it becomes an all-`td` HTML table.
fn table_text(block: &TypedBlock) -> Option<String> {
    if let Some(text) = block.content.as_text().filter(|t| !t.trim().is_empty()) {
        return Some(text.to_string());
    }
    if let Some(html) = block.field(fields::TABLE_HTML) {
        return Some(html.to_string());
    }
    if let Some(markdown) = block.field(fields::TABLE_MARKDOWN) {
        return Some(markdown.to_string());
    }

    let rows = block.field_value(fields::TABLE_ROWS)?.as_array()?;
    let table = Table::from_json_rows(rows);
    (!table.is_empty()).then(|| table_to_html(&table))
}

/// Flatten a textual block into a string.
///
/// Code and formula spans are kept in the text and also copied into their
/// own buckets. Media spans are dropped.
fn flatten_text(block: &TypedBlock, buckets: &mut Buckets<'_>) -> String {
    if let Some(text) = block.content.as_text() {
        return text.to_string();
    }

    let spans = block.content.spans();
    if spans.is_empty() {
        return block.field(fields::TEXT).unwrap_or_default().to_string();
    }

    let mut text = String::new();
    for span in spans {
        if span.kind.is_media() {
            continue;
        }
        if span.kind.is_code() {
            buckets.push(Category::Code, &span.text);
        } else if span.kind.is_formula() {
            buckets.push(Category::Formula, strip_math_delimiters(&span.text));
        }
        text.push_str(&span.text);
    }
    text
}

/// Strip one pair of `$$`, `$`, `\[ \]` or `\( \)` delimiters.
pub(crate) fn strip_math_delimiters(latex: &str) -> &str {
    let s = latex.trim();
    for (open, close) in [("$$", "$$"), ("\\[", "\\]"), ("\\(", "\\)"), ("$", "$")] {
        if s.len() >= open.len() + close.len() {
            if let Some(inner) = s.strip_prefix(open).and_then(|r| r.strip_suffix(close)) {
                return inner.trim();
            }
        }
    }
    s
}
