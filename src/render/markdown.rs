//! Markdown reconstruction from typed blocks.

use serde_json::Value;

use crate::model::{fields, BlockContent, BlockKind, InlineSpan, Table, TableRow, TypedBlock};
use crate::segment::strip_math_delimiters;

use super::{RenderOptions, TableFallback};

/// Convert a block list to Markdown.
pub fn to_markdown(blocks: &[TypedBlock], options: &RenderOptions) -> String {
    MarkdownRenderer::new(options.clone()).render(blocks)
}

/// Render a table as a pipe table.
///
/// The row after `max(header_rows, 1)` rows is the separator. Short rows are
/// padded to the widest row and `|` inside cells is escaped.
pub fn table_to_markdown(table: &Table) -> String {
    let columns = table.column_count();
    if columns == 0 {
        return String::new();
    }

    let header_end = (table.header_rows as usize).max(1);
    let mut lines = Vec::with_capacity(table.row_count() + 1);

    for (i, row) in table.rows.iter().enumerate() {
        let mut line = String::from("|");
        for col in 0..columns {
            let text = row.cells.get(col).map_or("", |c| c.text.as_str());
            line.push(' ');
            line.push_str(&markdown_cell(text));
            line.push_str(" |");
        }
        lines.push(line);

        if i + 1 == header_end {
            lines.push(format!("|{}", " --- |".repeat(columns)));
        }
    }

    lines.join("\n")
}

/// Render a table as HTML with `thead`/`tbody` sections and span attributes.
pub fn table_to_html(table: &Table) -> String {
    let mut output = String::from("<table>\n");

    if !table.header().is_empty() {
        output.push_str("<thead>\n");
        for row in table.header() {
            render_html_row(&mut output, row, "th");
        }
        output.push_str("</thead>\n");
    }

    output.push_str("<tbody>\n");
    for row in table.body() {
        render_html_row(&mut output, row, "td");
    }
    output.push_str("</tbody>\n</table>");
    output
}

fn render_html_row(output: &mut String, row: &TableRow, tag: &str) {
    output.push_str("<tr>");
    for cell in &row.cells {
        output.push('<');
        output.push_str(tag);
        if cell.rowspan > 1 {
            output.push_str(&format!(" rowspan=\"{}\"", cell.rowspan));
        }
        if cell.colspan > 1 {
            output.push_str(&format!(" colspan=\"{}\"", cell.colspan));
        }
        output.push('>');
        output.push_str(&escape_html(&cell.text));
        output.push_str(&format!("</{tag}>"));
    }
    output.push_str("</tr>\n");
}

/// Markdown renderer.
///
/// Blocks are rendered in document order. Lists are walked with an explicit
/// stack, so nesting depth is bounded by memory rather than the call stack.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

/// Position of a block inside a list.
struct ListItem {
    depth: usize,
    marker: String,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a block list to Markdown.
    pub fn render(&self, blocks: &[TypedBlock]) -> String {
        let mut output = String::new();
        let mut stack: Vec<(&TypedBlock, Option<ListItem>)> =
            blocks.iter().rev().map(|b| (b, None)).collect();

        while let Some((block, item)) = stack.pop() {
            if block.kind == BlockKind::List {
                let inline = self.inline_text(block);
                let parent_depth = item.as_ref().map_or(0, |i| i.depth);

                let child_depth = if inline.trim().is_empty() {
                    parent_depth + 1
                } else {
                    let item = item.unwrap_or_else(|| self.list_item(1, 0, false));
                    push_item(&mut output, &item, &inline);
                    item.depth + 1
                };

                let ordered = block.attrs.get("ordered").and_then(Value::as_bool) == Some(true);
                let children = block.children.iter().enumerate().rev();
                stack.extend(children.map(|(i, child)| {
                    (child, Some(self.list_item(child_depth, i, ordered)))
                }));
                continue;
            }

            match item {
                Some(item) if block.kind.is_textual() => {
                    push_item(&mut output, &item, &self.inline_text(block));
                }
                _ => {
                    let rendered = self.render_block(block);
                    if !rendered.is_empty() {
                        ensure_block_gap(&mut output);
                        output.push_str(&rendered);
                        output.push_str("\n\n");
                    }
                }
            }
            stack.extend(block.children.iter().rev().map(|c| (c, None)));
        }

        output.trim().to_string()
    }

    fn list_item(&self, depth: usize, index: usize, ordered: bool) -> ListItem {
        let marker = if ordered {
            format!("{}.", index + 1)
        } else {
            self.options.list_marker.to_string()
        };
        ListItem { depth, marker }
    }

    /// Render a single non-list block, without its children.
    fn render_block(&self, block: &TypedBlock) -> String {
        match &block.kind {
            BlockKind::Heading => {
                let text = self.inline_text(block);
                if text.trim().is_empty() {
                    return String::new();
                }
                let level = heading_level(block).clamp(1, self.options.max_heading_level.max(1));
                format!("{} {}", "#".repeat(level as usize), text.trim())
            }
            BlockKind::Code => match block.text_or_field(fields::CODE) {
                Some(code) => {
                    let language = block.field(fields::LANGUAGE).unwrap_or_default();
                    format!("```{language}\n{}\n```", code.trim_end_matches('\n'))
                }
                None => String::new(),
            },
            BlockKind::CodeSpan => block
                .text_or_field(fields::CODE)
                .map(|code| format!("`{code}`"))
                .unwrap_or_default(),
            BlockKind::FormulaBlock => block
                .text_or_field(fields::FORMULA)
                .map(|latex| format!("$$\n{}\n$$", strip_math_delimiters(&latex)))
                .unwrap_or_default(),
            BlockKind::FormulaInline => block
                .text_or_field(fields::FORMULA)
                .map(|latex| format!("${}$", strip_math_delimiters(&latex)))
                .unwrap_or_default(),
            BlockKind::Table => self.render_table(block),
            kind if kind.is_media() => self.render_media(block),
            _ => self.inline_text(block).trim().to_string(),
        }
    }

    fn render_table(&self, block: &TypedBlock) -> String {
        if let Some(text) = block.content.as_text().filter(|t| !t.trim().is_empty()) {
            return text.trim().to_string();
        }
        if let Some(html) = block.field(fields::TABLE_HTML) {
            return html.trim().to_string();
        }
        if let Some(markdown) = block.field(fields::TABLE_MARKDOWN) {
            return markdown.trim().to_string();
        }

        let Some(rows) = block.field_value(fields::TABLE_ROWS).and_then(Value::as_array) else {
            return String::new();
        };
        let mut table = Table::from_json_rows(rows);
        table.header_rows = 1;
        match self.options.table_fallback {
            TableFallback::Markdown => table_to_markdown(&table),
            TableFallback::Html => table_to_html(&table),
        }
    }

    fn render_media(&self, block: &TypedBlock) -> String {
        if !self.options.include_media {
            return String::new();
        }
        let Some(url) = block.field(fields::IMAGE_URL) else {
            return String::new();
        };
        let alt = block.field(fields::IMAGE_ALT).unwrap_or_default();
        match block.kind {
            BlockKind::Image => format!("![{alt}]({url})"),
            _ => format!("[{}]({url})", if alt.is_empty() { block.kind.as_tag() } else { alt }),
        }
    }

    /// Flatten a block's inline content, marking up code and math spans.
    fn inline_text(&self, block: &TypedBlock) -> String {
        match &block.content {
            BlockContent::Text(text) => self.escape(text),
            BlockContent::Spans(spans) => {
                spans.iter().map(|span| self.render_span(span)).collect()
            }
            BlockContent::Fields(_) | BlockContent::Empty => block
                .field(fields::TEXT)
                .map(|text| self.escape(text))
                .unwrap_or_default(),
        }
    }

    fn render_span(&self, span: &InlineSpan) -> String {
        match span.kind {
            BlockKind::Code | BlockKind::CodeSpan => format!("`{}`", span.text),
            BlockKind::FormulaInline => format!("${}$", strip_math_delimiters(&span.text)),
            BlockKind::FormulaBlock => format!("$${}$$", strip_math_delimiters(&span.text)),
            ref kind if kind.is_media() => String::new(),
            _ => self.escape(&span.text),
        }
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

fn push_item(output: &mut String, item: &ListItem, text: &str) {
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    output.push_str(&"  ".repeat(item.depth.saturating_sub(1)));
    output.push_str(&item.marker);
    output.push(' ');
    output.push_str(text.trim());
    output.push('\n');
}

/// Separate a block from a preceding run of list items.
fn ensure_block_gap(output: &mut String) {
    if output.ends_with('\n') && !output.ends_with("\n\n") {
        output.push('\n');
    }
}

fn heading_level(block: &TypedBlock) -> u8 {
    let level = match block.field_value(fields::HEADING_LEVEL) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    level.map_or(1, |l| l.min(6) as u8)
}

fn markdown_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

/// Escape special Markdown characters.
/// Only characters that would otherwise change inline formatting.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '|' | '$') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
