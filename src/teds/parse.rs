//! Table sources to canonical trees.
//!
//! Parsing never fails outward: anything that does not contain a table
//! yields `None`.

use scraper::{ElementRef, Html};
use serde_json::Value;

use crate::detect::{detect_table_format, TableFormat};
use crate::model::Table;
use crate::segment::{html_table_spans, is_separator_line, pipe_table_spans, split_cells, Claims};

use super::tree::{TableTree, SPAN_ATTRS};

/// Tag of the synthetic root wrapping several tables.
pub const TABLES_TAG: &str = "tables";

/// A table in one of the accepted source shapes.
#[derive(Debug, Clone, Copy)]
pub enum TableSource<'a> {
    /// HTML fragment containing one or more `<table>` elements
    Html(&'a str),
    /// A single markdown pipe table
    Markdown(&'a str),
    /// Free text mixing HTML and markdown tables (a segmented table bucket)
    Mixed(&'a str),
    /// JSON rows (arrays of cells or objects of cells)
    Rows(&'a [Value]),
}

impl<'a> From<&'a str> for TableSource<'a> {
    fn from(text: &'a str) -> Self {
        TableSource::Mixed(text)
    }
}

impl<'a> From<&'a String> for TableSource<'a> {
    fn from(text: &'a String) -> Self {
        TableSource::Mixed(text)
    }
}

impl<'a> From<&'a [Value]> for TableSource<'a> {
    fn from(rows: &'a [Value]) -> Self {
        TableSource::Rows(rows)
    }
}

impl<'a> From<&'a Vec<Value>> for TableSource<'a> {
    fn from(rows: &'a Vec<Value>) -> Self {
        TableSource::Rows(rows)
    }
}

/// Build the canonical tree of a table source.
///
/// Several tables in one source are wrapped, in encounter order, in a
/// synthetic `tables` root. In `structure_only` mode node text is left
/// empty.
pub fn to_tree<'a>(source: impl Into<TableSource<'a>>, structure_only: bool) -> Option<TableTree> {
    match source.into() {
        TableSource::Html(html) => wrap(html_tables(html, structure_only)),
        TableSource::Markdown(markdown) => markdown_table(markdown, structure_only),
        TableSource::Rows(rows) => {
            let table = Table::from_json_rows(rows);
            (!table.is_empty()).then(|| table_tree(&table, structure_only))
        }
        TableSource::Mixed(text) => wrap(mixed_tables(text, structure_only)),
    }
}

/// Build the canonical tree of a row-model table.
///
/// Header rows use `th` cells; spans other than 1 become attributes.
pub fn table_tree(table: &Table, structure_only: bool) -> TableTree {
    let header_rows = table.header().len();
    let mut root = TableTree::new("table");
    for (i, row) in table.rows.iter().enumerate() {
        let tag = if i < header_rows { "th" } else { "td" };
        let mut tr = TableTree::new("tr");
        for cell in &row.cells {
            let mut node = cell_node(tag, &cell.text, structure_only);
            if cell.colspan != 1 {
                node.attrs.insert("colspan".into(), cell.colspan.to_string());
            }
            if cell.rowspan != 1 {
                node.attrs.insert("rowspan".into(), cell.rowspan.to_string());
            }
            tr.push(node);
        }
        root.push(tr);
    }
    root
}

fn wrap(mut trees: Vec<TableTree>) -> Option<TableTree> {
    match trees.len() {
        0 => None,
        1 => trees.pop(),
        _ => Some(TableTree {
            children: trees,
            ..TableTree::new(TABLES_TAG)
        }),
    }
}

fn mixed_tables(text: &str, structure_only: bool) -> Vec<TableTree> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut claims = Claims::new();
    let mut found: Vec<(usize, TableTree)> = Vec::new();

    let html_spans = html_table_spans(text, &claims);
    for range in html_spans {
        for tree in html_tables(&text[range.clone()], structure_only) {
            found.push((range.start, tree));
        }
        claims.claim(range);
    }
    for range in pipe_table_spans(text, &claims) {
        if let Some(tree) = markdown_table(&text[range.clone()], structure_only) {
            found.push((range.start, tree));
        }
    }

    // Unclosed `<table>` or a pipe table without a valid header.
    if found.is_empty() {
        let format = detect_table_format(text);
        if let Some(format) = format {
            log::debug!("no balanced table span, parsing whole text as {format}");
        }
        return match format {
            Some(TableFormat::Html) => html_tables(text, structure_only),
            Some(TableFormat::Markdown) => markdown_table(text, structure_only).into_iter().collect(),
            None => Vec::new(),
        };
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, tree)| tree).collect()
}

/// Parse a single markdown pipe table.
///
/// The first row is a header (`th` cells) when a separator line follows
/// it; separator lines are consumed, never emitted as rows.
fn markdown_table(text: &str, structure_only: bool) -> Option<TableTree> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let has_header = lines.len() >= 2 && is_separator_line(lines[1]);

    let mut root = TableTree::new("table");
    for (i, line) in lines.iter().enumerate() {
        if is_separator_line(line) || !line.contains('|') {
            continue;
        }
        let tag = if has_header && i == 0 { "th" } else { "td" };
        let mut tr = TableTree::new("tr");
        for cell in split_cells(line) {
            tr.push(cell_node(tag, &cell, structure_only));
        }
        root.push(tr);
    }

    (!root.children.is_empty()).then_some(root)
}

fn cell_node(tag: &str, text: &str, structure_only: bool) -> TableTree {
    let node = TableTree::new(tag);
    if structure_only {
        node
    } else {
        node.with_text(collapse_whitespace(text))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deepest `<table>` nesting kept as tree structure. Tables nested deeper
/// contribute their text to the enclosing cell.
pub const MAX_TABLE_DEPTH: usize = 32;

/// Parse every outermost `<table>` of an HTML fragment.
fn html_tables(html: &str, structure_only: bool) -> Vec<TableTree> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "table" && !inside_table(el))
        .map(|el| html_table(el, 1, structure_only))
        .collect()
}

fn inside_table(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "table")
}

fn html_table(table: ElementRef<'_>, depth: usize, structure_only: bool) -> TableTree {
    let mut root = TableTree::new("table");
    collect_rows(table, &mut root, depth, structure_only);
    root
}

/// Rows of a table; `thead`/`tbody`/`tfoot` are flattened, `caption` and
/// `colgroup` ignored.
fn collect_rows(parent: ElementRef<'_>, table: &mut TableTree, depth: usize, structure_only: bool) {
    for child in parent.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "thead" | "tbody" | "tfoot" => collect_rows(child, table, depth, structure_only),
            "tr" => table.push(html_row(child, depth, structure_only)),
            _ => {}
        }
    }
}

fn html_row(tr: ElementRef<'_>, depth: usize, structure_only: bool) -> TableTree {
    let mut row = TableTree::new("tr");
    for cell in tr.children().filter_map(ElementRef::wrap) {
        let tag = cell.value().name();
        if tag == "td" || tag == "th" {
            row.push(html_cell(cell, depth, structure_only));
        }
    }
    row
}

fn html_cell(cell: ElementRef<'_>, depth: usize, structure_only: bool) -> TableTree {
    let (text, nested) = cell_content(cell, depth, structure_only);

    let mut node = cell_node(cell.value().name(), &text, structure_only);
    for attr in SPAN_ATTRS {
        if let Some(value) = cell.value().attr(attr) {
            node.attrs.insert(attr.to_string(), value.trim().to_string());
        }
    }
    node.children = nested;
    node
}

/// Gather a cell's text; nested tables become child trees.
///
/// Walks with an explicit stack; `None` entries emit the space that closes
/// a block element.
fn cell_content(cell: ElementRef<'_>, depth: usize, structure_only: bool) -> (String, Vec<TableTree>) {
    let mut text = String::new();
    let mut nested = Vec::new();
    let mut stack: Vec<Option<_>> = cell.children().rev().map(Some).collect();

    while let Some(entry) = stack.pop() {
        let Some(node) = entry else {
            text.push(' ');
            continue;
        };
        if let Some(fragment) = node.value().as_text() {
            text.push_str(fragment);
            continue;
        }
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        match element.value().name() {
            "table" if depth < MAX_TABLE_DEPTH => {
                nested.push(html_table(element, depth + 1, structure_only));
            }
            "br" => text.push(' '),
            name => {
                if matches!(name, "p" | "div" | "li" | "tr" | "td" | "th") {
                    text.push(' ');
                    stack.push(None);
                }
                stack.extend(element.children().rev().map(Some));
            }
        }
    }

    (text, nested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_table_flattens_sections() {
        let html = "<table><thead><tr><th>A</th></tr></thead><tbody><tr><td> x  y </td></tr></tbody></table>";
        let tree = to_tree(TableSource::Html(html), false).unwrap();
        assert_eq!(tree.tag, "table");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].children[0].tag, "th");
        assert_eq!(tree.children[1].children[0].text, "x y");
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_html_without_table() {
        assert!(to_tree(TableSource::Html("<p>no table</p>"), false).is_none());
        assert!(to_tree(TableSource::Html(""), false).is_none());
        assert!(to_tree("plain words", false).is_none());
    }

    #[test]
    fn test_span_attributes_kept() {
        let tree = to_tree("<table><tr><td colspan=' 2 '>H</td></tr></table>", false).unwrap();
        let cell = &tree.children[0].children[0];
        assert_eq!(cell.span("colspan"), "2");
        assert_eq!(cell.span("rowspan"), "1");
    }

    #[test]
    fn test_nested_table_is_child_of_cell() {
        let html = "<table><tr><td>outer <b>bold</b><table><tr><td>inner</td></tr></table></td></tr></table>";
        let tree = to_tree(html, false).unwrap();
        let cell = &tree.children[0].children[0];
        assert_eq!(cell.text, "outer bold");
        assert_eq!(cell.children.len(), 1);
        assert_eq!(cell.children[0].tag, "table");
        assert_eq!(cell.children[0].children[0].children[0].text, "inner");
    }

    #[test]
    fn test_deep_nesting_is_capped() {
        let depth = MAX_TABLE_DEPTH + 8;
        let html = format!(
            "{}deep{}",
            "<table><tr><td>".repeat(depth),
            "</td></tr></table>".repeat(depth)
        );
        let tree = to_tree(html.as_str(), false).unwrap();

        let mut levels = 1;
        let mut node = &tree;
        while let Some(inner) = node
            .children
            .first()
            .and_then(|tr| tr.children.first())
            .and_then(|td| td.children.first())
        {
            levels += 1;
            node = inner;
        }
        assert_eq!(levels, MAX_TABLE_DEPTH);
        assert_eq!(node.children[0].children[0].text, "deep");
    }

    #[test]
    fn test_markdown_table() {
        let tree = to_tree(TableSource::Markdown("| a | b |\n|---|---|\n| 1 | 2 |"), false).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].children[1].tag, "th");
        assert_eq!(tree.children[0].children[1].text, "b");
        assert_eq!(tree.children[1].children[0].tag, "td");
        assert_eq!(tree.node_count(), 7);
    }

    #[test]
    fn test_rows_source() {
        let rows = vec![json!(["a", 1]), json!({"x": "b", "y": null})];
        let tree = to_tree(&rows, false).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].children[1].text, "1");
        assert_eq!(tree.children[1].children[1].text, "");
        assert!(to_tree(&Vec::<Value>::new(), false).is_none());
    }

    #[test]
    fn test_structure_only_drops_text() {
        let tree = to_tree("<table><tr><td>A</td></tr></table>", true).unwrap();
        assert!(tree.children[0].children[0].text.is_empty());
    }

    #[test]
    fn test_mixed_sources_wrapped() {
        let text = "| a | b |\n|---|---|\n| 1 | 2 |\n\n<table><tr><td>x</td></tr></table>";
        let tree = to_tree(text, false).unwrap();
        assert_eq!(tree.tag, TABLES_TAG);
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].children.len(), 2);
        assert_eq!(tree.children[1].children[0].children[0].text, "x");
    }

    #[test]
    fn test_rows_without_separator() {
        let tree = to_tree("| a | b |\n| 1 | 2 |", false).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].children[0].tag, "td");
    }
}
