//! Integration tests for table tree similarity.

use docscore::teds::{to_tree, TableTree, MAX_TABLE_DEPTH};
use docscore::{calculate_all, s_teds, teds, TypedBlock};
use serde_json::json;

const TABLE: &str = "<table>\
    <thead><tr><th>Name</th><th>Age</th></tr></thead>\
    <tbody><tr><td>Alice</td><td>30</td></tr><tr><td>Bob</td><td>25</td></tr></tbody>\
    </table>";

const TABLE_WITHOUT_LAST_ROW: &str = "<table>\
    <tr><th>Name</th><th>Age</th></tr>\
    <tr><td>Alice</td><td>30</td></tr>\
    </table>";

#[test]
fn test_identical_tables() {
    let result = teds(TABLE, TABLE, false);
    assert!(result.success);
    assert_eq!(result.score, 1.0);
}

#[test]
fn test_missing_trailing_row() {
    let result = teds(TABLE_WITHOUT_LAST_ROW, TABLE, false);
    assert!(result.score > 0.0 && result.score < 1.0);
    // 10 nodes against 7: one row and its two cells are missing.
    assert_eq!(result.detail("edit_distance"), Some(&json!(3)));
    assert_eq!(result.detail("groundtruth_nodes"), Some(&json!(10)));
}

#[test]
fn test_span_sensitivity() {
    let result = teds(
        "<table><tr><th colspan='2'>H</th></tr></table>",
        "<table><tr><th>H</th><th>H2</th></tr></table>",
        false,
    );
    assert!(result.score < 1.0);
}

#[test]
fn test_attribute_order_is_irrelevant() {
    let a = r#"<table><tr><td rowspan="2" colspan="3">x</td></tr></table>"#;
    let b = r#"<table><tr><td colspan="3" rowspan="2">x</td></tr></table>"#;
    assert_eq!(teds(a, b, false).score, 1.0);
}

#[test]
fn test_structure_only_is_content_blind() {
    let a = "<table><tr><td>A</td></tr></table>";
    let b = "<table><tr><td>B</td></tr></table>";
    assert_eq!(s_teds(a, b).score, 1.0);
    assert!(teds(a, b, false).score < 1.0);
    assert_eq!(s_teds(a, b).name, "table_S-TEDS");
}

#[test]
fn test_markdown_matches_equivalent_html() {
    let markdown = "| Name | Age |\n|---|---|\n| Alice | 30 |\n| Bob | 25 |";
    assert_eq!(teds(markdown, TABLE, false).score, 1.0);
}

#[test]
fn test_rows_match_plain_html() {
    let rows = vec![json!(["a", "b"]), json!({"x": 1, "y": null})];
    let html = "<table><tr><td>a</td><td>b</td></tr><tr><td>1</td><td></td></tr></table>";
    assert_eq!(teds(&rows, html, false).score, 1.0);
}

#[test]
fn test_degenerate_inputs() {
    assert_eq!(teds("", "", false).score, 1.0);
    assert_eq!(teds("no table here", "", false).score, 1.0);

    let one_sided = teds("<div>not a table</div>", TABLE, false);
    assert!(one_sided.success);
    assert_eq!(one_sided.score, 0.0);
}

#[test]
fn test_unclosed_html_is_tolerated() {
    let result = teds("<table><tr><td>Alice<td>30", "<table><tr><td>Alice</td><td>30</td></tr></table>", false);
    assert!(result.success);
    assert_eq!(result.score, 1.0);
}

#[test]
fn test_several_tables_wrap_in_root() {
    let text = "<table><tr><td>1</td></tr></table>\n\n| a | b |\n|---|---|\n| 1 | 2 |";
    let tree = to_tree(text, false).unwrap();
    assert_eq!(tree.tag, "tables");
    assert_eq!(tree.children.len(), 2);
    assert!(tree.children.iter().all(|t| t.tag == "table"));
}

#[test]
fn test_tree_serializes() {
    let tree = TableTree::new("td").with_text("x").with_attr("colspan", "2");
    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(value["tag"], "td");
    assert_eq!(value["attrs"]["colspan"], "2");
}

#[test]
fn test_rows_block_scores_like_rows() {
    let rows = vec![json!(["a", "b"]), json!(["1", "2"])];
    let html = "<table><tr><td>a</td><td>b</td></tr><tr><td>1</td><td>2</td></tr></table>";
    assert_eq!(teds(&rows, html, false).score, 1.0);

    let predicted = TypedBlock::list_from_value(&json!([{"type": "table", "rows": rows}]));
    let groundtruth = TypedBlock::list_from_value(&json!([{"type": "table", "html": html}]));
    let results = calculate_all(None, Some(predicted.as_slice()), None, Some(groundtruth.as_slice()));
    assert_eq!(results["table_TEDS"].score, 1.0);
}

#[test]
fn test_markdown_table_with_inline_math_cells() {
    let doc = "| name | formula |\n|---|---|\n| area | $\\pi r^2$ |\n| energy | $E=mc^2$ |";
    let results = calculate_all(Some(doc), None, Some(doc), None);
    let teds = &results["table_TEDS"];
    assert_eq!(teds.score, 1.0);
    assert_eq!(teds.detail("groundtruth_nodes"), Some(&json!(10)));
}

#[test]
fn test_deeply_nested_tables() {
    let depth = MAX_TABLE_DEPTH * 4;
    let html = format!(
        "{}x{}",
        "<table><tr><td>".repeat(depth),
        "</td></tr></table>".repeat(depth)
    );
    let result = teds(html.as_str(), html.as_str(), false);
    assert!(result.success);
    assert_eq!(result.score, 1.0);
}
