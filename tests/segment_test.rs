//! Integration tests for content segmentation.

use docscore::{
    segment, segment_markdown, segment_with_report, CleanupOptions, SegmentOptions, SegmentSource,
    Segmenter, TypedBlock,
};
use serde_json::json;

#[test]
fn test_empty_inputs() {
    let report = segment_with_report(None, None);
    assert!(report.result.is_empty());
    assert_eq!(report.source, SegmentSource::Empty);

    let result = segment(Some("   \n"), Some(&[][..]));
    assert_eq!(result.code, "");
    assert_eq!(result.text, "");
}

#[test]
fn test_price_is_not_math() {
    let text = "Revenue was $29.8 billion while $a^2+b^2=c^2$ holds.";
    let result = segment_markdown(text);
    assert_eq!(result.formula, "a^2+b^2=c^2");
    assert!(result.text.contains("$29.8 billion"));
    assert!(!result.text.contains("c^2"));
}

#[test]
fn test_no_double_counting() {
    let text = "# Setup\n\nRun `make` first.\n\n```\nlet x = 1;\n```\n\n$$\n\\sum_i x_i\n$$\n\n| k | v |\n|---|---|\n| a | 1 |\n\nDone.";
    let result = segment_markdown(text);

    assert_eq!(result.code, "make\n\nlet x = 1;");
    assert_eq!(result.formula, "\\sum_i x_i");
    assert!(result.table.starts_with("| k | v |"));
    for fragment in [&result.code, &result.formula, &result.table] {
        for piece in fragment.split("\n\n") {
            assert!(!result.text.contains(piece), "{piece:?} leaked into text");
        }
    }
    assert!(result.text.contains("Setup"));
    assert!(result.text.contains("Done."));
}

#[test]
fn test_abbreviation_strip_is_text() {
    let result = segment_markdown("BL|NM|PT|SA\n---|---|---|---\n");
    assert_eq!(result.table, "");
}

#[test]
fn test_html_table_with_nesting() {
    let text = "Intro\n<table><tr><td><table><tr><td>x</td></tr></table></td></tr></table>\nOutro";
    let result = segment_markdown(text);
    assert!(result.table.starts_with("<table>"));
    assert!(result.table.ends_with("</table>"));
    assert_eq!(result.table.matches("<table>").count(), 2);
    assert!(!result.text.contains("table"));
}

#[test]
fn test_blocks_are_authoritative() {
    let blocks = TypedBlock::list_from_value(&json!([
        {"type": "text", "content": "from blocks"},
        {"type": "code", "content": "x()"},
    ]));
    let report = segment_with_report(Some("from markdown"), Some(blocks.as_slice()));
    assert_eq!(report.source, SegmentSource::Blocks);
    assert_eq!(report.result.text, "from blocks");
    assert_eq!(report.result.code, "x()");
    assert_eq!(report.stats.code_fragments, 1);
}

#[test]
fn test_unusable_blocks_fall_back_to_markdown() {
    let blocks = TypedBlock::list_from_value(&json!([
        {"type": "image", "img_path": "a.png"},
        {"type": "mystery", "content": "ignored"},
        42,
    ]));
    let report = segment_with_report(Some("from markdown"), Some(blocks.as_slice()));
    assert_eq!(report.source, SegmentSource::Markdown);
    assert_eq!(report.result.text, "from markdown");
}

#[test]
fn test_prefer_markdown_option() {
    let blocks = vec![TypedBlock::paragraph("from blocks")];
    let segmenter = Segmenter::new(SegmentOptions::default().with_prefer_blocks(false));
    let result = segmenter.segment(Some("from markdown"), Some(blocks.as_slice()));
    assert_eq!(result.text, "from markdown");
}

#[test]
fn test_inline_code_in_table_cells() {
    let doc = "Intro\n\n| cmd | desc |\n|---|---|\n| `ls` | list files |\n| `rm` | remove |\n\nOutro";
    let result = segment_markdown(doc);
    assert_eq!(
        result.table,
        "| cmd | desc |\n|---|---|\n| `ls` | list files |\n| `rm` | remove |"
    );
    assert_eq!(result.text, "Intro\n\nOutro");
    assert!(result.code.is_empty());
}

#[test]
fn test_inline_math_in_table_cells() {
    let doc = "| name | formula |\n|---|---|\n| area | $\\pi r^2$ |\n| energy | $E=mc^2$ |";
    let result = segment_markdown(doc);
    assert_eq!(result.table, doc);
    assert!(result.formula.is_empty());
    assert!(result.text.is_empty());
}

#[test]
fn test_inline_code_in_table_header() {
    let doc = "| `key` | value |\n|---|---|\n| a | 1 |";
    assert_eq!(segment_markdown(doc).table, doc);
}

#[test]
fn test_fenced_code_after_table() {
    let doc = "| a | b |\n|---|---|\n| 1 | 2 |\n```\n| x | y |\n```";
    let result = segment_markdown(doc);
    assert_eq!(result.table, "| a | b |\n|---|---|\n| 1 | 2 |");
    assert_eq!(result.code, "| x | y |");
}

#[test]
fn test_cleanup_options() {
    let doc = "a   b\n\n\n\nc";
    assert_eq!(segment_markdown(doc).text, "a b\n\nc");

    let cleanup = CleanupOptions::new()
        .with_unicode_normalization(false)
        .with_whitespace_collapse(false)
        .with_max_newlines(0);
    let segmenter = Segmenter::new(SegmentOptions::default().with_cleanup(cleanup));
    assert_eq!(segmenter.segment(Some(doc), None).text, "a   b\n\n\n\nc");
}
