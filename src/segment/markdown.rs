//! Raw markdown segmentation.
//!
//! Scanners run in priority order and claim byte ranges, so a later scanner
//! never re-extracts content already taken (a `$` inside a code span is not
//! math, a `|` inside a formula is not a table). Once every scanner has run,
//! the claimed ranges are cut out of the text and the rest becomes prose.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::list::strip_math_delimiters;
use super::scan::{fenced_code_blocks, html_table_spans, lines, pipe_table_spans, Claims};
use super::validate::is_valid_math_formula;
use super::{Buckets, Category, CleanupPipeline};

static INLINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"``([^`]+?)``|`([^`\n]+)`").expect("static regex"));
static DISPLAY_DOLLAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").expect("static regex"));
static DISPLAY_BRACKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\\[(.+?)\\\]").expect("static regex"));
static INLINE_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\\((.+?)\\\)").expect("static regex"));
static BEGIN_ENV_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\\begin\{(equation|align|alignat|gather|multline|flalign|eqnarray|displaymath|math)(\*?)\}",
    )
    .expect("static regex")
});
static HEADING_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}#{1,6}(?:[ \t]+|$)").expect("static regex"));
static HEADING_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+#+[ \t]*$").expect("static regex"));

/// A claimed range and what replaces it in the prose.
struct Cut {
    range: Range<usize>,
    replacement: &'static str,
}

/// Block constructs leave a line break behind.
const BLOCK_GAP: &str = "\n";
/// Inline constructs leave a space behind.
const INLINE_GAP: &str = " ";

#[derive(Default)]
struct Scan {
    claims: Claims,
    cuts: Vec<Cut>,
    fragments: Vec<(Range<usize>, Category, String)>,
}

impl Scan {
    fn take(&mut self, range: Range<usize>, category: Category, fragment: String, gap: &'static str) {
        if gap == INLINE_GAP {
            self.claims.claim_inline(range.clone());
        } else {
            self.claims.claim(range.clone());
        }
        self.fragments.push((range.clone(), category, fragment));
        self.cuts.push(Cut {
            range,
            replacement: gap,
        });
    }

    fn cut(&mut self, range: Range<usize>, gap: &'static str) {
        self.claims.claim(range.clone());
        self.cuts.push(Cut {
            range,
            replacement: gap,
        });
    }

    fn is_free(&self, range: &Range<usize>) -> bool {
        self.claims.is_free(range)
    }

    /// Take a table, swallowing inline fragments found inside it.
    fn take_table(&mut self, range: Range<usize>, text: &str) {
        let inside = |r: &Range<usize>| range.start <= r.start && r.end <= range.end;
        self.fragments.retain(|(r, _, _)| !inside(r));
        self.cuts.retain(|c| !inside(&c.range));
        self.claims.release_inline(&range);
        self.take(range.clone(), Category::Table, text[range].to_string(), BLOCK_GAP);
    }
}

/// Segment `raw` markdown into the buckets.
pub(crate) fn collect(raw: &str, cleanup: &CleanupPipeline, buckets: &mut Buckets<'_>) {
    let text = cleanup.normalize(raw);
    let mut scan = Scan::default();

    scan_fenced_code(&text, &mut scan);
    scan_inline_code(&text, &mut scan);
    scan_display_math(&text, &mut scan);
    scan_inline_math(&text, &mut scan);
    scan_tables(&text, &mut scan);
    scan_headings(&text, &mut scan);

    log::debug!(
        "markdown scan: {} fragments, {} cuts",
        scan.fragments.len(),
        scan.cuts.len()
    );

    let Scan {
        mut cuts,
        mut fragments,
        ..
    } = scan;

    fragments.sort_by_key(|(range, _, _)| range.start);
    for (_, category, fragment) in &fragments {
        buckets.push(*category, fragment);
    }

    let prose = remove_cuts(&text, &mut cuts);
    buckets.push(Category::Text, &prose);
}

fn scan_fenced_code(text: &str, scan: &mut Scan) {
    for block in fenced_code_blocks(text) {
        scan.take(block.span, Category::Code, block.code, BLOCK_GAP);
    }
}

fn scan_inline_code(text: &str, scan: &mut Scan) {
    for caps in INLINE_CODE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if !scan.is_free(&whole.range()) {
            continue;
        }
        let code = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        scan.take(whole.range(), Category::Code, code.trim().to_string(), INLINE_GAP);
    }
}

fn scan_display_math(text: &str, scan: &mut Scan) {
    for re in [&*DISPLAY_DOLLAR_RE, &*DISPLAY_BRACKET_RE] {
        for caps in re.captures_iter(text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if scan.is_free(&whole.range()) && !inner.as_str().trim().is_empty() {
                scan.take(whole.range(), Category::Formula, inner.as_str().trim().to_string(), BLOCK_GAP);
            }
        }
    }

    // Named environments are kept whole, \begin and \end included.
    for caps in BEGIN_ENV_RE.captures_iter(text) {
        let Some(begin) = caps.get(0) else { continue };
        if !scan.is_free(&begin.range()) {
            continue;
        }
        let name = &caps[1];
        let star = &caps[2];
        let end_tag = format!("\\end{{{name}{star}}}");
        let Some(offset) = text[begin.end()..].find(&end_tag) else {
            continue;
        };
        let range = begin.start()..begin.end() + offset + end_tag.len();
        if scan.is_free(&range) {
            scan.take(range.clone(), Category::Formula, text[range].to_string(), BLOCK_GAP);
        }
    }
}

fn scan_inline_math(text: &str, scan: &mut Scan) {
    for (range, latex) in inline_dollar_math(text, &scan.claims) {
        scan.take(range, Category::Formula, latex, INLINE_GAP);
    }

    for caps in INLINE_PAREN_RE.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if scan.is_free(&whole.range()) && is_valid_math_formula(inner.as_str()) {
            let latex = strip_math_delimiters(inner.as_str()).to_string();
            scan.take(whole.range(), Category::Formula, latex, INLINE_GAP);
        }
    }
}

/// Find `$...$` spans.
///
/// The opener must be followed by non-whitespace; the first unescaped `$`
/// on the same line closes it, and must be preceded by non-whitespace and
/// not followed by a digit. When the pair fails, the closer is retried as
/// an opener.
fn inline_dollar_math(text: &str, claims: &Claims) -> Vec<(Range<usize>, String)> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' || is_escaped(bytes, i) || !claims.is_free(&(i..i + 1)) {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'$') {
            i += 2;
            continue;
        }

        let open = i;
        let close = (open + 1..bytes.len())
            .take_while(|&j| bytes[j] != b'\n')
            .find(|&j| bytes[j] == b'$' && !is_escaped(bytes, j));
        let Some(close) = close else {
            i = open + 1;
            continue;
        };

        let inner = &text[open + 1..close];
        let well_delimited = inner.chars().next().is_some_and(|c| !c.is_whitespace())
            && inner.chars().last().is_some_and(|c| !c.is_whitespace())
            && !bytes.get(close + 1).is_some_and(u8::is_ascii_digit);

        if well_delimited && claims.is_free(&(open..close + 1)) && is_valid_math_formula(inner) {
            found.push((open..close + 1, inner.to_string()));
            i = close + 1;
        } else {
            i = close;
        }
    }

    found
}

fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let backslashes = bytes[..pos].iter().rev().take_while(|b| **b == b'\\').count();
    backslashes % 2 == 1
}

fn scan_tables(text: &str, scan: &mut Scan) {
    for range in html_table_spans(text, &scan.claims) {
        scan.take_table(range, text);
    }
    for range in pipe_table_spans(text, &scan.claims) {
        scan.take_table(range, text);
    }
}

/// Drop ATX heading markers; the heading text stays prose.
fn scan_headings(text: &str, scan: &mut Scan) {
    for line in lines(text) {
        if !scan.is_free(&line.range()) {
            continue;
        }
        let Some(marker) = HEADING_MARKER_RE.find(line.text) else {
            continue;
        };
        scan.cut(line.start..line.start + marker.end(), "");
        if let Some(closing) = HEADING_CLOSE_RE.find(&line.text[marker.end()..]) {
            let base = line.start + marker.end();
            scan.cut(base + closing.start()..base + closing.end(), "");
        }
    }
}

/// Cut claimed ranges out of `text`, longest first.
///
/// A range overlapping an already accepted longer one is skipped.
fn remove_cuts(text: &str, cuts: &mut [Cut]) -> String {
    cuts.sort_by(|a, b| b.range.len().cmp(&a.range.len()));

    let mut accepted: Vec<&Cut> = Vec::with_capacity(cuts.len());
    for cut in cuts.iter() {
        let overlaps = accepted
            .iter()
            .any(|a| a.range.start < cut.range.end && cut.range.start < a.range.end);
        if !overlaps {
            accepted.push(cut);
        }
    }
    accepted.sort_by_key(|c| c.range.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for cut in accepted {
        out.push_str(&text[cursor..cut.range.start]);
        out.push_str(cut.replacement);
        cursor = cut.range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentationResult;

    fn run(text: &str) -> SegmentationResult {
        let cleanup = CleanupPipeline::default();
        let mut buckets = Buckets::new(&cleanup);
        collect(text, &cleanup, &mut buckets);
        buckets.finish().0
    }

    #[test]
    fn test_reference_document() {
        let result = run("# T\n\nSee $E=mc^2$\n\n| a | b |\n|---|---|\n| 1 | 2 |");
        assert_eq!(result.formula, "E=mc^2");
        assert_eq!(result.table, "| a | b |\n|---|---|\n| 1 | 2 |");
        assert_eq!(result.text, "T\n\nSee");
        assert!(result.code.is_empty());
    }

    #[test]
    fn test_code_wins_over_math() {
        let result = run("Run `echo $HOME $PATH` now\n\n```\nx = $a+b$\n```");
        assert_eq!(result.code, "echo $HOME $PATH\n\nx = $a+b$");
        assert!(result.formula.is_empty());
        assert_eq!(result.text, "Run now");
    }

    #[test]
    fn test_prices_stay_text() {
        let result = run("Revenue was $29.8 billion and costs $5 per unit.");
        assert!(result.formula.is_empty());
        assert!(result.text.contains("$29.8 billion"));
    }

    #[test]
    fn test_display_math_forms() {
        let text = "A\n$$\nx^2\n$$\nB \\[ y + 1 \\] C\n\\begin{align*}\na &= b\n\\end{align*}\nD";
        let result = run(text);
        assert_eq!(result.formula, "x^2\n\ny + 1\n\n\\begin{align*}\na &= b\n\\end{align*}");
        assert_eq!(result.text, "A\n\nB\nC\n\nD");
    }

    #[test]
    fn test_inline_paren_math() {
        let result = run("where \\(\\alpha + 1\\) holds");
        assert_eq!(result.formula, "\\alpha + 1");
        assert_eq!(result.text, "where holds");
    }

    #[test]
    fn test_dollar_rules() {
        let spans = inline_dollar_math("cost $ 5 and $x_1$ and $a+b$5", &Claims::new());
        let found: Vec<_> = spans.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(found, ["x_1"]);

        let spans = inline_dollar_math(r"escaped \$x_1$ then $y_2$", &Claims::new());
        let found: Vec<_> = spans.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(found, ["y_2"]);
    }

    #[test]
    fn test_html_table_with_math_inside_is_one_table() {
        let result = run("Before\n<table><tr><td>|x|</td></tr></table>\nAfter");
        assert_eq!(result.table, "<table><tr><td>|x|</td></tr></table>");
        assert_eq!(result.text, "Before\n\nAfter");
    }

    #[test]
    fn test_inline_code_and_math_stay_in_table() {
        let text = "Intro\n\n| `key` | formula |\n|---|---|\n| `ls` | $\\pi r^2$ |\n| `rm` | $E=mc^2$ |\n\nOutro `cd`";
        let result = run(text);
        assert_eq!(
            result.table,
            "| `key` | formula |\n|---|---|\n| `ls` | $\\pi r^2$ |\n| `rm` | $E=mc^2$ |"
        );
        assert_eq!(result.code, "cd");
        assert!(result.formula.is_empty());
        assert_eq!(result.text, "Intro\n\nOutro");
    }

    #[test]
    fn test_heading_markers_removed() {
        let result = run("## Section ##\nBody text");
        assert_eq!(result.text, "Section\nBody text");
    }

    #[test]
    fn test_abs_value_lines_are_not_tables() {
        let result = run("|x| + |y|\n|---|---|\n");
        assert!(result.table.is_empty());
    }

    #[test]
    fn test_remove_cuts_longest_first() {
        let mut cuts = vec![
            Cut {
                range: 2..4,
                replacement: " ",
            },
            Cut {
                range: 1..6,
                replacement: "\n",
            },
        ];
        assert_eq!(remove_cuts("abcdefg", &mut cuts), "a\ng");
    }
}
