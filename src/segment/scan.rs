//! Offset-based scanners shared by the markdown segmenter and the table
//! tree builder.
//!
//! Every scanner reports byte ranges into the scanned text and skips
//! regions already claimed by an earlier, higher-priority scanner.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::validate::{is_separator_line, is_valid_table_row};

static TABLE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<table\b[^>]*>|</table\s*>").expect("static regex"));

/// Byte ranges already taken by a scanner.
///
/// Inline claims (code spans, inline math) never cross a line break and may
/// be swallowed by a table that contains them; block claims may not.
#[derive(Debug, Clone, Default)]
pub(crate) struct Claims {
    ranges: Vec<(Range<usize>, bool)>,
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end.max(b.start + 1) && b.start < a.end
}

fn contains(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

impl Claims {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Mark a block range as taken.
    pub(crate) fn claim(&mut self, range: Range<usize>) {
        self.ranges.push((range, false));
    }

    /// Mark an inline range as taken.
    pub(crate) fn claim_inline(&mut self, range: Range<usize>) {
        self.ranges.push((range, true));
    }

    /// Check that `range` overlaps no claimed range.
    pub(crate) fn is_free(&self, range: &Range<usize>) -> bool {
        !self.ranges.iter().any(|(r, _)| overlaps(r, range))
    }

    /// Check that `line` overlaps no block claim and every inline claim it
    /// touches lies within it.
    pub(crate) fn admits_row(&self, line: &Range<usize>) -> bool {
        !self
            .ranges
            .iter()
            .any(|(r, inline)| overlaps(r, line) && !(*inline && contains(line, r)))
    }

    /// Drop inline claims lying inside `range`.
    pub(crate) fn release_inline(&mut self, range: &Range<usize>) {
        self.ranges.retain(|(r, inline)| !(*inline && contains(range, r)));
    }
}

/// A line of text with the byte offset of its first character.
///
/// `text` excludes the line terminator (`\n` or `\r\n`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub start: usize,
    pub text: &'a str,
}

impl Line<'_> {
    pub(crate) fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub(crate) fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Split text into lines, keeping offsets.
pub(crate) fn lines(text: &str) -> Vec<Line<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    for raw in text.split_inclusive('\n') {
        let body = raw.strip_suffix('\n').unwrap_or(raw);
        let body = body.strip_suffix('\r').unwrap_or(body);
        out.push(Line { start, text: body });
        start += raw.len();
    }
    out
}

/// A fenced code block found by [`fenced_code_blocks`].
#[derive(Debug, Clone)]
pub(crate) struct FencedBlock {
    /// Range of the whole block, fences included
    pub span: Range<usize>,
    /// Code between the fences
    pub code: String,
}

/// Find fenced code blocks (```` ``` ```` or `~~~`, at least three).
///
/// A closing fence must use the same character and be at least as long as
/// the opener. An unclosed fence runs to the end of the text.
pub(crate) fn fenced_code_blocks(text: &str) -> Vec<FencedBlock> {
    let lines = lines(text);
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some((fence_char, fence_len)) = fence_open(lines[i].text) else {
            i += 1;
            continue;
        };

        let close = (i + 1..lines.len()).find(|&j| is_fence_close(lines[j].text, fence_char, fence_len));
        let body_end = close.unwrap_or(lines.len());
        let code = lines[i + 1..body_end]
            .iter()
            .map(|l| l.text)
            .collect::<Vec<_>>()
            .join("\n");
        let end = match close {
            Some(j) => lines[j].end(),
            None => text.len(),
        };

        blocks.push(FencedBlock {
            span: lines[i].start..end,
            code,
        });
        i = close.map_or(lines.len(), |j| j + 1);
    }

    blocks
}

fn fence_prefix(line: &str) -> Option<(char, usize, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let fence_char = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.len() - rest.trim_start_matches(fence_char).len();
    (len >= 3).then(|| (fence_char, len, &rest[len..]))
}

fn fence_open(line: &str) -> Option<(char, usize)> {
    let (fence_char, len, info) = fence_prefix(line)?;
    if fence_char == '`' && info.contains('`') {
        return None;
    }
    Some((fence_char, len))
}

fn is_fence_close(line: &str, fence_char: char, min_len: usize) -> bool {
    matches!(
        fence_prefix(line),
        Some((c, len, rest)) if c == fence_char && len >= min_len && rest.trim().is_empty()
    )
}

/// Find outermost HTML tables using a balanced `<table>` / `</table>` scan.
///
/// Nested tables stay inside their parent's range. A table left open runs
/// to nowhere and is dropped; stray closing tags are ignored.
pub(crate) fn html_table_spans(text: &str, claims: &Claims) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for tag in TABLE_TAG_RE.find_iter(text) {
        if !claims.is_free(&tag.range()) {
            continue;
        }
        if tag.as_str().starts_with("</") {
            if depth == 0 {
                continue;
            }
            depth -= 1;
            if depth == 0 {
                spans.push(start..tag.end());
            }
        } else {
            if depth == 0 {
                start = tag.start();
            }
            depth += 1;
        }
    }

    spans
}

/// Find markdown pipe tables.
///
/// A table starts at a line passing [`is_valid_table_row`] directly followed
/// by a separator line, and continues while lines are non-blank and contain
/// a pipe. Inline claims inside a row do not interrupt the table.
pub(crate) fn pipe_table_spans(text: &str, claims: &Claims) -> Vec<Range<usize>> {
    let lines = lines(text);
    let mut spans = Vec::new();
    let mut i = 0;

    while i + 1 < lines.len() {
        let header = lines[i];
        let separator = lines[i + 1];
        let starts_table = claims.admits_row(&header.range())
            && claims.admits_row(&separator.range())
            && is_valid_table_row(header.text)
            && is_separator_line(separator.text);
        if !starts_table {
            i += 1;
            continue;
        }

        let mut end = separator.end();
        let mut j = i + 2;
        while let Some(line) = lines.get(j) {
            if line.text.trim().is_empty() || !line.text.contains('|') || !claims.admits_row(&line.range()) {
                break;
            }
            end = line.end();
            j += 1;
        }

        spans.push(header.start..end);
        i = j;
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_offsets() {
        let text = "ab\r\ncd\n\nef";
        let lines = lines(text);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].start, 4);
        assert_eq!(lines[1].text, "cd");
        assert_eq!(&text[lines[3].range()], "ef");
    }

    #[test]
    fn test_fenced_code() {
        let text = "intro\n```rust\nfn main() {}\n```\nafter";
        let blocks = fenced_code_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].code, "fn main() {}");
        assert_eq!(&text[blocks[0].span.clone()], "```rust\nfn main() {}\n```");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let text = "~~~~\ncode\n~~~\nmore";
        let blocks = fenced_code_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].code, "code\n~~~\nmore");
        assert_eq!(blocks[0].span.end, text.len());
    }

    #[test]
    fn test_nested_html_tables() {
        let text = "x <table><tr><td><table><tr><td>1</td></tr></table></td></tr></table> y <TABLE></TABLE>";
        let spans = html_table_spans(text, &Claims::new());
        assert_eq!(spans.len(), 2);
        assert!(text[spans[0].clone()].ends_with("</td></tr></table>"));
        assert_eq!(&text[spans[1].clone()], "<TABLE></TABLE>");
    }

    #[test]
    fn test_pipe_table_span() {
        let text = "before\n| a | b |\n|---|---|\n| 1 | 2 |\n\nafter | x";
        let spans = pipe_table_spans(text, &Claims::new());
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].clone()], "| a | b |\n|---|---|\n| 1 | 2 |");
    }

    #[test]
    fn test_inline_claims_inside_rows() {
        let text = "| `key` | v |\n|---|---|\n| `ls` | $x$ |\n| end | 1 |";
        let mut claims = Claims::new();
        for pattern in ["`key`", "`ls`", "$x$"] {
            let start = text.find(pattern).unwrap();
            claims.claim_inline(start..start + pattern.len());
        }
        let spans = pipe_table_spans(text, &claims);
        assert_eq!(spans, vec![0..text.len()]);

        claims.release_inline(&spans[0]);
        assert!(claims.is_free(&(0..text.len())));
    }

    #[test]
    fn test_block_claim_ends_table() {
        let text = "| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |";
        let mut claims = Claims::new();
        let start = text.find("| 3").unwrap();
        claims.claim(start..text.len());
        let spans = pipe_table_spans(text, &claims);
        assert_eq!(&text[spans[0].clone()], "| a | b |\n|---|---|\n| 1 | 2 |");
    }

    #[test]
    fn test_claimed_region_skipped() {
        let text = "| a | b |\n|---|---|";
        let mut claims = Claims::new();
        claims.claim(0..text.len());
        assert!(pipe_table_spans(text, &claims).is_empty());
    }
}
