//! Validator predicates for markdown formula and table candidates.
//!
//! Raw markdown is ambiguous: `$` also marks prices and `|` also appears in
//! absolute values, shell pipelines and code. These predicates are tuned
//! pattern lists; changing them changes benchmark scores.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

const MATH_OPERATORS: &[char] = &[
    '+', '-', '*', '/', '=', '<', '>', '≤', '≥', '≠', '≈', '∫', '∑', '∏', '√', '∞', '∂', '∇',
];

static LATEX_COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[A-Za-z]+").expect("static regex"));
static GREEK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{0391}-\x{03A9}\x{03B1}-\x{03C9}]").expect("static regex"));
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(sin|cos|tan|cot|sec|csc|arcsin|arccos|arctan|sinh|cosh|tanh|log|ln|exp|lim|max|min|sup|inf|det|sqrt|frac|sum|int|prod|mod|gcd)\b",
    )
    .expect("static regex")
});
static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z][_^]|[A-Za-z]\d|\d[A-Za-z]|[_^]\{?[A-Za-z0-9]").expect("static regex")
});
static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(billion|billions|million|millions|trillion|thousand|hundred|dollar|dollars|usd|eur|euro|euros|cent|cents|pound|pounds|yuan|yen|per|day|days|week|weeks|month|months|year|years|hour|hours|price|prices|cost|costs|percent)\b",
    )
    .expect("static regex")
});

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?$").expect("static regex")
});
static ABS_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\|{1,2}[^|\s]+\|{1,2}$").expect("static regex"));
static NORM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\|[^|\s]+\|\|").expect("static regex"));
static ABS_OPERATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|[^|\s]{1,10}\|\s*[-+*/=<>^]|[-+*/=<>^]\s*\|[^|\s]{1,10}\|")
        .expect("static regex")
});
static LATEX_IN_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(begin|end)\{|\\[A-Za-z]{2,}").expect("static regex"));
static METHOD_CHAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\)\s*\.\s*[A-Za-z_]\w*").expect("static regex"));
static ABBREVIATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,3}$").expect("static regex"));
static CODE_CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][\w.]*\s*\([^()]*\)$|^[A-Za-z_]\w*(\.[A-Za-z_]\w*)+$")
        .expect("static regex")
});

/// Cell values that are metadata artifacts rather than table content.
static ARTIFACT_SET: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        // file size
        r"(?i)^\d+(\.\d+)?\s*(b|kb|mb|gb|tb|kib|mib|gib|bytes?)$",
        // url
        r"(?i)^(https?://|ftp://|www\.)\S+$",
        // timestamp
        r"(?i)^\d{1,2}:\d{2}(:\d{2})?(\s*[ap]\.?m\.?)?$",
        // date / datetime
        r"^\d{4}[-/.]\d{1,2}[-/.]\d{1,2}([T ]\d{1,2}:\d{2}(:\d{2})?)?$",
        r"^\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}$",
        // version
        r"(?i)^v\d+(\.\d+)*([-+][0-9a-z.]+)?$",
        r"^\d+\.\d+\.\d+([-+][0-9A-Za-z.]+)?$",
        // resolution
        r"(?i)^\d+\s*[×x]\s*\d+(\s*(pixels?|px))?$",
    ])
    .expect("static regex set")
});

/// Decide whether an inline `$...$` / `\(...\)` candidate is really math.
///
/// Rejects candidates shorter than 3 characters, ending in a dangling `-`,
/// with more than 30% long alphabetic words, or carrying currency/magnitude
/// vocabulary without any math signal. Accepts candidates with a math
/// signal (LaTeX command, Greek letter, operator, function name) or a
/// variable-like letter/digit mix.
pub fn is_valid_math_formula(candidate: &str) -> bool {
    let s = candidate.trim();
    if s.chars().count() < 3 {
        return false;
    }
    if s.ends_with('-') {
        return false;
    }

    let tokens: Vec<&str> = s.split_whitespace().collect();
    let long_words = tokens.iter().filter(|t| is_long_word(t)).count();
    if !tokens.is_empty() && long_words * 10 > tokens.len() * 3 {
        return false;
    }

    let math_signal = has_math_signal(s);
    if CURRENCY_RE.is_match(s) && !math_signal {
        return false;
    }

    math_signal || VARIABLE_RE.is_match(s)
}

fn has_math_signal(s: &str) -> bool {
    s.contains(MATH_OPERATORS)
        || LATEX_COMMAND_RE.is_match(s)
        || GREEK_RE.is_match(s)
        || FUNCTION_RE.is_match(s)
}

/// Alphabetic word longer than 6 characters (surrounding punctuation ignored).
fn is_long_word(token: &str) -> bool {
    let word = token.trim_matches(|c: char| c.is_ascii_punctuation());
    !word.is_empty() && word.chars().all(char::is_alphabetic) && word.chars().count() > 6
}

/// Decide whether a line can be a markdown table row.
///
/// A row needs two cells with real content, or one when it is fenced by
/// leading and trailing pipes. Absolute values and norms, LaTeX, method
/// chains, unfenced abbreviation strips (`BL|NM|PT|SA`), rows made of
/// metadata artifacts and rows made only of code-looking cells are rejected.
pub fn is_valid_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.contains('|') || is_separator_line(trimmed) {
        return false;
    }

    if ABS_VALUE_RE.is_match(trimmed)
        || NORM_RE.is_match(trimmed)
        || ABS_OPERATOR_RE.is_match(trimmed)
    {
        return false;
    }
    if LATEX_IN_ROW_RE.is_match(trimmed) || METHOD_CHAIN_RE.is_match(trimmed) {
        return false;
    }

    let fenced = trimmed.len() > 1 && trimmed.starts_with('|') && trimmed.ends_with('|');
    let cells = split_cells(trimmed);
    let non_empty: Vec<&str> = cells
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    let meaningful = non_empty
        .iter()
        .filter(|c| c.chars().any(char::is_alphanumeric))
        .count();

    if meaningful < 2 && !(fenced && meaningful >= 1) {
        return false;
    }

    if !fenced && cells.len() >= 3 && cells.iter().all(|c| ABBREVIATION_RE.is_match(c.trim())) {
        return false;
    }

    let artifacts = non_empty.iter().filter(|c| ARTIFACT_SET.is_match(c)).count();
    if artifacts * 2 >= non_empty.len() {
        return false;
    }

    !non_empty.iter().all(|c| CODE_CELL_RE.is_match(c))
}

/// Check for a header separator line such as `|---|:---:|`.
pub fn is_separator_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.contains('|') && trimmed.contains('-') && SEPARATOR_RE.is_match(trimmed)
}

/// Split a table row into cells, honoring `\|` escapes.
///
/// One leading and one trailing pipe are treated as fences, not as
/// empty edge cells.
pub fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = if inner.ends_with('|') && !inner.ends_with("\\|") {
        &inner[..inner.len() - 1]
    } else {
        inner
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_is_not_math() {
        assert!(!is_valid_math_formula("29.8 billion"));
        assert!(!is_valid_math_formula("5 million dollars"));
        assert!(!is_valid_math_formula("3 per day"));
    }

    #[test]
    fn test_real_math() {
        assert!(is_valid_math_formula("a^2+b^2=c^2"));
        assert!(is_valid_math_formula("E=mc^2"));
        assert!(is_valid_math_formula(r"\frac{a}{b}"));
        assert!(is_valid_math_formula(r"\sum_{i=1}^{n} x_i"));
        assert!(is_valid_math_formula("x_1"));
        assert!(is_valid_math_formula("α + β"));
    }

    #[test]
    fn test_math_signal_beats_currency() {
        assert!(is_valid_math_formula("cost = 3x"));
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(!is_valid_math_formula("ab"));
        assert!(!is_valid_math_formula("10-"));
        assert!(!is_valid_math_formula("important statement here"));
        assert!(!is_valid_math_formula("and then"));
    }

    #[test]
    fn test_table_rows() {
        assert!(is_valid_table_row("| A | B |"));
        assert!(is_valid_table_row("Name | Age"));
        assert!(is_valid_table_row("| a |"));
        assert!(!is_valid_table_row("BL|NM|PT|SA"));
        assert!(!is_valid_table_row("no pipes here"));
        assert!(!is_valid_table_row("|---|---|"));
    }

    #[test]
    fn test_math_pipes_rejected() {
        assert!(!is_valid_table_row("|x|"));
        assert!(!is_valid_table_row("the norm ||v|| is small | really"));
        assert!(!is_valid_table_row("|x| + |y| >= |x + y|"));
        assert!(!is_valid_table_row(r"| \alpha | \beta |"));
    }

    #[test]
    fn test_code_and_artifacts_rejected() {
        assert!(!is_valid_table_row("df.filter(x).select(y) | z"));
        assert!(!is_valid_table_row("| foo(a) | obj.method |"));
        assert!(!is_valid_table_row("| 12 MB | 2023-01-01 |"));
        assert!(!is_valid_table_row("| https://example.com | 10:30 |"));
        assert!(!is_valid_table_row("| v1.2.3 | 98 × 240 pixels |"));
    }

    #[test]
    fn test_separator() {
        assert!(is_separator_line("|---|---|"));
        assert!(is_separator_line("| :--- | ---: |"));
        assert!(is_separator_line("|---|"));
        assert!(is_separator_line("---|---"));
        assert!(!is_separator_line("---"));
        assert!(!is_separator_line("| a | b |"));
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("| a | b |"), vec![" a ", " b "]);
        assert_eq!(split_cells("a|b"), vec!["a", "b"]);
        assert_eq!(split_cells(r"| a \| b | c |"), vec![" a | b ", " c "]);
    }
}
