//! Text cleanup applied to segmented fragments.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

static INLINE_WS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\x{A0}]+").expect("static regex"));

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Collapse runs of spaces/tabs and trim every line
    pub collapse_whitespace: bool,

    /// Maximum consecutive newlines (0 = unlimited)
    pub max_consecutive_newlines: u8,
}

impl CleanupOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that leave text untouched.
    pub fn none() -> Self {
        Self {
            normalize_unicode: false,
            remove_replacement_char: false,
            collapse_whitespace: false,
            max_consecutive_newlines: 0,
        }
    }

    /// Enable or disable NFC normalization.
    pub fn with_unicode_normalization(mut self, enabled: bool) -> Self {
        self.normalize_unicode = enabled;
        self
    }

    /// Enable or disable whitespace collapsing.
    pub fn with_whitespace_collapse(mut self, enabled: bool) -> Self {
        self.collapse_whitespace = enabled;
        self
    }

    /// Set the maximum number of consecutive newlines.
    pub fn with_max_newlines(mut self, max: u8) -> Self {
        self.max_consecutive_newlines = max;
        self
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            remove_replacement_char: true,
            collapse_whitespace: true,
            max_consecutive_newlines: 2,
        }
    }
}

/// Text cleanup pipeline.
#[derive(Debug, Clone, Default)]
pub struct CleanupPipeline {
    options: CleanupOptions,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    /// Character-level normalization only (safe for code and offsets).
    pub fn normalize(&self, text: &str) -> String {
        let mut result = if self.options.normalize_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        };

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        result
    }

    /// Full prose cleanup: normalization, whitespace collapse, newline limit.
    pub fn process(&self, text: &str) -> String {
        let mut result = self.normalize(text);

        if self.options.collapse_whitespace {
            result = collapse_whitespace(&result);
        }

        if self.options.max_consecutive_newlines > 0 {
            result = limit_newlines(&result, self.options.max_consecutive_newlines as usize);
        }

        result.trim().to_string()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| INLINE_WS_RE.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn limit_newlines(text: &str, max: usize) -> String {
    let mut result = String::with_capacity(text.len());
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            run += 1;
            if run > max {
                continue;
            }
        } else {
            run = 0;
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_normalization() {
        let pipeline = CleanupPipeline::default();
        // "e" + combining acute accent → "é"
        let result = pipeline.normalize("caf\u{0065}\u{0301}");
        assert_eq!(result, "café");
    }

    #[test]
    fn test_whitespace_collapse() {
        let pipeline = CleanupPipeline::default();
        let result = pipeline.process("  Hello \t  world  \n\n\n\n  next   line ");
        assert_eq!(result, "Hello world\n\nnext line");
    }

    #[test]
    fn test_remove_replacement_char() {
        let pipeline = CleanupPipeline::default();
        assert_eq!(pipeline.process("a\u{FFFD}b"), "ab");
    }

    #[test]
    fn test_disabled_cleanup_keeps_text() {
        let pipeline = CleanupPipeline::new(CleanupOptions::none());
        assert_eq!(pipeline.process("a   b\n\n\n\nc"), "a   b\n\n\n\nc");
    }

    #[test]
    fn test_limit_newlines() {
        assert_eq!(limit_newlines("a\n\n\n\nb", 2), "a\n\nb");
        assert_eq!(limit_newlines("a\nb", 2), "a\nb");
    }
}
