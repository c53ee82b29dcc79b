//! Field fallbacks per block kind.
//!
//! Producers disagree on where a block keeps its payload. When a block has
//! no plain string content, these keys are tried in order, first in the
//! structured content and then in the block's own attributes.

/// Code and code-span blocks.
pub const CODE: &[&str] = &["code_content", "content", "code", "code_body", "text"];

/// Formula blocks, display and inline.
pub const FORMULA: &[&str] = &["math_content", "latex", "content", "formula", "text"];

/// Tables given as HTML.
pub const TABLE_HTML: &[&str] = &["html", "table_body", "table_html"];

/// Tables given as markdown.
pub const TABLE_MARKDOWN: &[&str] = &["markdown", "content", "text"];

/// Tables given as JSON rows.
pub const TABLE_ROWS: &[&str] = &["rows", "data", "cells"];

/// Headings, paragraphs, list items and text spans.
pub const TEXT: &[&str] = &["title_content", "text", "content"];

/// Code block language.
pub const LANGUAGE: &[&str] = &["language", "lang", "code_language"];

/// Heading level.
pub const HEADING_LEVEL: &[&str] = &["level", "text_level", "heading_level"];

/// Image location.
pub const IMAGE_URL: &[&str] = &["url", "img_path", "src", "path"];

/// Image description.
pub const IMAGE_ALT: &[&str] = &["alt", "caption", "image_caption"];
