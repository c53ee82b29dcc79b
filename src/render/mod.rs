//! Rendering of typed blocks back to markdown, tables to markdown/HTML, and
//! results to JSON.

mod json;
mod markdown;
mod options;

pub use json::{to_json, JsonFormat};
pub use markdown::{table_to_html, table_to_markdown, to_markdown, MarkdownRenderer};
pub use options::{RenderOptions, TableFallback};
