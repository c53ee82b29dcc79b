//! Rendering options.

/// Options for reconstructing markdown from typed blocks.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// How to render tables
    pub table_fallback: TableFallback,

    /// Deepest heading emitted; deeper levels are clamped (1-6)
    pub max_heading_level: u8,

    /// Bullet for unordered list items
    pub list_marker: char,

    /// Emit image/audio/video blocks as markdown links
    pub include_media: bool,

    /// Escape special Markdown characters in prose
    pub escape_special_chars: bool,
}

impl RenderOptions {
    /// Defaults: pipe tables, no media, no escaping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table output format.
    pub fn with_table_fallback(mut self, fallback: TableFallback) -> Self {
        self.table_fallback = fallback;
        self
    }

    /// Heading depth limit, clamped to 1-6.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Bullet character.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Emit media blocks.
    pub fn with_media(mut self, include: bool) -> Self {
        self.include_media = include;
        self
    }

    /// Enable or disable escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            table_fallback: TableFallback::Markdown,
            max_heading_level: 6,
            list_marker: '-',
            include_media: false,
            escape_special_chars: false,
        }
    }
}

/// How to render tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFallback {
    /// Pipe tables; HTML source is kept as-is
    #[default]
    Markdown,
    /// HTML table tags, always
    Html,
}
