//! Typed content blocks.
//!
//! Producers disagree on tag names and field layout, so blocks are parsed
//! leniently from JSON: unknown kinds are kept as [`BlockKind::Unknown`],
//! unusable nodes are dropped, and nothing here ever fails a whole document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Logical kind of a content block or inline span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Section heading / title
    Heading,
    /// Paragraph of prose
    Paragraph,
    /// Code block
    Code,
    /// Inline code span
    CodeSpan,
    /// Inline formula
    FormulaInline,
    /// Display (block) formula
    FormulaBlock,
    /// Table
    Table,
    /// List
    List,
    /// Image
    Image,
    /// Audio clip
    Audio,
    /// Video clip
    Video,
    /// Plain text span
    TextSpan,
    /// Any tag outside the alias table
    Unknown(String),
}

/// Alias table: normalized tag → kind.
///
/// Tags are lowercased and `_` is folded to `-` before lookup.
fn alias(tag: &str) -> Option<BlockKind> {
    let kind = match tag {
        "heading" | "title" | "header" | "section-header" => BlockKind::Heading,
        "paragraph" | "text" | "md" | "plain-text" => BlockKind::Paragraph,
        "code" | "code-block" | "codeblock" => BlockKind::Code,
        "code-span" | "code-inline" | "inline-code" => BlockKind::CodeSpan,
        "formula" | "formula-block" | "equation" | "equation-interline" | "interline-equation"
        | "display-math" | "math" | "latex" => BlockKind::FormulaBlock,
        "formula-inline" | "equation-inline" | "inline-equation" | "inline-math" => {
            BlockKind::FormulaInline
        }
        "table" | "simple-table" | "complex-table" | "html-table" => BlockKind::Table,
        "list" | "list-item" | "ordered-list" | "unordered-list" => BlockKind::List,
        "image" | "img" | "figure" => BlockKind::Image,
        "audio" => BlockKind::Audio,
        "video" => BlockKind::Video,
        "text-span" | "span" => BlockKind::TextSpan,
        _ => return None,
    };
    Some(kind)
}

impl BlockKind {
    /// Resolve a producer tag through the alias table.
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase().replace('_', "-");
        alias(&normalized).unwrap_or(BlockKind::Unknown(normalized))
    }

    /// Canonical tag for this kind.
    pub fn as_tag(&self) -> &str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Code => "code",
            BlockKind::CodeSpan => "code-span",
            BlockKind::FormulaInline => "formula-inline",
            BlockKind::FormulaBlock => "formula-block",
            BlockKind::Table => "table",
            BlockKind::List => "list",
            BlockKind::Image => "image",
            BlockKind::Audio => "audio",
            BlockKind::Video => "video",
            BlockKind::TextSpan => "text-span",
            BlockKind::Unknown(tag) => tag,
        }
    }

    /// Code block or inline code.
    pub fn is_code(&self) -> bool {
        matches!(self, BlockKind::Code | BlockKind::CodeSpan)
    }

    /// Display or inline formula.
    pub fn is_formula(&self) -> bool {
        matches!(self, BlockKind::FormulaBlock | BlockKind::FormulaInline)
    }

    /// Prose-carrying kinds whose spans are flattened into text.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            BlockKind::Heading | BlockKind::Paragraph | BlockKind::List | BlockKind::TextSpan
        )
    }

    /// Non-textual media.
    pub fn is_media(&self) -> bool {
        matches!(self, BlockKind::Image | BlockKind::Audio | BlockKind::Video)
    }
}

impl Serialize for BlockKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for BlockKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(BlockKind::from_tag(&tag))
    }
}

/// An inline span inside a paragraph, heading or list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineSpan {
    /// Span kind (text, code, formula, ...)
    pub kind: BlockKind,
    /// Span text
    pub text: String,
}

impl InlineSpan {
    /// Create a span of the given kind.
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Create a plain text span.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(BlockKind::TextSpan, text)
    }

    /// Create an inline code span.
    pub fn code(text: impl Into<String>) -> Self {
        Self::new(BlockKind::CodeSpan, text)
    }

    /// Create an inline formula span.
    pub fn formula(text: impl Into<String>) -> Self {
        Self::new(BlockKind::FormulaInline, text)
    }

    /// Parse a span object (`{kind|type|t, text|content|c}`) or a bare string.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::text(s.clone())),
            Value::Object(map) => {
                let kind = first_str(map, &["kind", "type", "t"])
                    .map(BlockKind::from_tag)
                    .unwrap_or(BlockKind::TextSpan);
                let text = first_str(map, &["text", "content", "c"])?;
                Some(Self::new(kind, text))
            }
            _ => None,
        }
    }
}

/// Payload of a block.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BlockContent {
    /// Nothing usable
    #[default]
    Empty,
    /// A plain string
    Text(String),
    /// Ordered inline spans
    Spans(Vec<InlineSpan>),
    /// A structured object (e.g. `{code_content, language}` or `{html}`)
    Fields(Map<String, Value>),
}

impl BlockContent {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => BlockContent::Text(s.clone()),
            Some(Value::Number(n)) => BlockContent::Text(n.to_string()),
            Some(Value::Array(items)) => {
                let mut spans = Vec::new();
                collect_spans(items, &mut spans);
                BlockContent::Spans(spans)
            }
            Some(Value::Object(map)) => BlockContent::Fields(map.clone()),
            _ => BlockContent::Empty,
        }
    }

    /// Plain string content, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BlockContent::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Inline spans, if any.
    pub fn spans(&self) -> &[InlineSpan] {
        match self {
            BlockContent::Spans(spans) => spans,
            _ => &[],
        }
    }

    /// Structured fields, if any.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            BlockContent::Fields(map) => Some(map),
            _ => None,
        }
    }
}

impl Serialize for BlockContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            BlockContent::Empty => serializer.serialize_none(),
            BlockContent::Text(s) => serializer.serialize_str(s),
            BlockContent::Spans(spans) => spans.serialize(serializer),
            BlockContent::Fields(map) => map.serialize(serializer),
        }
    }
}

/// A node in the structured content representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedBlock {
    /// Block kind
    pub kind: BlockKind,

    /// Block payload
    pub content: BlockContent,

    /// Remaining top-level fields of the source object
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,

    /// Nested blocks (list items, composite structures)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TypedBlock>,
}

/// Keys consumed by the parser itself; everything else lands in `attrs`.
const STRUCTURAL_KEYS: &[&str] = &["kind", "type", "content", "children", "items"];

impl TypedBlock {
    /// Create a block with the given kind and content.
    pub fn new(kind: BlockKind, content: BlockContent) -> Self {
        Self {
            kind,
            content,
            attrs: Map::new(),
            children: Vec::new(),
        }
    }

    /// Create a heading block.
    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading, BlockContent::Text(text.into()))
    }

    /// Create a paragraph from plain text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, BlockContent::Text(text.into()))
    }

    /// Create a paragraph from inline spans.
    pub fn paragraph_spans(spans: Vec<InlineSpan>) -> Self {
        Self::new(BlockKind::Paragraph, BlockContent::Spans(spans))
    }

    /// Create a code block.
    pub fn code(code: impl Into<String>) -> Self {
        Self::new(BlockKind::Code, BlockContent::Text(code.into()))
    }

    /// Create a display formula block.
    pub fn formula(latex: impl Into<String>) -> Self {
        Self::new(BlockKind::FormulaBlock, BlockContent::Text(latex.into()))
    }

    /// Create a table block from an HTML fragment.
    pub fn table_html(html: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("html".into(), Value::String(html.into()));
        Self::new(BlockKind::Table, BlockContent::Fields(fields))
    }

    /// Create a list block whose items are the given blocks.
    pub fn list(items: Vec<TypedBlock>) -> Self {
        Self::new(BlockKind::List, BlockContent::Empty).with_children(items)
    }

    /// Create an image block.
    pub fn image(url: impl Into<String>) -> Self {
        let mut block = Self::new(BlockKind::Image, BlockContent::Empty);
        block.attrs.insert("url".into(), Value::String(url.into()));
        block
    }

    /// Attach child blocks.
    pub fn with_children(mut self, children: Vec<TypedBlock>) -> Self {
        self.children = children;
        self
    }

    /// Set a top-level attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Parse a block from JSON.
    ///
    /// Returns `None` for values that cannot be a block at all (numbers,
    /// objects without a kind, ...). Arrays of spans become a synthetic
    /// paragraph so that nested list items survive.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let kind = BlockKind::from_tag(first_str(map, &["kind", "type"])?);
                let content = BlockContent::from_value(map.get("content"));

                let mut children = Vec::new();
                for key in ["children", "items"] {
                    if let Some(child) = map.get(key) {
                        collect_blocks(child, &mut children);
                    }
                }
                if let BlockContent::Fields(fields) = &content {
                    for key in ["children", "items"] {
                        if let Some(child) = fields.get(key) {
                            collect_blocks(child, &mut children);
                        }
                    }
                }

                let attrs = map
                    .iter()
                    .filter(|(k, _)| !STRUCTURAL_KEYS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();

                Some(Self {
                    kind,
                    content,
                    attrs,
                    children,
                })
            }
            Value::Array(items) => {
                let mut spans = Vec::new();
                collect_spans(items, &mut spans);
                if spans.is_empty() {
                    return None;
                }
                Some(Self::paragraph_spans(spans))
            }
            Value::String(s) => Some(Self::paragraph(s.clone())),
            _ => None,
        }
    }

    /// Parse a block list from JSON, skipping malformed entries.
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        let mut blocks = Vec::new();
        collect_blocks(value, &mut blocks);
        blocks
    }

    /// Look up the first non-empty string among `keys`, searching the
    /// structured content first and then the block's own attributes.
    pub fn field(&self, keys: &[&str]) -> Option<&str> {
        self.content
            .fields()
            .and_then(|fields| first_str(fields, keys))
            .or_else(|| first_str(&self.attrs, keys))
    }

    /// Plain string content, else the first field among `keys`, else the
    /// concatenated span text.
    pub fn text_or_field(&self, keys: &[&str]) -> Option<String> {
        if let Some(text) = self.content.as_text().filter(|t| !t.trim().is_empty()) {
            return Some(text.to_string());
        }
        if let Some(text) = self.field(keys) {
            return Some(text.to_string());
        }
        let spans = self.content.spans();
        (!spans.is_empty()).then(|| spans.iter().map(|s| s.text.as_str()).collect())
    }

    /// Look up the first present value among `keys` (content first).
    pub fn field_value(&self, keys: &[&str]) -> Option<&Value> {
        fn lookup<'m>(map: &'m Map<String, Value>, keys: &[&str]) -> Option<&'m Value> {
            keys.iter()
                .filter_map(|k| map.get(*k))
                .find(|v| !v.is_null())
        }
        self.content
            .fields()
            .and_then(|map| lookup(map, keys))
            .or_else(|| lookup(&self.attrs, keys))
    }
}

impl<'de> Deserialize<'de> for TypedBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        TypedBlock::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("value is not a content block"))
    }
}

/// Deserialize a block list leniently (malformed entries are dropped).
pub fn deserialize_block_list<'de, D>(deserializer: D) -> std::result::Result<Vec<TypedBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| TypedBlock::list_from_value(&v)).unwrap_or_default())
}

fn first_str<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
}

fn collect_spans(items: &[Value], out: &mut Vec<InlineSpan>) {
    for item in items {
        match item {
            Value::Array(nested) => collect_spans(nested, out),
            other => {
                if let Some(span) = InlineSpan::from_value(other) {
                    out.push(span);
                }
            }
        }
    }
}

fn collect_blocks(value: &Value, out: &mut Vec<TypedBlock>) {
    match value {
        Value::Array(items) => {
            for item in items {
                if let Some(block) = TypedBlock::from_value(item) {
                    out.push(block);
                }
            }
        }
        other => {
            if let Some(block) = TypedBlock::from_value(other) {
                out.push(block);
            }
        }
    }
}
