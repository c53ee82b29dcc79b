//! Boundary types shared with the extractor and dataset layers.

use serde::{Deserialize, Serialize};

use super::block::{deserialize_block_list, TypedBlock};

/// Output of a content extractor for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted markdown / text
    #[serde(default)]
    pub content: String,

    /// Extracted typed blocks
    #[serde(default, deserialize_with = "deserialize_block_list")]
    pub content_list: Vec<TypedBlock>,

    /// Whether extraction succeeded
    #[serde(default)]
    pub success: bool,

    /// Extractor error message, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// Create a successful result from markdown content.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_list: Vec::new(),
            success: true,
            error: None,
        }
    }

    /// Create a successful result from typed blocks.
    pub fn from_blocks(blocks: Vec<TypedBlock>) -> Self {
        Self {
            content_list: blocks,
            success: true,
            ..Self::default()
        }
    }

    /// Create a failed result.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Attach typed blocks.
    pub fn with_blocks(mut self, blocks: Vec<TypedBlock>) -> Self {
        self.content_list = blocks;
        self
    }
}

/// A ground-truth sample from the dataset layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroundTruthSample {
    /// Sample identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Reference markdown / text
    #[serde(default)]
    pub groundtruth_content: String,

    /// Reference typed blocks
    #[serde(default, deserialize_with = "deserialize_block_list")]
    pub groundtruth_content_list: Vec<TypedBlock>,
}

impl GroundTruthSample {
    /// Create a sample from reference markdown.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            groundtruth_content: content.into(),
            ..Self::default()
        }
    }

    /// Attach reference blocks.
    pub fn with_blocks(mut self, blocks: Vec<TypedBlock>) -> Self {
        self.groundtruth_content_list = blocks;
        self
    }
}
