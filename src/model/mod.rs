//! Document model types for extracted content.
//!
//! This module defines the typed-block representation consumed by the
//! segmenter, the row-based table model, and the value types exchanged with
//! the extractor and dataset layers.

mod block;
mod extraction;
pub mod fields;
mod table;

pub use block::{deserialize_block_list, BlockContent, BlockKind, InlineSpan, TypedBlock};
pub use extraction::{ExtractionResult, GroundTruthSample};
pub use table::{stringify_value, Table, TableCell, TableRow};
