//! Embedding pipeline for SignalForge.
//!
//! Text and flat JSON records are shrunk to a fixed character budget and
//! then sent to an embedding model. The shrink is deterministic and must
//! produce exactly what client applications produce for the same input,
//! so lengths are counted in UTF-16 code units and records are serialised
//! compactly in insertion order with JavaScript number formatting.

pub mod pipeline;
pub mod truncate;

pub use pipeline::{EmbeddingInput, EmbeddingPipeline};
pub use truncate::{
    max_value_length, record_to_json_string, to_json_string, truncate, truncate_record, utf16_len,
};

/// Default character budget for embedded text.
pub const EMBEDDING_MAX_CHARS: usize = 512;
