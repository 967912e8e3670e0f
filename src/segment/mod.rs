mod classify;
mod cursor;
mod engine;

pub use classify::{LineClassifier, LineToken};
pub use cursor::LineCursor;
pub use engine::{SegmentationState, Segmenter};

use crate::dialect::DialectRule;
use crate::model::Chunk;

/// Result of segmenting one document: the ordered chunk sequence plus the
/// count of non-blank lines dropped for lack of any part or section context.
#[derive(Debug)]
pub struct SegmentedDocument {
    pub chunks: Vec<Chunk>,
    pub discarded_line_count: usize,
}

/// Segments one document's extracted text into an ordered chunk sequence.
///
/// Strictly sequential within a document; callers may run many documents in
/// parallel since every call owns its own state.
pub fn segment_document(
    classifier: &LineClassifier,
    dialect: &DialectRule,
    doc_id: &str,
    text: &str,
) -> SegmentedDocument {
    let mut cursor = LineCursor::new(text);
    let mut segmenter = Segmenter::new(dialect, doc_id);
    let mut chunks = Vec::new();

    while let Some(token) = classifier.next_token(&mut cursor, segmenter.state(), dialect) {
        if let Some(chunk) = segmenter.feed(token) {
            chunks.push(chunk);
        }
    }
    if let Some(chunk) = segmenter.finish() {
        chunks.push(chunk);
    }

    SegmentedDocument {
        chunks,
        discarded_line_count: segmenter.discarded_line_count(),
    }
}
