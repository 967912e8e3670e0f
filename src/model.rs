use serde::{Deserialize, Serialize};

/// One finalized, non-empty unit of policy content with its provenance.
///
/// `subsection_id` and `subsection_title` are absent for fallback chunks
/// emitted when a part closes without ever opening a subsection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub section_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsection_title: Option<String>,
    pub page_number: u32,
    pub content: String,
    pub sequence_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub doc_id: String,
    pub source_path: String,
    pub sha256: String,
    pub line_count: usize,
    pub chunk_count: usize,
    pub discarded_line_count: usize,
    pub chunks_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SegmentCounts {
    pub input_count: usize,
    pub segmented_document_count: usize,
    pub skipped_document_count: usize,
    pub chunks_emitted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub family: String,
    pub counts: SegmentCounts,
    pub documents: Vec<DocumentSummary>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizeCounts {
    pub record_count: usize,
    pub matched_count: usize,
    pub unidentified_count: usize,
    pub missing_field_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub chunks_path: String,
    pub output_path: String,
    pub taxonomy_len: usize,
    pub field: String,
    pub counts: NormalizeCounts,
}
