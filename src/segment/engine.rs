use tracing::debug;

use crate::dialect::DialectRule;
use crate::model::Chunk;

use super::classify::LineToken;

/// Mutable per-document segmentation context, carried line to line.
///
/// `last_subsection_number` never decreases except through a part
/// transition, which resets it to 0.
#[derive(Debug)]
pub struct SegmentationState {
    pub part_code: Option<String>,
    pub part_title: Option<String>,
    pub section_path: Option<String>,
    pub last_subsection_number: u32,
    pub page: u32,
}

impl SegmentationState {
    fn new() -> Self {
        Self {
            part_code: None,
            part_title: None,
            section_path: None,
            last_subsection_number: 0,
            page: 1,
        }
    }
}

#[derive(Debug)]
struct OpenChunk {
    section_path: String,
    subsection_id: Option<String>,
    subsection_title: Option<String>,
    page: u32,
}

/// Consumes the classified token stream of one document in order and emits
/// chunks on structural transitions. At most one chunk is open at any time;
/// `finish` must be called so the last buffer is not lost.
#[derive(Debug)]
pub struct Segmenter<'a> {
    dialect: &'a DialectRule,
    doc_id: String,
    state: SegmentationState,
    open: Option<OpenChunk>,
    buffer: Vec<String>,
    next_sequence: usize,
    discarded_line_count: usize,
}

impl<'a> Segmenter<'a> {
    pub fn new(dialect: &'a DialectRule, doc_id: &str) -> Self {
        Self {
            dialect,
            doc_id: doc_id.to_string(),
            state: SegmentationState::new(),
            open: None,
            buffer: Vec::new(),
            next_sequence: 0,
            discarded_line_count: 0,
        }
    }

    pub fn state(&self) -> &SegmentationState {
        &self.state
    }

    pub fn feed(&mut self, token: LineToken) -> Option<Chunk> {
        match token {
            LineToken::PageBoundary { page } => {
                self.state.page = page;
                None
            }
            LineToken::PartMarker { code, title } => {
                let flushed = self.flush_open().or_else(|| self.flush_fallback());
                self.state.section_path = Some(self.dialect.section_path(&code, &title));
                self.state.part_code = Some(code);
                self.state.part_title = Some(title);
                self.state.last_subsection_number = 0;
                flushed
            }
            LineToken::SectionHeading { code, title } => {
                // Content must not leak across a section boundary, so an
                // open chunk is flushed; section transitions do not reset
                // the subsection numbering, only part transitions do.
                let flushed = self.flush_open().or_else(|| self.flush_fallback());
                let title = title
                    .unwrap_or_else(|| self.dialect.resolve_section_title(&code, &code).to_string());
                self.state.section_path = Some(self.dialect.section_path(&code, &title));
                flushed
            }
            LineToken::SubsectionMarker { id, number, title } => {
                self.adopt_initial_part_if_needed();

                if self.buffer_is_blank() {
                    if let Some(open) = self.open.as_mut() {
                        // Two heading candidates with no content in between:
                        // the second corrects the first. Never emit an empty
                        // chunk.
                        open.subsection_id = Some(id);
                        open.subsection_title = title;
                        open.page = self.state.page;
                        self.buffer.clear();
                        self.state.last_subsection_number = number;
                        return None;
                    }
                }

                let flushed = self.flush_open().or_else(|| self.flush_fallback());
                self.open = Some(OpenChunk {
                    section_path: self.state.section_path.clone().unwrap_or_default(),
                    subsection_id: Some(id),
                    subsection_title: title,
                    page: self.state.page,
                });
                self.state.last_subsection_number = number;
                flushed
            }
            LineToken::Content { text } => {
                self.buffer.push(text);
                None
            }
        }
    }

    /// Finalizes the document, flushing whatever is still buffered.
    pub fn finish(&mut self) -> Option<Chunk> {
        self.flush_open().or_else(|| self.flush_fallback())
    }

    /// Non-blank lines dropped because no part or section context existed
    /// to stamp on them. Reported so the loss is visible to callers.
    pub fn discarded_line_count(&self) -> usize {
        self.discarded_line_count
    }

    fn adopt_initial_part_if_needed(&mut self) {
        if self.state.part_code.is_some() {
            return;
        }
        let Some((code, title)) = self.dialect.initial_part.clone() else {
            return;
        };
        self.state.section_path = Some(self.dialect.section_path(&code, &title));
        self.state.part_code = Some(code);
        self.state.part_title = Some(title);
    }

    fn buffer_is_blank(&self) -> bool {
        self.buffer.iter().all(|line| line.trim().is_empty())
    }

    fn take_buffer(&mut self) -> String {
        let content = self.buffer.join("\n").trim().to_string();
        self.buffer.clear();
        content
    }

    fn flush_open(&mut self) -> Option<Chunk> {
        let open = self.open.take()?;
        let content = self.take_buffer();
        if content.is_empty() {
            return None;
        }

        Some(self.emit(
            open.section_path,
            open.subsection_id,
            open.subsection_title,
            open.page,
            content,
        ))
    }

    /// A part that closes without ever opening a subsection still owns its
    /// carried content; it is flushed as a single chunk under the dialect's
    /// fallback subsection title.
    fn flush_fallback(&mut self) -> Option<Chunk> {
        debug_assert!(self.open.is_none());
        if self.buffer_is_blank() {
            self.buffer.clear();
            return None;
        }

        let Some(section_path) = self.state.section_path.clone() else {
            debug!(
                doc_id = %self.doc_id,
                part = self.state.part_title.as_deref().unwrap_or(""),
                lines = self.buffer.len(),
                "discarding content with no part or section context"
            );
            self.discarded_line_count += self.buffer.len();
            self.buffer.clear();
            return None;
        };

        let content = self.take_buffer();
        Some(self.emit(
            section_path,
            None,
            Some(self.dialect.fallback_subsection_title.clone()),
            self.state.page,
            content,
        ))
    }

    fn emit(
        &mut self,
        section_path: String,
        subsection_id: Option<String>,
        subsection_title: Option<String>,
        page_number: u32,
        content: String,
    ) -> Chunk {
        let sequence_index = self.next_sequence;
        self.next_sequence += 1;

        Chunk {
            doc_id: self.doc_id.clone(),
            section_path,
            subsection_id,
            subsection_title,
            page_number,
            content,
            sequence_index,
        }
    }
}
