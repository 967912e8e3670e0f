use anyhow::{Context, Result};
use regex::Regex;

use crate::dialect::DialectRule;

use super::cursor::LineCursor;
use super::engine::SegmentationState;

/// One classified input line. Blank lines are skipped and never tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    PartMarker {
        code: String,
        title: String,
    },
    SectionHeading {
        code: String,
        title: Option<String>,
    },
    SubsectionMarker {
        id: String,
        number: u32,
        title: Option<String>,
    },
    PageBoundary {
        page: u32,
    },
    Content {
        text: String,
    },
}

#[derive(Debug)]
pub struct LineClassifier {
    multi_level_number: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            multi_level_number: Regex::new(r"^\d{1,3}\.\d")
                .context("failed to compile multi-level number regex")?,
        })
    }

    /// Pulls the next non-blank line and classifies it. Marker shapes whose
    /// title sits on the following line consume that line too, so a token
    /// always carries everything the state machine needs.
    ///
    /// Classification never fails: anything unrecognized or ambiguous
    /// degrades to `Content`.
    pub fn next_token(
        &self,
        cursor: &mut LineCursor<'_>,
        state: &SegmentationState,
        dialect: &DialectRule,
    ) -> Option<LineToken> {
        loop {
            let raw = cursor.next()?;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            return Some(self.classify(line, cursor, state, dialect));
        }
    }

    fn classify(
        &self,
        line: &str,
        cursor: &mut LineCursor<'_>,
        state: &SegmentationState,
        dialect: &DialectRule,
    ) -> LineToken {
        if let Some(token) = classify_page_boundary(line, dialect) {
            return token;
        }
        if let Some(token) = classify_part_marker(line, cursor, dialect) {
            return token;
        }
        if let Some(token) = classify_inline_part(line, dialect) {
            return token;
        }
        if let Some(token) = classify_inline_section(line, dialect) {
            return token;
        }
        if let Some(token) = classify_section_code(line, cursor, dialect) {
            return token;
        }
        if let Some(token) = classify_coded_subsection(line, cursor, state, dialect) {
            return token;
        }
        if let Some(token) = self.classify_numbered_subsection(line, cursor, state, dialect) {
            return token;
        }

        LineToken::Content {
            text: line.to_string(),
        }
    }

    /// Numbered subsections ("12. Title") are the noisiest shape: sentence
    /// fragments and cross-references produce leading numerals too. A
    /// candidate is accepted only when its number strictly exceeds the last
    /// opened subsection; everything else is content.
    fn classify_numbered_subsection(
        &self,
        line: &str,
        cursor: &mut LineCursor<'_>,
        state: &SegmentationState,
        dialect: &DialectRule,
    ) -> Option<LineToken> {
        let pattern = dialect.numbered_subsection.as_ref()?;
        if self.multi_level_number.is_match(line) {
            return None;
        }

        let captures = pattern.captures(line)?;
        let number: u32 = captures.get(1)?.as_str().parse().ok()?;
        if number <= state.last_subsection_number {
            return None;
        }

        let rest = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        let title = if rest.is_empty() {
            // Bare "12." with the title on its own line, unless that line is
            // itself the next subsection marker.
            match cursor.peek().map(str::trim) {
                Some(next) if !next.is_empty() && !pattern.is_match(next) => {
                    cursor.advance();
                    Some(next.to_string())
                }
                _ => None,
            }
        } else if rest.contains('.') {
            // Dotted remainders are sentence text, not heading titles.
            return None;
        } else {
            Some(rest.to_string())
        };

        Some(LineToken::SubsectionMarker {
            id: number.to_string(),
            number,
            title,
        })
    }
}

fn classify_page_boundary(line: &str, dialect: &DialectRule) -> Option<LineToken> {
    let pattern = dialect.page_boundary.as_ref()?;
    let captures = pattern.captures(line)?;
    let page: u32 = captures.get(1)?.as_str().parse().ok()?;
    Some(LineToken::PageBoundary { page })
}

fn classify_part_marker(
    line: &str,
    cursor: &mut LineCursor<'_>,
    dialect: &DialectRule,
) -> Option<LineToken> {
    let pattern = dialect.part_marker.as_ref()?;
    let captures = pattern.captures(line)?;
    let code = captures.get(1)?.as_str().to_uppercase();

    // The part title is read from the following line unconditionally; a
    // marker on the very last line cannot be a real part.
    let title_line = cursor.peek()?;
    cursor.advance();
    let title = title_line.trim();
    let title = if title.is_empty() {
        dialect.resolve_section_title(&code, "").to_string()
    } else {
        title.to_string()
    };

    Some(LineToken::PartMarker { code, title })
}

fn classify_inline_part(line: &str, dialect: &DialectRule) -> Option<LineToken> {
    let pattern = dialect.inline_part.as_ref()?;
    let captures = pattern.captures(line)?;
    let code = captures.get(1)?.as_str().to_uppercase();
    let rest = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    let title = if rest.is_empty() {
        // "Part B" alone on the line; only accept codes the label table
        // knows.
        dialect.section_titles.get(&code)?.clone()
    } else if dialect.looks_like_heading_title(rest) {
        dialect.resolve_section_title(&code, rest).to_string()
    } else {
        // Body prose that happens to start with "Part B ...".
        return None;
    };

    Some(LineToken::PartMarker { code, title })
}

fn classify_inline_section(line: &str, dialect: &DialectRule) -> Option<LineToken> {
    let pattern = dialect.inline_section.as_ref()?;
    let captures = pattern.captures(line)?;
    let candidate = captures.get(2)?.as_str().trim();

    // Body prose can masquerade as "B. le preneur..."; require the
    // uppercase/length heuristic to pass before believing the heading.
    if !dialect.looks_like_heading_title(candidate) {
        return None;
    }

    let code = captures.get(1)?.as_str().to_uppercase();
    Some(LineToken::SectionHeading {
        code,
        title: Some(candidate.to_string()),
    })
}

fn classify_section_code(
    line: &str,
    cursor: &mut LineCursor<'_>,
    dialect: &DialectRule,
) -> Option<LineToken> {
    let pattern = dialect.section_code.as_ref()?;
    let captures = pattern.captures(line)?;

    let next = cursor.peek().map(str::trim)?;
    if !dialect.looks_like_heading_title(next) {
        // Not a real section heading; the code line stays content.
        return None;
    }
    cursor.advance();

    let code = captures.get(1)?.as_str().to_uppercase();
    let title = dialect.resolve_section_title(&code, next).to_string();
    Some(LineToken::SectionHeading {
        code,
        title: Some(title),
    })
}

fn classify_coded_subsection(
    line: &str,
    cursor: &mut LineCursor<'_>,
    state: &SegmentationState,
    dialect: &DialectRule,
) -> Option<LineToken> {
    let pattern = dialect.coded_subsection.as_ref()?;
    let captures = pattern.captures(line)?;
    let letter = captures.get(1)?.as_str().to_uppercase();
    let number: u32 = captures.get(2)?.as_str().parse().ok()?;

    // Continuity: the letter must belong to the current part and the number
    // must advance; numbers inside ordinary sentences fail this and stay
    // content. A document may also open directly with the first part's
    // subsections, without an explicit part marker.
    let continues_part =
        state.part_code.as_deref() == Some(letter.as_str()) && number > state.last_subsection_number;
    let opens_initial_part = state.part_code.is_none()
        && dialect
            .initial_part
            .as_ref()
            .is_some_and(|(code, _)| *code == letter);
    if !continues_part && !opens_initial_part {
        return None;
    }

    // The subsection title is the following line, unless that line is the
    // next marker itself (a title correction handled downstream) or the
    // marker of the next part.
    let next_is_marker = |next: &str| {
        pattern.is_match(next)
            || dialect
                .part_marker
                .as_ref()
                .is_some_and(|part| part.is_match(next))
    };
    let title = match cursor.peek().map(str::trim) {
        Some(next) if !next.is_empty() && !next_is_marker(next) => {
            cursor.advance();
            Some(next.to_string())
        }
        _ => None,
    };

    Some(LineToken::SubsectionMarker {
        id: format!("{letter}{number}"),
        number,
        title,
    })
}
