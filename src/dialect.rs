use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;

/// No safe default dialect exists; callers must skip or mark the document.
#[derive(Debug, Error)]
#[error("unknown document family: {family}")]
pub struct UnknownDialect {
    pub family: String,
}

/// How a dialect renders the section path stamped on its chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPathStyle {
    /// "Partie B - Liability insurance"
    PartDash,
    /// "B. RESPONSABILITÉ CIVILE"
    CodeDot,
}

/// Declarative heading conventions for one document family.
///
/// All detectors are optional except at least one subsection shape; a family
/// that marks none of part/section/subsection would never open a chunk.
#[derive(Debug)]
pub struct DialectRule {
    pub family: String,
    /// Part label word plus a single letter code alone on the line; the part
    /// title is read from the following line.
    pub part_marker: Option<Regex>,
    /// Part heading with the code and an optional title on the same line;
    /// a missing or non-heading remainder falls back to the label table.
    pub inline_part: Option<Regex>,
    /// Section code followed directly by its title on the same line. The
    /// captured title must still pass the uppercase/length heuristic.
    pub inline_section: Option<Regex>,
    /// Bare section code alone on the line; the title follows on the next
    /// line when that line passes the uppercase/length heuristic.
    pub section_code: Option<Regex>,
    /// Letter-plus-number subsection id ("B1"); the title is the next line.
    pub coded_subsection: Option<Regex>,
    /// Number-dot subsection ("12. Title") with the title inline.
    pub numbered_subsection: Option<Regex>,
    pub page_boundary: Option<Regex>,
    /// Minimum character count for an all-uppercase line to count as a
    /// heading title rather than body text in capitals. Tuned per family,
    /// not load-bearing.
    pub heading_min_chars: usize,
    /// Canonical titles for short section codes, used when the document
    /// carries a title line we can resolve to a known label.
    pub section_titles: HashMap<String, String>,
    /// Synthesized part context for documents that omit the marker of their
    /// opening part.
    pub initial_part: Option<(String, String)>,
    /// Subsection title given to the fallback chunk of a part that never
    /// opens a subsection.
    pub fallback_subsection_title: String,
    pub part_label: String,
    pub path_style: SectionPathStyle,
}

impl DialectRule {
    pub fn section_path(&self, code: &str, title: &str) -> String {
        match self.path_style {
            SectionPathStyle::PartDash => {
                format!("{} {} - {}", self.part_label, code, title)
            }
            SectionPathStyle::CodeDot => format!("{}. {}", code, title),
        }
    }

    /// Resolves a raw title line against the canonical label table.
    pub fn resolve_section_title<'a>(&'a self, code: &str, candidate: &'a str) -> &'a str {
        self.section_titles
            .get(code)
            .map(String::as_str)
            .unwrap_or(candidate)
    }

    /// True when `candidate` reads as a heading title rather than body
    /// prose: entirely uppercase and longer than the dialect threshold.
    pub fn looks_like_heading_title(&self, candidate: &str) -> bool {
        let trimmed = candidate.trim();
        if trimmed.chars().count() <= self.heading_min_chars {
            return false;
        }
        trimmed == trimmed.to_uppercase()
    }
}

#[derive(Debug)]
pub struct DialectRegistry {
    rules: HashMap<String, DialectRule>,
}

impl DialectRegistry {
    pub fn builtin() -> Result<Self> {
        let mut rules = HashMap::new();
        for rule in [
            axa_motor()?,
            axa_travel()?,
            generali_motor(
                "generali-motor-fr",
                &[
                    ("A", "DISPOSITIONS COMMUNES"),
                    ("B", "RESPONSABILITÉ CIVILE"),
                    ("C", "ASSURANCE CASCO"),
                    ("D", "ASSURANCE-ACCIDENTS"),
                    ("E", "SERVICE D'ASSISTANCE ET DE DÉPANNAGE 24H/24"),
                ],
            )?,
            generali_motor(
                "generali-motor-en",
                &[
                    ("A", "Benefits overview"),
                    ("B", "Common provisions"),
                    ("C", "General exclusions"),
                    ("D", "Services"),
                    ("E", "Cancellation costs"),
                ],
            )?,
        ] {
            rules.insert(rule.family.clone(), rule);
        }

        Ok(Self { rules })
    }

    pub fn resolve(&self, family: &str) -> Result<&DialectRule, UnknownDialect> {
        self.rules.get(family).ok_or_else(|| UnknownDialect {
            family: family.to_string(),
        })
    }

    pub fn families(&self) -> Vec<&str> {
        let mut families: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        families.sort_unstable();
        families
    }
}

fn label_table(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(code, title)| (code.to_string(), title.to_string()))
        .collect()
}

fn axa_motor() -> Result<DialectRule> {
    Ok(DialectRule {
        family: "axa-motor".to_string(),
        part_marker: Some(
            Regex::new(r"(?i)^\s*(?:Partie|Part)\s*([A-K])\s*$")
                .context("failed to compile axa part marker regex")?,
        ),
        inline_part: None,
        inline_section: None,
        section_code: None,
        coded_subsection: Some(
            Regex::new(r"^([A-K])(\d{1,2})$")
                .context("failed to compile axa coded subsection regex")?,
        ),
        numbered_subsection: None,
        page_boundary: None,
        heading_min_chars: 5,
        section_titles: label_table(&[
            ("A", "Underlying Provisions of the Insurance Contract"),
            ("B", "Liability insurance: Damage caused by your vehicle"),
            ("C", "Accidental damage insurance: Damage to your vehicle"),
            ("D", "Services and add-ons"),
            ("E", "Definitions"),
        ]),
        initial_part: Some((
            "A".to_string(),
            "Underlying Provisions of the Insurance Contract".to_string(),
        )),
        fallback_subsection_title: "Definitions".to_string(),
        part_label: "Partie".to_string(),
        path_style: SectionPathStyle::PartDash,
    })
}

fn axa_travel() -> Result<DialectRule> {
    Ok(DialectRule {
        family: "axa-travel".to_string(),
        part_marker: None,
        inline_part: Some(
            Regex::new(r"(?i)^Part\s+([A-K])\b\s*(.*)$")
                .context("failed to compile axa travel part heading regex")?,
        ),
        inline_section: None,
        section_code: None,
        coded_subsection: Some(
            Regex::new(r"^([A-K])(\d{1,2})$")
                .context("failed to compile axa travel subsection regex")?,
        ),
        numbered_subsection: None,
        page_boundary: None,
        heading_min_chars: 5,
        section_titles: label_table(&[
            ("A", "Underlying Provisions of the Insurance Contract"),
            ("B", "Cancellation Costs"),
            ("C", "Personal Assistance"),
            ("D", "Roadside Assistance"),
            ("E", "Medical Treatment Costs Abroad"),
            ("F", "Rental Car Deductible"),
            ("G", "Luggage"),
            ("H", "Travel Legal Protection"),
            ("I", "Claims"),
            ("J", "Compensation"),
            ("K", "Definitions"),
        ]),
        initial_part: Some((
            "A".to_string(),
            "Underlying Provisions of the Insurance Contract".to_string(),
        )),
        fallback_subsection_title: "Definitions".to_string(),
        part_label: "Part".to_string(),
        path_style: SectionPathStyle::PartDash,
    })
}

fn generali_motor(family: &str, sections: &[(&str, &str)]) -> Result<DialectRule> {
    Ok(DialectRule {
        family: family.to_string(),
        part_marker: None,
        inline_part: None,
        inline_section: Some(
            Regex::new(r"^([A-E])\.\s+(.+)$")
                .context("failed to compile generali inline section regex")?,
        ),
        section_code: Some(
            Regex::new(r"^([A-E])\.$").context("failed to compile generali section code regex")?,
        ),
        coded_subsection: None,
        numbered_subsection: Some(
            Regex::new(r"^(\d{1,3})\.\s*(.*)$")
                .context("failed to compile generali subsection regex")?,
        ),
        page_boundary: Some(
            Regex::new(r"^(\d+)\s*/\s*\d+$")
                .context("failed to compile generali page boundary regex")?,
        ),
        heading_min_chars: 5,
        section_titles: label_table(sections),
        initial_part: None,
        fallback_subsection_title: "Dispositions".to_string(),
        part_label: "Section".to_string(),
        path_style: SectionPathStyle::CodeDot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_known_families() {
        let registry = DialectRegistry::builtin().unwrap();
        for family in [
            "axa-motor",
            "axa-travel",
            "generali-motor-fr",
            "generali-motor-en",
        ] {
            assert_eq!(registry.resolve(family).unwrap().family, family);
        }
    }

    #[test]
    fn unknown_family_is_a_typed_error() {
        let registry = DialectRegistry::builtin().unwrap();
        let err = registry.resolve("zurich-household").unwrap_err();
        assert_eq!(err.family, "zurich-household");
        assert!(err.to_string().contains("unknown document family"));
    }

    #[test]
    fn families_are_sorted() {
        let registry = DialectRegistry::builtin().unwrap();
        let families = registry.families();
        let mut sorted = families.clone();
        sorted.sort_unstable();
        assert_eq!(families, sorted);
    }

    #[test]
    fn heading_title_heuristic_rejects_short_or_mixed_case() {
        let registry = DialectRegistry::builtin().unwrap();
        let rule = registry.resolve("generali-motor-fr").unwrap();

        assert!(rule.looks_like_heading_title("RESPONSABILITÉ CIVILE"));
        assert!(!rule.looks_like_heading_title("CASCO"));
        assert!(!rule.looks_like_heading_title("Le preneur d'assurance"));
    }

    #[test]
    fn section_path_styles() {
        let registry = DialectRegistry::builtin().unwrap();

        let axa = registry.resolve("axa-motor").unwrap();
        assert_eq!(
            axa.section_path("B", "Liability insurance"),
            "Partie B - Liability insurance"
        );

        let generali = registry.resolve("generali-motor-fr").unwrap();
        assert_eq!(
            generali.section_path("B", "RESPONSABILITÉ CIVILE"),
            "B. RESPONSABILITÉ CIVILE"
        );
    }
}
