use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;

/// Fixed, ordered, closed set of category labels, each carrying a leading
/// ordinal ("6. Assurance Casco"). Loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    entries: Vec<String>,
}

impl Taxonomy {
    /// The motor-insurance taxonomy shared by chunk categorization and
    /// query classification.
    pub fn builtin() -> Self {
        Self {
            entries: [
                "1. Dispositions contractuelles générales",
                "2. Plaques et immatriculation",
                "3. Paiement, primes et franchises",
                "4. Résiliation et modification du contrat",
                "5. Responsabilité civile (RC)",
                "6. Assurance Casco",
                "7. Garanties corporelles (accidents)",
                "8. Services et assistance",
                "9. Garanties complémentaires",
                "10. Obligations de l'assuré",
                "11. Protection des données et droit applicable",
                "12. Dispositions spécifiques",
            ]
            .map(str::to_string)
            .to_vec(),
        }
    }

    pub fn from_entries(entries: Vec<String>) -> Result<Self> {
        if entries.is_empty() {
            bail!("taxonomy must contain at least one entry");
        }
        Ok(Self { entries })
    }

    /// Loads a taxonomy from a JSON array of label strings.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read taxonomy file: {}", path.display()))?;
        let entries: Vec<String> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse taxonomy file: {}", path.display()))?;
        Self::from_entries(entries)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of normalizing a free-form classification answer: either one
/// taxonomy entry verbatim, or a sentinel carrying a truncated copy of the
/// unmatched answer for diagnostics. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryLabel {
    Entry(String),
    Unidentified(String),
}

impl CategoryLabel {
    pub fn is_unidentified(&self) -> bool {
        matches!(self, CategoryLabel::Unidentified(_))
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryLabel::Entry(entry) => f.write_str(entry),
            CategoryLabel::Unidentified(prefix) => {
                write!(f, "Unidentified (answer: '{prefix}')")
            }
        }
    }
}

const UNIDENTIFIED_PREFIX_CHARS: usize = 60;

/// Maps noisy external classification answers onto the closed taxonomy.
///
/// The same cascade must run wherever the taxonomy is consulted, at
/// indexing time and at query time, so filters stay consistent.
#[derive(Debug)]
pub struct CategoryNormalizer {
    taxonomy: Taxonomy,
    leading_ordinal: Regex,
}

impl CategoryNormalizer {
    pub fn new(taxonomy: Taxonomy) -> Result<Self> {
        Ok(Self {
            taxonomy,
            leading_ordinal: Regex::new(r"^(\d{1,2})\.?")
                .context("failed to compile leading ordinal regex")?,
        })
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// First match wins: exact entry, then case-sensitive substring of
    /// exactly one entry, then a leading ordinal selecting by position.
    /// Anything else becomes `Unidentified`; normalization never guesses
    /// beyond these rules and never fails.
    pub fn normalize(&self, raw_answer: &str) -> CategoryLabel {
        let answer = raw_answer.trim();

        if self.taxonomy.entries.iter().any(|entry| entry == answer) {
            return CategoryLabel::Entry(answer.to_string());
        }

        if !answer.is_empty() {
            let mut matches = self
                .taxonomy
                .entries
                .iter()
                .filter(|entry| entry.contains(answer));
            if let Some(entry) = matches.next()
                && matches.next().is_none()
            {
                return CategoryLabel::Entry(entry.clone());
            }
        }

        if let Some(captures) = self.leading_ordinal.captures(answer)
            && let Ok(number) = captures[1].parse::<usize>()
            && number >= 1
            && number <= self.taxonomy.len()
        {
            return CategoryLabel::Entry(self.taxonomy.entries[number - 1].clone());
        }

        let prefix: String = answer.chars().take(UNIDENTIFIED_PREFIX_CHARS).collect();
        CategoryLabel::Unidentified(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer(entries: &[&str]) -> CategoryNormalizer {
        let taxonomy =
            Taxonomy::from_entries(entries.iter().map(|s| s.to_string()).collect()).unwrap();
        CategoryNormalizer::new(taxonomy).unwrap()
    }

    #[test]
    fn exact_match_wins() {
        let normalizer = normalizer(&["1. Alpha", "2. Beta"]);
        assert_eq!(
            normalizer.normalize("1. Alpha"),
            CategoryLabel::Entry("1. Alpha".to_string())
        );
    }

    #[test]
    fn unique_substring_selects_its_entry() {
        let normalizer = normalizer(&["1. Alpha", "2. Beta"]);
        assert_eq!(
            normalizer.normalize("Beta"),
            CategoryLabel::Entry("2. Beta".to_string())
        );
    }

    #[test]
    fn ambiguous_substring_is_unidentified() {
        let normalizer = normalizer(&["1. Casco partielle", "2. Casco collision"]);
        assert_eq!(
            normalizer.normalize("Casco"),
            CategoryLabel::Unidentified("Casco".to_string())
        );
    }

    #[test]
    fn leading_ordinal_selects_by_position() {
        let normalizer = normalizer(&["1. Alpha", "2. Beta"]);
        assert_eq!(
            normalizer.normalize("2."),
            CategoryLabel::Entry("2. Beta".to_string())
        );
        assert_eq!(
            normalizer.normalize("2"),
            CategoryLabel::Entry("2. Beta".to_string())
        );
    }

    #[test]
    fn out_of_range_ordinal_is_unidentified() {
        let normalizer = normalizer(&["1. Alpha", "2. Beta"]);
        assert_eq!(
            normalizer.normalize("7."),
            CategoryLabel::Unidentified("7.".to_string())
        );
    }

    #[test]
    fn unmatched_answer_keeps_a_truncated_prefix() {
        let normalizer = normalizer(&["1. Alpha"]);
        let long_answer = "Gamma ".repeat(30);
        let label = normalizer.normalize(&long_answer);
        match label {
            CategoryLabel::Unidentified(prefix) => {
                assert_eq!(prefix.chars().count(), 60);
                assert!(prefix.starts_with("Gamma"));
            }
            other => panic!("expected Unidentified, got {other:?}"),
        }
    }

    #[test]
    fn closure_over_arbitrary_answers() {
        let normalizer = CategoryNormalizer::new(Taxonomy::builtin()).unwrap();
        for raw in [
            "6. Assurance Casco",
            "Assurance Casco",
            "6.",
            "12",
            "13.",
            "",
            "   ",
            "réponse libre du modèle",
        ] {
            match normalizer.normalize(raw) {
                CategoryLabel::Entry(entry) => {
                    assert!(normalizer.taxonomy().entries().contains(&entry));
                }
                CategoryLabel::Unidentified(prefix) => {
                    assert!(prefix.chars().count() <= 60);
                }
            }
        }
    }

    #[test]
    fn builtin_taxonomy_round_trips_its_own_ordinals() {
        let normalizer = CategoryNormalizer::new(Taxonomy::builtin()).unwrap();
        for (index, entry) in normalizer.taxonomy().entries().to_vec().iter().enumerate() {
            assert_eq!(
                normalizer.normalize(&format!("{}.", index + 1)),
                CategoryLabel::Entry(entry.clone())
            );
        }
    }

    #[test]
    fn empty_taxonomy_is_rejected() {
        assert!(Taxonomy::from_entries(Vec::new()).is_err());
    }

    #[test]
    fn unidentified_display_carries_the_answer() {
        let label = CategoryLabel::Unidentified("Gamma".to_string());
        assert_eq!(label.to_string(), "Unidentified (answer: 'Gamma')");
    }
}
