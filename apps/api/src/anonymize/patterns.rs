//! Compiled redaction patterns, built once at startup and shared read-only.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::anonymize::names::{load_name_lists, NameEntry, TokenIndex};

const EMAIL_PATTERN: &str =
    r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}";

/// Digit groupings recognised as phone numbers when no override is configured.
/// Every candidate must additionally carry 7 to 15 digits and not touch other digits.
/// The last entry accepts any grouping with single separators (`012 345 678`,
/// `020 7946 0958`, `0 12 34 56 78`).
pub const DEFAULT_PHONE_PATTERNS: &[&str] = &[
    r"\+\d{1,3}[ \t.-]?\(?\d{1,4}\)?(?:[ \t.-]?\d{2,4}){1,4}",
    r"\(?\d{3}\)?[ \t.-]?\d{3}[ \t.-]?\d{4}",
    r"\d{3}[ \t.-]\d{4}",
    r"\d{7,15}",
    r"\+?\d(?:[ \t().-]?\d){6,14}",
];

pub const MIN_PHONE_DIGITS: usize = 7;
pub const MAX_PHONE_DIGITS: usize = 15;

const NAME_LABEL_PATTERN: &str = r"(?im)^[ \t]*(?:full[ \t]+)?name[ \t]*[:\-][ \t]*(.*)$";

const INSTITUTION_PATTERN: &str = r"(?:\b[A-Z][\w&'.-]*[ \t]+){0,3}\b(?:University|College|Institute|Polytechnic|Academy)\b(?:[ \t]+of[ \t]+[A-Z][\w&'-]*(?:[ \t]+[A-Z][\w&'-]*){0,3})?";

/// Prestige cues matched as whole tokens, case-insensitively.
pub const PRESTIGE_TERMS: &[&str] = &[
    "Elite University",
    "Ivy League",
    "Oxbridge",
    "Russell Group",
    "Harvard",
    "Stanford",
    "MIT",
    "Caltech",
    "Princeton",
    "Yale",
    "Columbia",
    "Berkeley",
    "UCLA",
    "Wharton",
    "INSEAD",
    "Oxford",
    "Cambridge",
    "Imperial College",
    "ETH Zurich",
    "Sorbonne",
    "Tsinghua",
    "NUS",
    "NTU",
    "Fortune 500",
    "FAANG",
    "Big Four",
];

#[derive(Debug, Error)]
#[error("no usable name entries loaded ({skipped} source(s) skipped)")]
pub struct EmptyDatabaseError {
    pub skipped: usize,
}

#[derive(Debug, Error)]
pub enum PatternSetError {
    #[error(transparent)]
    Empty(#[from] EmptyDatabaseError),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

fn compile(pattern: &str) -> Result<Regex, PatternSetError> {
    Regex::new(pattern).map_err(|source| PatternSetError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Everything the redactor matches against. Immutable after `build`.
#[derive(Debug, Clone)]
pub struct PatternSet {
    email: Regex,
    phones: Vec<Regex>,
    name_label: Regex,
    institution: Regex,
    names: TokenIndex,
    prestige: TokenIndex,
    regions: BTreeMap<String, usize>,
}

impl PatternSet {
    /// Loads the name directory and compiles the set.
    ///
    /// Individual malformed lists are skipped; only an empty result is fatal.
    pub fn load(names_dir: &Path, phone_patterns: &[String]) -> Result<Self, PatternSetError> {
        let load = load_name_lists(names_dir);
        if load.entries.is_empty() {
            return Err(EmptyDatabaseError {
                skipped: load.errors.len(),
            }
            .into());
        }
        let set = Self::build(&load.entries, phone_patterns)?;
        info!(
            "Pattern set ready: {} names across {} region(s), {} list(s) skipped",
            set.name_count(),
            set.regions.len(),
            load.errors.len()
        );
        Ok(set)
    }

    /// Compiles a set from already-loaded entries. An empty `phone_patterns`
    /// selects `DEFAULT_PHONE_PATTERNS`.
    pub fn build(entries: &[NameEntry], phone_patterns: &[String]) -> Result<Self, PatternSetError> {
        let mut names = TokenIndex::new();
        let mut regions = BTreeMap::new();
        for entry in entries {
            if names.insert(&entry.name) {
                *regions.entry(entry.region.clone()).or_insert(0) += 1;
            }
        }
        if names.is_empty() {
            return Err(EmptyDatabaseError { skipped: 0 }.into());
        }

        let phones = if phone_patterns.is_empty() {
            DEFAULT_PHONE_PATTERNS
                .iter()
                .map(|p| compile(p))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            phone_patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            email: compile(EMAIL_PATTERN)?,
            phones,
            name_label: compile(NAME_LABEL_PATTERN)?,
            institution: compile(INSTITUTION_PATTERN)?,
            names,
            prestige: TokenIndex::from_phrases(PRESTIGE_TERMS.iter().copied()),
            regions,
        })
    }

    pub fn email(&self) -> &Regex {
        &self.email
    }

    pub fn phones(&self) -> &[Regex] {
        &self.phones
    }

    pub fn name_label(&self) -> &Regex {
        &self.name_label
    }

    pub fn institution(&self) -> &Regex {
        &self.institution
    }

    pub fn names(&self) -> &TokenIndex {
        &self.names
    }

    pub fn prestige(&self) -> &TokenIndex {
        &self.prestige
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Distinct names contributed per region, first source wins on duplicates.
    pub fn regions(&self) -> &BTreeMap<String, usize> {
        &self.regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymize::names::Gender;

    fn entry(name: &str, region: &str) -> NameEntry {
        NameEntry {
            name: name.to_string(),
            region: region.to_string(),
            gender: Gender::Unisex,
        }
    }

    #[test]
    fn test_build_counts_regions_once_per_name() {
        let set = PatternSet::build(
            &[entry("Dara", "sea"), entry("dara", "western"), entry("Ana", "western")],
            &[],
        )
        .unwrap();
        assert_eq!(set.name_count(), 2);
        assert_eq!(set.regions().get("sea"), Some(&1));
        assert_eq!(set.regions().get("western"), Some(&1));
        assert_eq!(set.phones().len(), DEFAULT_PHONE_PATTERNS.len());
    }

    #[test]
    fn test_build_with_no_names_is_empty_database() {
        let err = PatternSet::build(&[entry("   ", "sea")], &[]).unwrap_err();
        assert!(matches!(err, PatternSetError::Empty(_)));
    }

    #[test]
    fn test_custom_phone_patterns_replace_defaults() {
        let set = PatternSet::build(&[entry("Dara", "sea")], &[r"\d{3} \d{3} \d{3}".to_string()])
            .unwrap();
        assert_eq!(set.phones().len(), 1);
    }

    #[test]
    fn test_invalid_phone_pattern_rejected() {
        let err = PatternSet::build(&[entry("Dara", "sea")], &["(".to_string()]).unwrap_err();
        assert!(matches!(err, PatternSetError::InvalidPattern { .. }));
    }

    #[test]
    fn test_load_fails_only_when_every_list_is_unusable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sea_male.json"), "[oops").unwrap();
        let err = PatternSet::load(dir.path(), &[]).unwrap_err();
        match err {
            PatternSetError::Empty(e) => assert_eq!(e.skipped, 1),
            other => panic!("unexpected error: {other}"),
        }

        std::fs::write(dir.path().join("sea_female.json"), r#"["Sokha"]"#).unwrap();
        let set = PatternSet::load(dir.path(), &[]).unwrap();
        assert_eq!(set.name_count(), 1);
    }

    #[test]
    fn test_email_requires_dotted_domain() {
        let set = PatternSet::build(&[entry("Dara", "sea")], &[]).unwrap();
        assert!(set.email().is_match("jane@acme.com"));
        assert!(!set.email().is_match("jane@localhost"));
    }

    #[test]
    fn test_institution_pattern_stays_on_one_line() {
        let set = PatternSet::build(&[entry("Dara", "sea")], &[]).unwrap();
        let text = "Education\nHarvard University";
        let m = set.institution().find(text).unwrap();
        assert_eq!(m.as_str(), "Harvard University");
    }
}
