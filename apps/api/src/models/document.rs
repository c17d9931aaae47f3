use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Extracted resume text as handed over by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub text: String,
}

impl RawDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionCategory {
    Email,
    Phone,
    Name,
    Institution,
}

impl RedactionCategory {
    pub const ALL: [RedactionCategory; 4] = [
        RedactionCategory::Email,
        RedactionCategory::Phone,
        RedactionCategory::Name,
        RedactionCategory::Institution,
    ];

    /// One stable token per category, never per instance.
    pub fn placeholder(self) -> &'static str {
        match self {
            RedactionCategory::Email => "[EMAIL]",
            RedactionCategory::Phone => "[PHONE]",
            RedactionCategory::Name => "[NAME]",
            RedactionCategory::Institution => "[INSTITUTION]",
        }
    }
}

impl fmt::Display for RedactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RedactionCategory::Email => "email",
            RedactionCategory::Phone => "phone",
            RedactionCategory::Name => "name",
            RedactionCategory::Institution => "institution",
        };
        f.write_str(label)
    }
}

/// Audit record of one replacement. The matched text itself is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionEntry {
    pub category: RedactionCategory,
    /// Length of the replaced span, in chars.
    pub original_len: usize,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizedDocument {
    pub text: String,
    pub ledger: Vec<RedactionEntry>,
}

impl AnonymizedDocument {
    pub fn count(&self, category: RedactionCategory) -> usize {
        self.ledger
            .iter()
            .filter(|entry| entry.category == category)
            .count()
    }

    /// Per-category totals, e.g. `{"name": 3, "email": 1}`.
    pub fn summary(&self) -> BTreeMap<RedactionCategory, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.ledger {
            *counts.entry(entry.category).or_insert(0) += 1;
        }
        counts
    }
}

/// Section labels, declared in descending default weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLabel {
    Skills,
    Experience,
    Education,
    Summary,
    Other,
}

impl SectionLabel {
    pub fn display_name(self) -> &'static str {
        match self {
            SectionLabel::Skills => "Skills",
            SectionLabel::Experience => "Experience",
            SectionLabel::Education => "Education",
            SectionLabel::Summary => "Summary",
            SectionLabel::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub label: SectionLabel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionedDocument {
    /// Source order is preserved; a section may be empty.
    pub sections: Vec<Section>,
    /// False when no header cue was recognized anywhere.
    pub headers_found: bool,
}

impl SectionedDocument {
    pub fn labels(&self) -> Vec<SectionLabel> {
        self.sections.iter().map(|s| s.label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: RedactionCategory) -> RedactionEntry {
        RedactionEntry {
            category,
            original_len: 4,
            replacement: category.placeholder().to_string(),
        }
    }

    #[test]
    fn test_counts_come_from_ledger_not_text() {
        let doc = AnonymizedDocument {
            text: "[NAME] and [NAME]".to_string(),
            ledger: vec![
                entry(RedactionCategory::Name),
                entry(RedactionCategory::Name),
                entry(RedactionCategory::Name),
                entry(RedactionCategory::Email),
            ],
        };
        assert_eq!(doc.count(RedactionCategory::Name), 3);
        assert_eq!(doc.count(RedactionCategory::Phone), 0);
        let summary = doc.summary();
        assert_eq!(summary.get(&RedactionCategory::Email), Some(&1));
        assert!(!summary.contains_key(&RedactionCategory::Institution));
    }

    #[test]
    fn test_placeholders_are_distinct() {
        let mut tokens: Vec<&str> = RedactionCategory::ALL
            .iter()
            .map(|c| c.placeholder())
            .collect();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), RedactionCategory::ALL.len());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&RedactionCategory::Institution).unwrap();
        assert_eq!(json, r#""institution""#);
    }
}
