//! Skills Scorer — transparent, section-weighted coverage of a role's required skills.
//!
//! Matching works on normalised token windows: lowercase, punctuation and
//! separators dropped, light suffix stemming. `Machine-Learning` and
//! `machine learning` therefore produce the same tokens. A skill counts once,
//! at the highest-weight section it appears in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::document::{RedactionCategory, SectionLabel, SectionedDocument};
use crate::models::role::RoleProfile;

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

/// Per-section multipliers. `minor` covers education, summary and other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionWeights {
    pub skills: f64,
    pub experience: f64,
    pub minor: f64,
    /// Used for every match when the document has no recognisable headers.
    pub unsectioned: f64,
}

impl Default for SectionWeights {
    fn default() -> Self {
        Self {
            skills: 1.0,
            experience: 0.7,
            minor: 0.3,
            unsectioned: 0.7,
        }
    }
}

impl SectionWeights {
    pub fn weight(&self, label: SectionLabel) -> f64 {
        match label {
            SectionLabel::Skills => self.skills,
            SectionLabel::Experience => self.experience,
            SectionLabel::Education | SectionLabel::Summary | SectionLabel::Other => self.minor,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aliases
// ────────────────────────────────────────────────────────────────────────────

/// Alternative phrasings accepted for a required skill, keyed by the lowercase skill.
const ALIASES: &[(&str, &[&str])] = &[
    ("ps", &["photoshop", "adobe photoshop"]),
    ("ai", &["illustrator", "adobe illustrator"]),
    ("pr", &["premiere", "adobe premiere"]),
    ("ae", &["after effects", "adobe after effects"]),
    ("js", &["javascript"]),
    ("ts", &["typescript"]),
    ("teacher", &["teaching", "instructor", "lecturer", "tutor"]),
    ("english", &["esl", "efl", "elt", "eap", "english language"]),
    ("lesson planning", &["lesson plan", "lesson plans", "planning lessons"]),
    (
        "classroom management",
        &[
            "class management",
            "behaviour management",
            "behavior management",
            "classroom discipline",
        ],
    ),
    (
        "curriculum development",
        &[
            "curriculum design",
            "syllabus design",
            "course design",
            "curriculum planning",
        ],
    ),
    ("assessment", &["evaluation", "testing", "examination", "grading"]),
    ("reading", &["reading comprehension"]),
    ("writing", &["writing skills"]),
];

fn aliases_for(skill: &str) -> &'static [&'static str] {
    let key = skill.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, alts)| *alts)
        .unwrap_or(&[])
}

// ────────────────────────────────────────────────────────────────────────────
// Normalisation
// ────────────────────────────────────────────────────────────────────────────

/// Stems shorter than three chars are not produced (`going` stays, never `go`).
fn stem(token: &str) -> String {
    if token.chars().count() > 4 {
        for suffix in ["ing", "ers", "er", "ed", "s"] {
            if let Some(base) = token.strip_suffix(suffix) {
                if base.chars().count() >= 3 {
                    return base.to_string();
                }
            }
        }
    }
    token.to_string()
}

/// Lowercase stemmed tokens. `+` and `#` stay inside tokens so `C++` and `C#` survive.
fn normalize(text: &str) -> Vec<String> {
    let mut cleaned = text.to_string();
    for category in RedactionCategory::ALL {
        cleaned = cleaned.replace(category.placeholder(), " ");
    }
    cleaned
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .map(|t| stem(&t.to_lowercase()))
        .collect()
}

fn contains_window(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

// ────────────────────────────────────────────────────────────────────────────
// Result types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    /// Winning section; `None` for a missing skill.
    pub section: Option<SectionLabel>,
    pub weight: f64,
    /// The alias phrase that matched, when it was not the skill itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_as: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub role: String,
    /// Weighted share of required skills found, clamped to [0, 1].
    pub coverage: f64,
    pub required: usize,
    pub matched: Vec<SkillMatch>,
    pub missing: Vec<SkillMatch>,
    /// Share of coverage contributed by each section.
    pub contributions: BTreeMap<SectionLabel, f64>,
    pub reasons: Vec<String>,
    /// Degraded paths observed while scoring.
    pub notes: Vec<String>,
}

impl ScoreResult {
    pub fn has_requirements(&self) -> bool {
        self.required > 0
    }

    pub fn missing_skills(&self) -> Vec<&str> {
        self.missing.iter().map(|m| m.skill.as_str()).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

struct Candidate {
    phrase: String,
    tokens: Vec<String>,
}

struct Hit {
    label: SectionLabel,
    weight: f64,
    matched_as: Option<String>,
}

pub fn score(doc: &SectionedDocument, profile: &RoleProfile, weights: &SectionWeights) -> ScoreResult {
    let sections: Vec<(SectionLabel, Vec<String>)> = doc
        .sections
        .iter()
        .map(|s| (s.label, normalize(&s.text)))
        .collect();

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut contributions: BTreeMap<SectionLabel, f64> = BTreeMap::new();
    let mut notes = Vec::new();
    let mut total = 0.0;

    if !doc.headers_found {
        notes.push(format!(
            "no section headers found; matches weighted at {:.2}",
            weights.unsectioned
        ));
    }
    if profile.skills.is_empty() {
        notes.push(format!("role '{}' has no required skills", profile.name));
    }

    for skill in &profile.skills {
        let candidates: Vec<Candidate> = std::iter::once(skill.as_str())
            .chain(aliases_for(skill).iter().copied())
            .map(|phrase| Candidate {
                phrase: phrase.to_string(),
                tokens: normalize(phrase),
            })
            .filter(|c| !c.tokens.is_empty())
            .collect();

        let hit = best_hit(&sections, &candidates, doc.headers_found, weights, skill);
        match hit {
            Some(hit) => {
                total += hit.weight;
                *contributions.entry(hit.label).or_insert(0.0) += hit.weight;
                let place = if doc.headers_found {
                    format!("in {} section", hit.label.display_name())
                } else {
                    "in unsectioned text".to_string()
                };
                let reason = match &hit.matched_as {
                    Some(alias) => format!("{skill} found {place} (as '{alias}')"),
                    None => format!("{skill} found {place}"),
                };
                matched.push(SkillMatch {
                    skill: skill.clone(),
                    section: Some(hit.label),
                    weight: hit.weight,
                    matched_as: hit.matched_as,
                    reason,
                });
            }
            None => missing.push(SkillMatch {
                skill: skill.clone(),
                section: None,
                weight: 0.0,
                matched_as: None,
                reason: format!("{skill} not found"),
            }),
        }
    }

    let required = profile.skills.len();
    let coverage = if required == 0 {
        0.0
    } else {
        (total / required as f64).clamp(0.0, 1.0)
    };
    let contributions = contributions
        .into_iter()
        .map(|(label, w)| (label, if required == 0 { 0.0 } else { w / required as f64 }))
        .collect();

    let reasons = matched
        .iter()
        .chain(missing.iter())
        .map(|m| m.reason.clone())
        .collect();

    ScoreResult {
        role: profile.name.clone(),
        coverage,
        required,
        matched,
        missing,
        contributions,
        reasons,
        notes,
    }
}

/// Highest-weight section containing any candidate; earlier sections win ties.
fn best_hit(
    sections: &[(SectionLabel, Vec<String>)],
    candidates: &[Candidate],
    headers_found: bool,
    weights: &SectionWeights,
    skill: &str,
) -> Option<Hit> {
    let mut best: Option<Hit> = None;
    for (label, tokens) in sections {
        let Some(candidate) = candidates.iter().find(|c| contains_window(tokens, &c.tokens)) else {
            continue;
        };
        let weight = if headers_found {
            weights.weight(*label)
        } else {
            weights.unsectioned
        };
        if best.as_ref().map_or(true, |b| weight > b.weight) {
            let matched_as = (!candidate.phrase.eq_ignore_ascii_case(skill.trim()))
                .then(|| candidate.phrase.clone());
            best = Some(Hit {
                label: *label,
                weight,
                matched_as,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::Section;

    fn sectioned(parts: &[(SectionLabel, &str)]) -> SectionedDocument {
        SectionedDocument {
            sections: parts
                .iter()
                .map(|(label, text)| Section {
                    label: *label,
                    text: text.to_string(),
                })
                .collect(),
            headers_found: true,
        }
    }

    fn profile(skills: &[&str]) -> RoleProfile {
        RoleProfile::new("Data Analyst", "technology", skills.iter().copied())
    }

    #[test]
    fn test_reference_example_coverage() {
        let doc = sectioned(&[
            (SectionLabel::Summary, "Contact: [EMAIL], [PHONE]."),
            (SectionLabel::Skills, "Python, SQL. Studied at [INSTITUTION]."),
        ]);
        let result = score(&doc, &profile(&["Python", "SQL", "Docker"]), &SectionWeights::default());
        assert!((result.coverage - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.missing_skills(), vec!["Docker"]);
        assert_eq!(result.matched[0].reason, "Python found in Skills section");
        assert_eq!(result.missing[0].reason, "Docker not found");
        assert_eq!(result.reasons.len(), 3);
    }

    #[test]
    fn test_separator_tolerant_phrase_match() {
        let doc = sectioned(&[(SectionLabel::Skills, "Machine-Learning, data_viz")]);
        let result = score(&doc, &profile(&["machine learning"]), &SectionWeights::default());
        assert_eq!(result.coverage, 1.0);
    }

    #[test]
    fn test_phrase_requires_contiguous_tokens() {
        let doc = sectioned(&[(SectionLabel::Skills, "machine shop, deep learning")]);
        let result = score(&doc, &profile(&["machine learning"]), &SectionWeights::default());
        assert_eq!(result.coverage, 0.0);
    }

    #[test]
    fn test_highest_weight_section_counts_once() {
        let doc = sectioned(&[
            (SectionLabel::Summary, "Python enthusiast"),
            (SectionLabel::Experience, "Wrote Python services"),
            (SectionLabel::Skills, "Python"),
        ]);
        let result = score(&doc, &profile(&["Python"]), &SectionWeights::default());
        assert_eq!(result.coverage, 1.0);
        assert_eq!(result.matched[0].section, Some(SectionLabel::Skills));
        assert_eq!(result.contributions.len(), 1);
    }

    #[test]
    fn test_experience_and_minor_weights() {
        let doc = sectioned(&[
            (SectionLabel::Experience, "Built dashboards in Excel"),
            (SectionLabel::Education, "Coursework in SQL"),
        ]);
        let result = score(&doc, &profile(&["Excel", "SQL"]), &SectionWeights::default());
        assert!((result.coverage - 0.5).abs() < 1e-9);
        assert!((result.contributions[&SectionLabel::Experience] - 0.35).abs() < 1e-9);
        assert!((result.contributions[&SectionLabel::Education] - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_alias_and_stem_match() {
        let doc = sectioned(&[(
            SectionLabel::Skills,
            "JavaScript, planning lessons, behaviour management",
        )]);
        let result = score(
            &doc,
            &profile(&["JS", "Lesson Planning", "Classroom Management"]),
            &SectionWeights::default(),
        );
        assert_eq!(result.coverage, 1.0);
        assert_eq!(result.matched[0].matched_as.as_deref(), Some("javascript"));
        assert_eq!(
            result.matched[0].reason,
            "JS found in Skills section (as 'javascript')"
        );
    }

    #[test]
    fn test_short_stems_do_not_create_false_hits() {
        assert_eq!(stem("going"), "going");
        assert_eq!(stem("testing"), "test");
        let doc = sectioned(&[(SectionLabel::Experience, "Ongoing projects, going remote")]);
        let result = score(&doc, &profile(&["Go"]), &SectionWeights::default());
        assert_eq!(result.missing_skills(), vec!["Go"]);
    }

    #[test]
    fn test_symbols_kept_in_tokens() {
        let doc = sectioned(&[(SectionLabel::Skills, "C++, C#")]);
        let result = score(&doc, &profile(&["C++", "C#", "C"]), &SectionWeights::default());
        assert_eq!(result.missing_skills(), vec!["C"]);
    }

    #[test]
    fn test_placeholders_never_match_skills() {
        let doc = sectioned(&[(SectionLabel::Skills, "[EMAIL] [NAME]")]);
        let result = score(&doc, &profile(&["email", "name"]), &SectionWeights::default());
        assert_eq!(result.coverage, 0.0);
    }

    #[test]
    fn test_unsectioned_document_uses_flat_weight() {
        let doc = SectionedDocument {
            sections: vec![Section {
                label: SectionLabel::Other,
                text: "I know Python.".to_string(),
            }],
            headers_found: false,
        };
        let result = score(&doc, &profile(&["Python"]), &SectionWeights::default());
        assert!((result.coverage - 0.7).abs() < 1e-9);
        assert_eq!(result.matched[0].reason, "Python found in unsectioned text");
        assert!(result.notes[0].contains("no section headers"));
    }

    #[test]
    fn test_empty_profile_scores_zero_with_note() {
        let doc = sectioned(&[(SectionLabel::Skills, "Python")]);
        let result = score(&doc, &profile(&[]), &SectionWeights::default());
        assert_eq!(result.coverage, 0.0);
        assert!(!result.has_requirements());
        assert!(result.notes.iter().any(|n| n.contains("no required skills")));
    }

    #[test]
    fn test_coverage_clamped_with_oversized_weights() {
        let weights = SectionWeights {
            skills: 2.0,
            ..SectionWeights::default()
        };
        let doc = sectioned(&[(SectionLabel::Skills, "Python")]);
        assert_eq!(score(&doc, &profile(&["Python"]), &weights).coverage, 1.0);
    }

    #[test]
    fn test_adding_skill_to_skills_section_never_lowers_coverage() {
        let skills = profile(&["Python", "SQL", "Docker", "Kubernetes"]);
        let weights = SectionWeights::default();
        let mut text = String::from("Python");
        let mut previous = score(
            &sectioned(&[(SectionLabel::Experience, "SQL, Docker"), (SectionLabel::Skills, text.as_str())]),
            &skills,
            &weights,
        )
        .coverage;
        for extra in ["SQL", "Docker", "Kubernetes", "Python"] {
            text.push_str(", ");
            text.push_str(extra);
            let next = score(
                &sectioned(&[(SectionLabel::Experience, "SQL, Docker"), (SectionLabel::Skills, text.as_str())]),
                &skills,
                &weights,
            )
            .coverage;
            assert!(next >= previous);
            previous = next;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let doc = sectioned(&[
            (SectionLabel::Experience, "Docker, Python"),
            (SectionLabel::Summary, "SQL"),
        ]);
        let p = profile(&["Python", "SQL", "Docker", "Go"]);
        let a = score(&doc, &p, &SectionWeights::default());
        let b = score(&doc, &p, &SectionWeights::default());
        assert_eq!(a, b);
        assert_eq!(a.coverage.to_bits(), b.coverage.to_bits());
    }
}
