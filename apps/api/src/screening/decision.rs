//! Decision Combiner — merges the skills score with the external judge signal.
//!
//! Two thresholds drive the outcome. Without a usable judge verdict the
//! decision is skills-only against `skills_threshold`. With one, the verdict
//! is forwarded unless coverage is below `hard_floor`, which forces a
//! rejection the judge cannot override.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::verdict::{ExternalVerdict, Verdict};
use crate::screening::skills::ScoreResult;

// ────────────────────────────────────────────────────────────────────────────
// Policy
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("{name} must be within [0,1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("hard floor {floor} must be below skills threshold {threshold}")]
    FloorNotBelowThreshold { floor: f64, threshold: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    skills_threshold: f64,
    hard_floor: f64,
}

impl DecisionPolicy {
    /// Enforces `0 <= hard_floor < skills_threshold <= 1`.
    pub fn new(skills_threshold: f64, hard_floor: f64) -> Result<Self, PolicyError> {
        for (name, value) in [("skills threshold", skills_threshold), ("hard floor", hard_floor)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::OutOfRange { name, value });
            }
        }
        if hard_floor >= skills_threshold {
            return Err(PolicyError::FloorNotBelowThreshold {
                floor: hard_floor,
                threshold: skills_threshold,
            });
        }
        Ok(Self {
            skills_threshold,
            hard_floor,
        })
    }

    pub fn skills_threshold(&self) -> f64 {
        self.skills_threshold
    }

    pub fn hard_floor(&self) -> f64 {
        self.hard_floor
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            skills_threshold: 0.6,
            hard_floor: 0.3,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Signals and outcomes
// ────────────────────────────────────────────────────────────────────────────

/// What came back from the judge boundary, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeSignal {
    /// Unreachable, timed out, disabled or failed in transport.
    Absent { reason: String },
    /// Raw, untrusted payload.
    Received(Value),
}

impl JudgeSignal {
    pub fn absent(reason: impl Into<String>) -> Self {
        JudgeSignal::Absent {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Hire,
    DoNotHire,
    NeedsReview,
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Hire => Decision::Hire,
            Verdict::DoNotHire => Decision::DoNotHire,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Hire => f.write_str("hire"),
            Decision::DoNotHire => f.write_str("do_not_hire"),
            Decision::NeedsReview => f.write_str("needs_review"),
        }
    }
}

/// The rule that produced the final decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    SkillsOnlyFallback,
    ValidationFailure,
    HardFloorGuardrail,
    JudgeVerdict,
    NoSkillProfile,
    PipelineFailure,
}

impl DecisionRule {
    pub fn signal(self) -> &'static str {
        match self {
            DecisionRule::SkillsOnlyFallback => "skills-only fallback",
            DecisionRule::ValidationFailure => "validation-failure; skills-only fallback",
            DecisionRule::HardFloorGuardrail => "hard-floor guardrail",
            DecisionRule::JudgeVerdict => "judge verdict",
            DecisionRule::NoSkillProfile => "no skill profile; needs review",
            DecisionRule::PipelineFailure => "pipeline failure; needs review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedDecision {
    pub decision: Decision,
    pub rule: DecisionRule,
    pub signal: String,
    pub coverage: f64,
    pub skills: ScoreResult,
    /// Present only when the judge payload passed validation.
    pub judge: Option<ExternalVerdict>,
    /// Every degraded path taken, in the order it was observed.
    pub notes: Vec<String>,
}

impl CombinedDecision {
    pub fn needs_review(&self) -> bool {
        self.decision == Decision::NeedsReview
    }

    /// Equal blend of coverage and judge score; coverage alone without a valid verdict.
    pub fn fit(&self) -> f64 {
        match &self.judge {
            Some(judge) => 0.5 * self.coverage + 0.5 * judge.score,
            None => self.coverage,
        }
    }

    /// Outcome for a resume whose pipeline did not complete.
    pub fn pipeline_failure(role: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let rule = DecisionRule::PipelineFailure;
        Self {
            decision: Decision::NeedsReview,
            rule,
            signal: rule.signal().to_string(),
            coverage: 0.0,
            skills: ScoreResult {
                role: role.to_string(),
                coverage: 0.0,
                required: 0,
                matched: Vec::new(),
                missing: Vec::new(),
                contributions: Default::default(),
                reasons: Vec::new(),
                notes: Vec::new(),
            },
            judge: None,
            notes: vec![format!("pipeline failure: {reason}")],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Combination
// ────────────────────────────────────────────────────────────────────────────

pub fn combine(skills: &ScoreResult, signal: &JudgeSignal, policy: &DecisionPolicy) -> CombinedDecision {
    let coverage = skills.coverage;
    let mut notes = skills.notes.clone();

    let judge = match signal {
        JudgeSignal::Absent { reason } => {
            notes.push(format!("skills-only fallback: judge unavailable ({reason})"));
            Err(DecisionRule::SkillsOnlyFallback)
        }
        JudgeSignal::Received(payload) => match ExternalVerdict::validate(payload) {
            Ok(verdict) => Ok(verdict),
            Err(err) => {
                notes.push(format!("validation-failure: {err}"));
                Err(DecisionRule::ValidationFailure)
            }
        },
    };

    let (decision, rule) = if !skills.has_requirements() {
        notes.push("no required skills to score against; routed to manual review".to_string());
        (Decision::NeedsReview, DecisionRule::NoSkillProfile)
    } else {
        match &judge {
            Err(fallback) => {
                let decision = if coverage >= policy.skills_threshold {
                    Decision::Hire
                } else {
                    Decision::DoNotHire
                };
                notes.push(format!(
                    "coverage {coverage:.2} against skills threshold {:.2}",
                    policy.skills_threshold
                ));
                (decision, *fallback)
            }
            Ok(verdict) if coverage < policy.hard_floor => {
                notes.push(format!(
                    "coverage {coverage:.2} below hard floor {:.2}; judge verdict '{}' overridden",
                    policy.hard_floor, verdict.verdict
                ));
                (Decision::DoNotHire, DecisionRule::HardFloorGuardrail)
            }
            Ok(verdict) => {
                notes.push(format!(
                    "judge verdict '{}' (score {:.2}) with skills coverage {coverage:.2}",
                    verdict.verdict, verdict.score
                ));
                (verdict.verdict.into(), DecisionRule::JudgeVerdict)
            }
        }
    };

    CombinedDecision {
        decision,
        rule,
        signal: rule.signal().to_string(),
        coverage,
        skills: skills.clone(),
        judge: judge.ok(),
        notes,
    }
}
