use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Hire,
    DoNotHire,
}

impl Verdict {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hire" => Some(Verdict::Hire),
            "do_not_hire" => Some(Verdict::DoNotHire),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Hire => f.write_str("hire"),
            Verdict::DoNotHire => f.write_str("do_not_hire"),
        }
    }
}

/// A judge response that passed schema and range checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalVerdict {
    pub score: f64,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("judge payload is not a JSON object")]
    NotAnObject,

    #[error("judge score is missing or not numeric")]
    ScoreNotNumeric,

    #[error("judge score {0} outside [0,1]")]
    ScoreOutOfRange(f64),

    #[error("judge verdict {0:?} is not one of hire/do_not_hire")]
    UnknownVerdict(String),

    #[error("judge reasons must be a list of strings")]
    MalformedReasons,
}

impl ExternalVerdict {
    /// Validates an untrusted judge payload.
    pub fn validate(payload: &Value) -> Result<Self, ValidationError> {
        let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;

        let score = object
            .get("score")
            .and_then(Value::as_f64)
            .ok_or(ValidationError::ScoreNotNumeric)?;
        if !(0.0..=1.0).contains(&score) {
            return Err(ValidationError::ScoreOutOfRange(score));
        }

        let verdict = match object.get("verdict") {
            Some(Value::String(raw)) => {
                Verdict::parse(raw).ok_or_else(|| ValidationError::UnknownVerdict(raw.clone()))?
            }
            Some(other) => return Err(ValidationError::UnknownVerdict(other.to_string())),
            None => return Err(ValidationError::UnknownVerdict(String::new())),
        };

        let reasons = object
            .get("reasons")
            .and_then(Value::as_array)
            .ok_or(ValidationError::MalformedReasons)?
            .iter()
            .map(|r| r.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or(ValidationError::MalformedReasons)?;

        Ok(Self {
            score,
            verdict,
            reasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_payload() {
        let v = ExternalVerdict::validate(&json!({
            "score": 0.82,
            "verdict": "hire",
            "reasons": ["Strong SQL experience"]
        }))
        .unwrap();
        assert_eq!(v.verdict, Verdict::Hire);
        assert!((v.score - 0.82).abs() < f64::EPSILON);
        assert_eq!(v.reasons.len(), 1);
    }

    #[test]
    fn test_verdict_is_trimmed_and_case_insensitive() {
        let v = ExternalVerdict::validate(&json!({
            "score": 0,
            "verdict": " DO_NOT_HIRE ",
            "reasons": []
        }))
        .unwrap();
        assert_eq!(v.verdict, Verdict::DoNotHire);
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let err = ExternalVerdict::validate(&json!({
            "score": 1.4, "verdict": "hire", "reasons": []
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::ScoreOutOfRange(1.4));
    }

    #[test]
    fn test_string_score_rejected() {
        let err = ExternalVerdict::validate(&json!({
            "score": "0.9", "verdict": "hire", "reasons": []
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::ScoreNotNumeric);
    }

    #[test]
    fn test_unknown_verdict_rejected() {
        let err = ExternalVerdict::validate(&json!({
            "score": 0.5, "verdict": "maybe", "reasons": []
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownVerdict(v) if v == "maybe"));
    }

    #[test]
    fn test_reasons_must_be_strings() {
        let err = ExternalVerdict::validate(&json!({
            "score": 0.5, "verdict": "hire", "reasons": [1, 2]
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::MalformedReasons);

        let err = ExternalVerdict::validate(&json!({"score": 0.5, "verdict": "hire"}))
            .unwrap_err();
        assert_eq!(err, ValidationError::MalformedReasons);
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(
            ExternalVerdict::validate(&json!([1, 2, 3])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }
}
