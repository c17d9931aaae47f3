//! External judge — pluggable, trait-based source of the second decision signal.
//!
//! `Screener` holds an `Arc<dyn Judge>`, chosen at startup from config:
//! `LlmJudge` when a provider is configured, `DisabledJudge` otherwise.
//! Whatever happens at this boundary, the core only sees a `JudgeSignal`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{LlmClient, LlmError};
use crate::models::role::RoleProfile;
use crate::screening::decision::JudgeSignal;
use crate::screening::prompts::{judge_prompt, judge_system};

#[derive(Debug, Error)]
pub enum ExternalJudgeError {
    #[error("judge disabled")]
    Disabled,

    #[error("judge timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("judge transport failed: {0}")]
    Transport(#[from] LlmError),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Returns the raw, unvalidated payload; validation happens in `combine`.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Short backend name, reported with every evaluation.
    fn backend(&self) -> &str;

    async fn judge(&self, anonymized_text: &str, profile: &RoleProfile)
        -> Result<Value, ExternalJudgeError>;
}

/// Runs the judge under a hard timeout and folds every failure into an absent signal.
pub async fn judge_with_timeout(
    judge: &dyn Judge,
    anonymized_text: &str,
    profile: &RoleProfile,
    limit: Duration,
) -> JudgeSignal {
    let outcome = match tokio::time::timeout(limit, judge.judge(anonymized_text, profile)).await {
        Ok(result) => result,
        Err(_) => Err(ExternalJudgeError::Timeout(limit)),
    };

    match outcome {
        Ok(payload) => {
            debug!("Judge '{}' answered for role '{}'", judge.backend(), profile.name);
            JudgeSignal::Received(payload)
        }
        Err(ExternalJudgeError::Disabled) => JudgeSignal::absent("judge disabled"),
        Err(err) => {
            warn!("Judge '{}' unavailable: {err}", judge.backend());
            JudgeSignal::absent(err.to_string())
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmJudge
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmJudge {
    llm: LlmClient,
    backend: String,
}

impl LlmJudge {
    pub fn new(llm: LlmClient) -> Self {
        let backend = format!("{}:{}", llm.provider(), llm.model());
        Self { llm, backend }
    }
}

#[async_trait]
impl Judge for LlmJudge {
    fn backend(&self) -> &str {
        &self.backend
    }

    async fn judge(
        &self,
        anonymized_text: &str,
        profile: &RoleProfile,
    ) -> Result<Value, ExternalJudgeError> {
        let prompt = judge_prompt(anonymized_text, profile);
        let payload = self.llm.call_json::<Value>(&prompt, &judge_system()).await?;
        Ok(payload)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DisabledJudge
// ────────────────────────────────────────────────────────────────────────────

/// Used when no provider is configured; every evaluation is skills-only.
pub struct DisabledJudge;

#[async_trait]
impl Judge for DisabledJudge {
    fn backend(&self) -> &str {
        "disabled"
    }

    async fn judge(&self, _: &str, _: &RoleProfile) -> Result<Value, ExternalJudgeError> {
        Err(ExternalJudgeError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingJudge, SlowJudge, StubJudge};
    use serde_json::json;

    fn profile() -> RoleProfile {
        RoleProfile::new("Data Analyst", "technology", ["SQL"])
    }

    #[tokio::test]
    async fn test_payload_passed_through_unvalidated() {
        let judge = StubJudge::new(json!({"score": 7, "verdict": "maybe"}));
        let signal = judge_with_timeout(&judge, "text", &profile(), Duration::from_secs(1)).await;
        assert_eq!(
            signal,
            JudgeSignal::Received(json!({"score": 7, "verdict": "maybe"}))
        );
    }

    #[tokio::test]
    async fn test_disabled_judge_is_absent() {
        let signal =
            judge_with_timeout(&DisabledJudge, "text", &profile(), Duration::from_secs(1)).await;
        assert_eq!(signal, JudgeSignal::absent("judge disabled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_judge_times_out() {
        let judge = SlowJudge(Duration::from_secs(60));
        let signal = judge_with_timeout(&judge, "text", &profile(), Duration::from_secs(2)).await;
        assert_eq!(signal, JudgeSignal::absent("judge timed out after 2s"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_absent() {
        let signal =
            judge_with_timeout(&FailingJudge, "text", &profile(), Duration::from_secs(1)).await;
        match signal {
            JudgeSignal::Absent { reason } => assert!(reason.contains("transport")),
            other => panic!("expected absent signal, got {other:?}"),
        }
    }
}
