//! Shared fixtures for unit tests: a small pattern set, a role catalog and stub judges.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::anonymize::names::{Gender, NameEntry};
use crate::anonymize::PatternSet;
use crate::llm_client::LlmError;
use crate::models::role::RoleProfile;
use crate::screening::judge::{ExternalJudgeError, Judge};
use crate::screening::roles::RoleCatalog;
use crate::screening::Screener;

pub const CATALOG: &str = r#"
[[role]]
name = "Backend Developer"
sector = "technology"
skills = ["Python", "SQL", "Docker"]

[[role]]
name = "English Teacher"
sector = "education"
skills = ["English", "Lesson Planning", "Classroom Management"]
"#;

pub fn patterns() -> PatternSet {
    let entries: Vec<NameEntry> = ["Jane", "Jane Doe", "Sokha", "Chan Dara"]
        .iter()
        .map(|n| NameEntry {
            name: n.to_string(),
            region: "test".to_string(),
            gender: Gender::Unisex,
        })
        .collect();
    PatternSet::build(&entries, &[]).unwrap()
}

pub fn catalog() -> RoleCatalog {
    RoleCatalog::from_toml_str(CATALOG).unwrap()
}

pub fn screener(judge: Arc<dyn Judge>) -> Screener {
    Screener::new(patterns(), catalog(), judge).with_judge_timeout(Duration::from_secs(5))
}

/// Answers every call with the same payload.
pub struct StubJudge(Value);

impl StubJudge {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }
}

#[async_trait]
impl Judge for StubJudge {
    fn backend(&self) -> &str {
        "stub"
    }

    async fn judge(&self, _: &str, _: &RoleProfile) -> Result<Value, ExternalJudgeError> {
        Ok(self.0.clone())
    }
}

/// Sleeps before answering.
pub struct SlowJudge(pub Duration);

#[async_trait]
impl Judge for SlowJudge {
    fn backend(&self) -> &str {
        "slow"
    }

    async fn judge(&self, _: &str, _: &RoleProfile) -> Result<Value, ExternalJudgeError> {
        tokio::time::sleep(self.0).await;
        Ok(Value::Null)
    }
}

/// Counts calls as they start, then sleeps.
pub struct CountingJudge {
    pub calls: Arc<AtomicUsize>,
    pub delay: Duration,
}

#[async_trait]
impl Judge for CountingJudge {
    fn backend(&self) -> &str {
        "counting"
    }

    async fn judge(&self, _: &str, _: &RoleProfile) -> Result<Value, ExternalJudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(Value::Null)
    }
}

pub struct FailingJudge;

#[async_trait]
impl Judge for FailingJudge {
    fn backend(&self) -> &str {
        "failing"
    }

    async fn judge(&self, _: &str, _: &RoleProfile) -> Result<Value, ExternalJudgeError> {
        Err(LlmError::EmptyContent.into())
    }
}

pub struct PanickingJudge;

#[async_trait]
impl Judge for PanickingJudge {
    fn backend(&self) -> &str {
        "panicking"
    }

    async fn judge(&self, _: &str, _: &RoleProfile) -> Result<Value, ExternalJudgeError> {
        panic!("judge crashed")
    }
}
