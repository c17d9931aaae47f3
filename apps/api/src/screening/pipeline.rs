//! Screening pipeline — anonymize → segment → score → judge → combine.
//!
//! `Screener` owns the read-only pattern set and role catalog built at startup
//! and is shared behind an `Arc`. Every step except the judge call is pure;
//! an `Evaluation` is only handed out once its whole pipeline has finished.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::anonymize::{anonymize, PatternSet};
use crate::models::document::{
    AnonymizedDocument, RawDocument, RedactionCategory, RedactionEntry, SectionLabel,
};
use crate::models::role::RoleProfile;
use crate::screening::decision::{combine, CombinedDecision, Decision, DecisionPolicy};
use crate::screening::judge::{judge_with_timeout, Judge};
use crate::screening::roles::RoleCatalog;
use crate::screening::sections::segment;
use crate::screening::skills::{score, SectionWeights};

const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(45);

// ────────────────────────────────────────────────────────────────────────────
// Request / response models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ScreeningRequest {
    pub text: String,
    /// One role, or several separated by `;` or newlines.
    pub role: String,
    /// Overrides the catalog profile when non-empty.
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Outcome for one candidate role.
#[derive(Debug, Clone, Serialize)]
pub struct RoleFit {
    pub requested_role: String,
    pub profile: RoleProfile,
    pub fit: f64,
    pub decision: CombinedDecision,
}

/// Compact view of a role that was evaluated but not selected.
#[derive(Debug, Clone, Serialize)]
pub struct ConsideredRole {
    pub role: String,
    pub fit: f64,
    pub coverage: f64,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub requested_role: String,
    pub judge_backend: String,
    pub redactions: BTreeMap<RedactionCategory, usize>,
    pub ledger: Vec<RedactionEntry>,
    pub sections: Vec<SectionLabel>,
    pub best: RoleFit,
    pub considered: Vec<ConsideredRole>,
}

impl Evaluation {
    /// Envelope for a resume whose pipeline did not complete.
    pub fn failed(requested_role: &str, judge_backend: &str, reason: &str) -> Self {
        let profile = RoleProfile::unresolved(requested_role);
        let decision = CombinedDecision::pipeline_failure(&profile.name, reason);
        Self {
            id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            requested_role: requested_role.to_string(),
            judge_backend: judge_backend.to_string(),
            redactions: BTreeMap::new(),
            ledger: Vec::new(),
            sections: Vec::new(),
            best: RoleFit {
                requested_role: requested_role.to_string(),
                profile,
                fit: 0.0,
                decision,
            },
            considered: Vec::new(),
        }
    }

    pub fn decision(&self) -> &CombinedDecision {
        &self.best.decision
    }
}

/// Splits a multi-role request; blank entries and repeats are dropped.
pub fn split_roles(raw: &str) -> Vec<String> {
    let mut roles: Vec<String> = Vec::new();
    for role in raw.split(|c: char| c == ';' || c == '\n').map(str::trim).filter(|r| !r.is_empty()) {
        if !roles.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            roles.push(role.to_string());
        }
    }
    roles
}

// ────────────────────────────────────────────────────────────────────────────
// Screener
// ────────────────────────────────────────────────────────────────────────────

pub struct Screener {
    patterns: PatternSet,
    catalog: RoleCatalog,
    judge: Arc<dyn Judge>,
    policy: DecisionPolicy,
    weights: SectionWeights,
    judge_timeout: Duration,
}

impl Screener {
    pub fn new(patterns: PatternSet, catalog: RoleCatalog, judge: Arc<dyn Judge>) -> Self {
        Self {
            patterns,
            catalog,
            judge,
            policy: DecisionPolicy::default(),
            weights: SectionWeights::default(),
            judge_timeout: DEFAULT_JUDGE_TIMEOUT,
        }
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_weights(mut self, weights: SectionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_judge_timeout(mut self, timeout: Duration) -> Self {
        self.judge_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    pub fn judge_backend(&self) -> &str {
        self.judge.backend()
    }

    pub fn redact(&self, text: &str) -> AnonymizedDocument {
        anonymize(&RawDocument::new(text), &self.patterns)
    }

    /// Caller skills win; otherwise the catalog; otherwise an empty profile.
    pub fn profile_for(&self, role: &str, skills: &[String]) -> RoleProfile {
        if skills.iter().any(|s| !s.trim().is_empty()) {
            return RoleProfile::caller_supplied(role, skills.iter().cloned());
        }
        match self.catalog.resolve(role) {
            Ok(profile) => profile,
            Err(err) => {
                warn!("{err}; continuing with an empty skill profile");
                RoleProfile::unresolved(role)
            }
        }
    }

    /// Screens one resume against every requested role and reports the best fit.
    pub async fn evaluate(&self, request: &ScreeningRequest) -> Evaluation {
        let anonymized = self.redact(&request.text);
        let sectioned = segment(&anonymized);

        let mut roles = split_roles(&request.role);
        if roles.is_empty() {
            roles.push(request.role.trim().to_string());
        }

        let mut fits: Vec<RoleFit> = Vec::with_capacity(roles.len());
        for role in roles {
            let profile = self.profile_for(&role, &request.skills);

            let mut skills = score(&sectioned, &profile, &self.weights);
            if let Some(note) = profile.origin.note(&profile.name) {
                skills.notes.insert(0, note);
            }

            let signal =
                judge_with_timeout(self.judge.as_ref(), &anonymized.text, &profile, self.judge_timeout)
                    .await;
            let decision = combine(&skills, &signal, &self.policy);
            fits.push(RoleFit {
                requested_role: role,
                profile,
                fit: decision.fit(),
                decision,
            });
        }

        // Highest fit wins; the earlier role keeps a tie.
        let mut best_index = 0;
        for (i, candidate) in fits.iter().enumerate().skip(1) {
            if candidate.fit > fits[best_index].fit {
                best_index = i;
            }
        }
        let best = fits.remove(best_index);
        let considered = fits
            .into_iter()
            .map(|f| ConsideredRole {
                role: f.profile.name,
                fit: f.fit,
                coverage: f.decision.coverage,
                decision: f.decision.decision,
            })
            .collect();

        let evaluation = Evaluation {
            id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            requested_role: request.role.trim().to_string(),
            judge_backend: self.judge.backend().to_string(),
            redactions: anonymized.summary(),
            ledger: anonymized.ledger,
            sections: sectioned.labels(),
            best,
            considered,
        };

        info!(
            "Evaluation {}: role '{}' → {} ({}), coverage {:.2}, {} redaction(s)",
            evaluation.id,
            evaluation.best.profile.name,
            evaluation.best.decision.decision,
            evaluation.best.decision.signal,
            evaluation.best.decision.coverage,
            evaluation.ledger.len()
        );
        evaluation
    }

    /// One task per resume, at most `concurrency` running at once.
    /// Results come back in input order; a task that dies yields `needs_review`.
    pub async fn evaluate_batch(
        self: &Arc<Self>,
        requests: Vec<ScreeningRequest>,
        concurrency: usize,
    ) -> Vec<Evaluation> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut roles = Vec::with_capacity(requests.len());
        let mut tasks = AbortOnDrop(Vec::with_capacity(requests.len()));

        for request in requests {
            let screener = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let role = request.role.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                screener.evaluate(&request).await
            });
            roles.push(role);
            tasks.0.push(handle);
        }

        let mut results = Vec::with_capacity(roles.len());
        for (index, (role, handle)) in roles.iter().zip(tasks.0.iter_mut()).enumerate() {
            match handle.await {
                Ok(evaluation) => results.push(evaluation),
                Err(err) => {
                    error!("Batch item {index} failed: {err}");
                    results.push(Evaluation::failed(
                        role.trim(),
                        self.judge_backend(),
                        &err.to_string(),
                    ));
                }
            }
        }
        results
    }
}

/// Aborts every task still running when dropped, so a cancelled batch stops
/// calling the judge.
struct AbortOnDrop<T>(Vec<JoinHandle<T>>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}
