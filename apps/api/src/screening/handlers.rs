use std::collections::BTreeMap;

use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extract::extract;
use crate::models::document::{RawDocument, RedactionCategory, RedactionEntry, Section};
use crate::screening::decision::Decision;
use crate::screening::pipeline::{Evaluation, ScreeningRequest};
use crate::screening::roles::RoleSummary;
use crate::screening::sections::segment;
use crate::state::AppState;

/// Upper bound on resumes per batch request.
pub const MAX_BATCH_ITEMS: usize = 100;

#[derive(Serialize)]
pub struct RolesResponse {
    pub roles: Vec<RoleSummary>,
    pub judge_backend: String,
}

#[derive(Deserialize)]
pub struct AnonymizeRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct AnonymizeResponse {
    pub text: String,
    pub redactions: BTreeMap<RedactionCategory, usize>,
    pub ledger: Vec<RedactionEntry>,
    pub sections: Vec<Section>,
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub items: Vec<ScreeningRequest>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub total: usize,
    pub decisions: BTreeMap<String, usize>,
    pub results: Vec<Evaluation>,
}

fn validate(req: &ScreeningRequest) -> Result<(), AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    if req.role.trim().is_empty() && req.skills.iter().all(|s| s.trim().is_empty()) {
        return Err(AppError::Validation(
            "role is required unless skills are supplied".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/v1/roles
pub async fn handle_list_roles(State(state): State<AppState>) -> Json<RolesResponse> {
    Json(RolesResponse {
        roles: state.screener.catalog().summaries(),
        judge_backend: state.screener.judge_backend().to_string(),
    })
}

/// POST /api/v1/anonymize
pub async fn handle_anonymize(
    State(state): State<AppState>,
    Json(req): Json<AnonymizeRequest>,
) -> Result<Json<AnonymizeResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    let anonymized = state.screener.redact(&req.text);
    let sections = segment(&anonymized).sections;
    Ok(Json(AnonymizeResponse {
        redactions: anonymized.summary(),
        text: anonymized.text,
        ledger: anonymized.ledger,
        sections,
    }))
}

/// POST /api/v1/screen
pub async fn handle_screen(
    State(state): State<AppState>,
    Json(req): Json<ScreeningRequest>,
) -> Result<Json<Evaluation>, AppError> {
    validate(&req)?;
    Ok(Json(state.screener.evaluate(&req).await))
}

/// POST /api/v1/screen/batch
pub async fn handle_screen_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    if req.items.is_empty() {
        return Err(AppError::Validation("items must not be empty".to_string()));
    }
    if req.items.len() > MAX_BATCH_ITEMS {
        return Err(AppError::Validation(format!(
            "at most {MAX_BATCH_ITEMS} items per batch, got {}",
            req.items.len()
        )));
    }
    for (i, item) in req.items.iter().enumerate() {
        validate(item).map_err(|e| AppError::Validation(format!("item {i}: {e}")))?;
    }

    let results = state
        .screener
        .evaluate_batch(req.items, state.config.batch_concurrency)
        .await;

    let mut decisions = BTreeMap::new();
    for decision in [Decision::Hire, Decision::DoNotHire, Decision::NeedsReview] {
        decisions.insert(decision.to_string(), 0);
    }
    for evaluation in &results {
        *decisions
            .entry(evaluation.decision().decision.to_string())
            .or_insert(0) += 1;
    }
    info!("Batch screened: {} resume(s), {:?}", results.len(), decisions);

    Ok(Json(BatchResponse {
        total: results.len(),
        decisions,
        results,
    }))
}

/// Runs extraction on the blocking pool; pdf parsing is CPU-bound.
/// A crashed extraction task is an internal error, a bad file is a 422.
async fn extract_upload(file_name: String, bytes: Vec<u8>) -> Result<RawDocument, AppError> {
    let raw = tokio::task::spawn_blocking(move || extract(&file_name, &bytes))
        .await
        .context("extraction task failed")??;
    Ok(raw)
}

/// POST /api/v1/screen/upload
/// Multipart fields: `file` (pdf/txt/md), `role`, optional `skills` (comma or newline separated).
pub async fn handle_screen_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Evaluation>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut role = String::new();
    let mut skills = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                file = Some((name, bytes.to_vec()));
            }
            Some("role") => role = field.text().await?,
            Some("skills") => {
                skills = field
                    .text()
                    .await?
                    .split(|c: char| c == ',' || c == '\n')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;

    let raw = extract_upload(file_name, bytes).await?;

    let req = ScreeningRequest {
        text: raw.text,
        role,
        skills,
    };
    validate(&req)?;
    Ok(Json(state.screener.evaluate(&req).await))
}
