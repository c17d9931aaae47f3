// Prompt constants for the external judge.
// Reuses cross-cutting fragments from llm_client::prompts.

use serde_json::json;

use crate::llm_client::prompts::{FAIRNESS_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::models::role::RoleProfile;

/// Resume text sent to the judge is cut to this many chars.
pub const MAX_RESUME_CHARS: usize = 12_000;

/// Opening of the judge's system prompt; see [`judge_system`].
const JUDGE_ROLE: &str = "You are a fair and consistent hiring assessor. \
    You receive an anonymized resume, a position and the skills it requires.";

/// Response contract appended to the system prompt.
const JUDGE_SCHEMA: &str = r#"Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 0.0,
  "verdict": "hire",
  "reasons": ["short, evidence-based reason"]
}
"score" is a number between 0 and 1 for how well the resume fits the position.
"verdict" is exactly "hire" or "do_not_hire".
"reasons" lists 1 to 5 short reasons grounded in the resume text."#;

pub fn judge_system() -> String {
    format!("{JUDGE_ROLE} {FAIRNESS_INSTRUCTION}\n\n{JUDGE_SCHEMA}\n\n{JSON_ONLY_SYSTEM}")
}

/// User message: a JSON object with the position, its keywords and the truncated resume.
pub fn judge_prompt(anonymized_text: &str, profile: &RoleProfile) -> String {
    let resume: String = anonymized_text.chars().take(MAX_RESUME_CHARS).collect();
    json!({
        "position": profile.name,
        "keywords": profile.skills,
        "resume": resume,
    })
    .to_string()
}
