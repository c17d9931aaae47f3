use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::{LlmSettings, Provider};
use crate::screening::decision::DecisionPolicy;
use crate::screening::skills::SectionWeights;

/// Application configuration loaded from environment variables.
/// Every value has a default; startup fails only on values that do not parse
/// or on an inconsistent decision policy.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub names_dir: PathBuf,
    pub roles_path: PathBuf,
    /// Replaces the built-in phone patterns when non-empty.
    pub phone_patterns: Vec<String>,
    pub policy: DecisionPolicy,
    pub weights: SectionWeights,
    pub batch_concurrency: usize,
    /// `None` disables the external judge.
    pub llm: Option<LlmSettings>,
    pub judge_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let skills_threshold = parse_or(&get, "SKILLS_THRESHOLD", 0.6)?;
        let hard_floor = parse_or(&get, "HARD_FLOOR", 0.3)?;
        let policy = DecisionPolicy::new(skills_threshold, hard_floor)
            .context("SKILLS_THRESHOLD / HARD_FLOOR are inconsistent")?;

        let defaults = SectionWeights::default();
        let weights = SectionWeights {
            skills: parse_or(&get, "SECTION_WEIGHT_SKILLS", defaults.skills)?,
            experience: parse_or(&get, "SECTION_WEIGHT_EXPERIENCE", defaults.experience)?,
            minor: parse_or(&get, "SECTION_WEIGHT_MINOR", defaults.minor)?,
            unsectioned: parse_or(&get, "SECTION_WEIGHT_UNSECTIONED", defaults.unsectioned)?,
        };
        for (key, value) in [
            ("SECTION_WEIGHT_SKILLS", weights.skills),
            ("SECTION_WEIGHT_EXPERIENCE", weights.experience),
            ("SECTION_WEIGHT_MINOR", weights.minor),
            ("SECTION_WEIGHT_UNSECTIONED", weights.unsectioned),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{key} must be within [0,1], got {value}");
            }
        }

        let phone_patterns = get("PHONE_PATTERNS")
            .map(|raw| {
                raw.split(";;")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let batch_concurrency: usize = parse_or(&get, "BATCH_CONCURRENCY", 4)?;
        if batch_concurrency == 0 {
            bail!("BATCH_CONCURRENCY must be at least 1");
        }

        Ok(Config {
            port: parse_or(&get, "PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            names_dir: get("NAMES_DIR").unwrap_or_else(|| "data/names".to_string()).into(),
            roles_path: get("ROLES_PATH")
                .unwrap_or_else(|| "data/roles.toml".to_string())
                .into(),
            phone_patterns,
            policy,
            weights,
            batch_concurrency,
            llm: llm_settings(&get)?,
            judge_timeout: Duration::from_secs(parse_or(&get, "JUDGE_TIMEOUT_SECS", 45)?),
        })
    }
}

fn llm_settings(get: &impl Fn(&str) -> Option<String>) -> Result<Option<LlmSettings>> {
    let api_key = get("LLM_API_KEY");
    let provider = match get("LLM_PROVIDER").map(|p| p.trim().to_ascii_lowercase()) {
        Some(p) if p == "none" || p == "off" => return Ok(None),
        Some(p) if p == "auto" => None,
        Some(p) => Some(p.parse::<Provider>().map_err(anyhow::Error::msg)?),
        None => None,
    };
    // auto: a key alone means Anthropic, a base URL alone means a local OpenAI-compatible server.
    let provider = match provider {
        Some(p) => p,
        None if api_key.is_some() => Provider::Anthropic,
        None if get("LLM_BASE_URL").is_some() => Provider::OpenAi,
        None => return Ok(None),
    };
    if provider == Provider::Anthropic && api_key.is_none() {
        bail!("LLM_PROVIDER=anthropic requires LLM_API_KEY");
    }

    Ok(Some(LlmSettings {
        provider,
        api_key,
        base_url: get("LLM_BASE_URL"),
        model: get("LLM_MODEL"),
        max_retries: parse_or(get, "JUDGE_MAX_RETRIES", 3)?,
    }))
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
