use serde::{Deserialize, Serialize};

/// How a profile was obtained for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileOrigin {
    Catalog,
    Fuzzy { requested: String, overlap: f64 },
    CallerSupplied,
    Unresolved { requested: String },
}

impl ProfileOrigin {
    /// Annotation for degraded or indirect resolutions; `None` for an exact catalog hit.
    pub fn note(&self, canonical: &str) -> Option<String> {
        match self {
            ProfileOrigin::Catalog => None,
            ProfileOrigin::Fuzzy { requested, overlap } => Some(format!(
                "role '{requested}' resolved to '{canonical}' by token overlap ({overlap:.2})"
            )),
            ProfileOrigin::CallerSupplied => {
                Some("skills supplied by caller; catalog profile not used".to_string())
            }
            ProfileOrigin::Unresolved { requested } => Some(format!(
                "role '{requested}' not found in catalog and no skills supplied"
            )),
        }
    }
}

/// Canonical role with its ordered, deduplicated skill phrases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub name: String,
    pub sector: String,
    pub skills: Vec<String>,
    pub origin: ProfileOrigin,
}

impl RoleProfile {
    pub fn new(
        name: impl Into<String>,
        sector: impl Into<String>,
        skills: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            sector: sector.into(),
            skills: dedup_skills(skills),
            origin: ProfileOrigin::Catalog,
        }
    }

    /// Profile built from an explicit skill list, used when the caller overrides the catalog.
    pub fn caller_supplied(
        role: &str,
        skills: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: role.trim().to_string(),
            sector: String::new(),
            skills: dedup_skills(skills),
            origin: ProfileOrigin::CallerSupplied,
        }
    }

    pub fn unresolved(role: &str) -> Self {
        Self {
            name: role.trim().to_string(),
            sector: String::new(),
            skills: Vec::new(),
            origin: ProfileOrigin::Unresolved {
                requested: role.trim().to_string(),
            },
        }
    }

    pub fn with_origin(mut self, origin: ProfileOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// Trims, drops empties and removes case-insensitive duplicates, keeping first occurrence.
fn dedup_skills(skills: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(Into::into)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}
