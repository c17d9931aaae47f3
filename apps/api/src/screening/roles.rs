//! Role Resolver — maps a free-text role name onto the configured catalog.
//!
//! The catalog is a TOML file of `[[role]]` tables (name, sector, skills),
//! read once at startup. Declaration order is significant: it breaks fuzzy ties.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::role::{ProfileOrigin, RoleProfile};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read role catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed role catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("no catalog role matches '{role}'")]
pub struct UnknownRoleError {
    pub role: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    role: Vec<RoleRecord>,
}

#[derive(Debug, Deserialize)]
struct RoleRecord {
    name: String,
    #[serde(default)]
    sector: String,
    #[serde(default)]
    skills: Vec<String>,
}

/// Role entry as listed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub name: String,
    pub sector: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    profiles: Vec<RoleProfile>,
}

impl RoleCatalog {
    /// Builds a catalog, dropping later duplicates of a role name.
    pub fn new(profiles: Vec<RoleProfile>) -> Self {
        let mut seen = HashSet::new();
        let profiles = profiles
            .into_iter()
            .filter(|p| {
                let fresh = seen.insert(p.name.to_lowercase());
                if !fresh {
                    warn!("Duplicate role '{}' in catalog ignored", p.name);
                }
                fresh
            })
            .collect();
        Self { profiles }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&raw)?;
        info!(
            "Role catalog loaded: {} role(s) from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw)?;
        Ok(Self::new(
            file.role
                .into_iter()
                .map(|r| RoleProfile::new(r.name.trim(), r.sector.trim(), r.skills))
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn summaries(&self) -> Vec<RoleSummary> {
        self.profiles
            .iter()
            .map(|p| RoleSummary {
                name: p.name.clone(),
                sector: p.sector.clone(),
                skills: p.skills.clone(),
            })
            .collect()
    }

    /// Exact case-insensitive name first, then highest token overlap
    /// (Jaccard over lowercase words), earliest entry on ties.
    pub fn resolve(&self, role_name: &str) -> Result<RoleProfile, UnknownRoleError> {
        let wanted = role_name.trim();
        let unknown = || UnknownRoleError {
            role: wanted.to_string(),
        };

        if let Some(exact) = self
            .profiles
            .iter()
            .find(|p| p.name.to_lowercase() == wanted.to_lowercase())
        {
            return Ok(exact.clone().with_origin(ProfileOrigin::Catalog));
        }

        let wanted_words = words(wanted);
        let mut best: Option<(&RoleProfile, f64)> = None;
        for profile in &self.profiles {
            let overlap = jaccard(&wanted_words, &words(&profile.name));
            if overlap > best.map_or(0.0, |(_, score)| score) {
                best = Some((profile, overlap));
            }
        }

        let (profile, overlap) = best.ok_or_else(unknown)?;
        Ok(profile.clone().with_origin(ProfileOrigin::Fuzzy {
            requested: wanted.to_string(),
            overlap,
        }))
    }
}

/// Free-function form of [`RoleCatalog::resolve`].
pub fn resolve(role_name: &str, catalog: &RoleCatalog) -> Result<RoleProfile, UnknownRoleError> {
    catalog.resolve(role_name)
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
