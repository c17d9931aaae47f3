//! Regional name lists and the token index used to match them.
//!
//! Lists live in a directory as `<region>_<gender>.json`, each a JSON array of
//! strings. Files are independent: one malformed file is skipped with a warning
//! and the rest still load.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::document::RedactionCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Unisex,
    Unspecified,
}

impl Gender {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "female" | "f" => Some(Gender::Female),
            "male" | "m" => Some(Gender::Male),
            "unisex" | "any" => Some(Gender::Unisex),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameEntry {
    pub name: String,
    pub region: String,
    pub gender: Gender,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed name list {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Outcome of loading a name directory: everything usable plus what was skipped.
#[derive(Debug, Default)]
pub struct NameLoad {
    pub entries: Vec<NameEntry>,
    pub errors: Vec<LoadError>,
}

/// Loads every `*.json` list under `dir`, in file-name order.
pub fn load_name_lists(dir: &Path) -> NameLoad {
    let mut load = NameLoad::default();

    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(source) => {
            let err = LoadError::Io {
                path: dir.to_path_buf(),
                source,
            };
            warn!("Skipping name directory: {err}");
            load.errors.push(err);
            return load;
        }
    };

    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    for path in paths {
        match load_name_file(&path) {
            Ok(entries) => {
                debug!("Loaded {} names from {}", entries.len(), path.display());
                load.entries.extend(entries);
            }
            Err(err) => {
                warn!("Skipping name list: {err}");
                load.errors.push(err);
            }
        }
    }

    load
}

fn load_name_file(path: &Path) -> Result<Vec<NameEntry>, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let names: Vec<String> = serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let (region, gender) = source_tags(stem);

    Ok(names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .map(|name| NameEntry {
            name,
            region: region.clone(),
            gender,
        })
        .collect())
}

/// `sea_female` -> ("sea", Female). Unknown suffixes keep the whole stem as region.
fn source_tags(stem: &str) -> (String, Gender) {
    if let Some((region, suffix)) = stem.rsplit_once('_') {
        if let Some(gender) = Gender::parse(suffix) {
            return (region.to_lowercase(), gender);
        }
    }
    (stem.to_lowercase(), Gender::Unspecified)
}

// ────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ────────────────────────────────────────────────────────────────────────────

/// A word in the source text. Byte offsets; `norm` is lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub norm: String,
    /// Redaction placeholders are opaque and never match anything.
    pub placeholder: bool,
}

fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}')
}

/// Splits text into alphanumeric words. An apostrophe between two
/// alphanumerics stays inside the word (`O'Brien`) unless it opens a trailing
/// possessive `'s`, which is dropped (`Jane's` -> `jane`); hyphens split.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut iter = text.char_indices().peekable();

    while let Some((start, ch)) = iter.next() {
        if ch == '[' {
            let placeholder = RedactionCategory::ALL
                .iter()
                .map(|c| c.placeholder())
                .find(|p| text[start..].starts_with(p));
            if let Some(p) = placeholder {
                let end = start + p.len();
                while iter.next_if(|&(i, _)| i < end).is_some() {}
                tokens.push(Token {
                    start,
                    end,
                    norm: String::new(),
                    placeholder: true,
                });
            }
            continue;
        }
        if !ch.is_alphanumeric() {
            continue;
        }

        let mut end = start + ch.len_utf8();
        while let Some(&(i, c)) = iter.peek() {
            if c.is_alphanumeric() {
                end = i + c.len_utf8();
                iter.next();
            } else if is_joiner(c)
                && text[i + c.len_utf8()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_alphanumeric)
            {
                iter.next();
            } else {
                break;
            }
        }

        let end = start + strip_possessive(&text[start..end]).len();
        tokens.push(Token {
            start,
            end,
            norm: normalize_token(&text[start..end]),
            placeholder: false,
        });
    }

    tokens
}

fn strip_possessive(word: &str) -> &str {
    for suffix in ["'s", "'S", "\u{2019}s", "\u{2019}S"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if !stem.is_empty() {
                return stem;
            }
        }
    }
    word
}

fn normalize_token(raw: &str) -> String {
    raw.to_lowercase().replace('\u{2019}', "'")
}

/// Words of one phrase may be separated by spaces on the same line or a single hyphen.
fn is_word_gap(gap: &str) -> bool {
    gap == "-" || (!gap.is_empty() && gap.chars().all(|c| c.is_whitespace() && c != '\n'))
}

// ────────────────────────────────────────────────────────────────────────────
// Token index
// ────────────────────────────────────────────────────────────────────────────

/// Multi-word phrase index keyed by the normalized first token.
///
/// Matching walks the token stream once; at each position only the phrases
/// sharing that first token are checked, longest first.
#[derive(Debug, Default, Clone)]
pub struct TokenIndex {
    by_first: HashMap<String, Vec<Vec<String>>>,
    phrases: usize,
}

impl TokenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_phrases<'a>(phrases: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::new();
        for phrase in phrases {
            index.insert(phrase);
        }
        index
    }

    /// Returns false when the phrase has no tokens or is already present.
    pub fn insert(&mut self, phrase: &str) -> bool {
        let mut words: Vec<String> = tokenize(phrase)
            .into_iter()
            .filter(|t| !t.placeholder)
            .map(|t| t.norm)
            .collect();
        if words.is_empty() {
            return false;
        }
        let first = words.remove(0);
        let tails = self.by_first.entry(first).or_default();
        if tails.contains(&words) {
            return false;
        }
        tails.push(words);
        tails.sort_by_key(|tail| Reverse(tail.len()));
        self.phrases += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.phrases
    }

    pub fn is_empty(&self) -> bool {
        self.phrases == 0
    }

    /// Byte spans of whole-token matches, left to right, non-overlapping.
    /// Tokens for which `blocked(start, end)` holds are never part of a match.
    pub fn find_spans(
        &self,
        text: &str,
        tokens: &[Token],
        blocked: impl Fn(usize, usize) -> bool,
    ) -> Vec<(usize, usize)> {
        let usable = |t: &Token| !t.placeholder && !blocked(t.start, t.end);
        let mut spans = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let head = &tokens[i];
            let tails = match self.by_first.get(&head.norm) {
                Some(tails) if usable(head) => tails,
                _ => {
                    i += 1;
                    continue;
                }
            };

            let matched = tails.iter().find(|tail| {
                tail.iter().enumerate().all(|(offset, word)| {
                    let Some(tok) = tokens.get(i + offset + 1) else {
                        return false;
                    };
                    let prev = &tokens[i + offset];
                    usable(tok)
                        && tok.norm == *word
                        && is_word_gap(&text[prev.end..tok.start])
                })
            });

            match matched {
                Some(tail) => {
                    let last = &tokens[i + tail.len()];
                    spans.push((head.start, last.end));
                    i += tail.len() + 1;
                }
                None => i += 1,
            }
        }

        spans
    }
}
