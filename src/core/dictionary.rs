//! Table of known providers used to turn bare slugs and URLs into canonical names.
//!
//! The source is a YAML mapping of canonical slug to entry. Entries keep the
//! order of the file: alias and pattern lookups scan in that order and the
//! first hit wins, so overlapping patterns are resolved by curating the file.

use crate::core::url_classifier;
use crate::utils::error::{InventoryError, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

static BUNDLED: LazyLock<Arc<Dictionary>> = LazyLock::new(|| {
    let dictionary = Dictionary::from_yaml_str(include_str!("../../data/dictionary.yml"))
        .unwrap_or_else(|e| {
            tracing::warn!("Bundled provider dictionary could not be parsed: {}", e);
            Dictionary::empty()
        });
    Arc::new(dictionary)
});

#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    pub key: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub url: Option<String>,
    pub url_pattern: Option<String>,
    pub image_url: Option<String>,
    /// Any other metadata the entry carries.
    pub properties: Map<String, Value>,
    pattern: Option<Regex>,
}

impl DictionaryEntry {
    pub fn matches_url(&self, normalized_url: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(normalized_url))
    }

    fn has_alias(&self, slug: &str) -> bool {
        self.aliases.iter().any(|alias| alias == slug)
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawEntry {
    name: Option<String>,
    aliases: Option<RawAliases>,
    url: Option<String>,
    url_pattern: Option<String>,
    image_url: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAliases {
    Csv(String),
    List(Vec<String>),
}

impl RawAliases {
    fn into_slugs(self) -> Vec<String> {
        let items = match self {
            RawAliases::Csv(csv) => csv.split(',').map(str::to_string).collect(),
            RawAliases::List(list) => list,
        };
        items
            .iter()
            .map(|alias| normalize_slug(alias))
            .filter(|alias| !alias.is_empty())
            .collect()
    }
}

fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
    by_key: HashMap<String, usize>,
}

impl Dictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Shared copy of the provider table shipped with the crate, parsed on first use.
    pub fn bundled() -> &'static Dictionary {
        &BUNDLED
    }

    /// Handle to the bundled table for owners that keep an `Arc`.
    pub fn bundled_shared() -> Arc<Dictionary> {
        Arc::clone(&BUNDLED)
    }

    /// Reads a dictionary file, degrading to an empty table when it is missing or unreadable.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Error loading dictionary {}: {}", path.display(), e);
                Self::empty()
            }),
            Err(e) => {
                tracing::warn!("Dictionary {} not readable: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(content)?;
        Self::from_value(document)
    }

    pub fn from_value(document: Value) -> Result<Self> {
        let table = match document {
            Value::Object(table) => table,
            Value::Null => Map::new(),
            other => {
                return Err(InventoryError::ProcessingError {
                    message: format!("dictionary must be a mapping, got {}", kind_of(&other)),
                })
            }
        };

        let mut dictionary = Self::empty();
        for (key, raw) in table {
            let raw: RawEntry = match raw {
                Value::Null => RawEntry::default(),
                value => match serde_json::from_value(value) {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!("Skipping dictionary entry '{}': {}", key, e);
                        continue;
                    }
                },
            };
            dictionary.insert(key, raw);
        }

        tracing::debug!("Loaded {} dictionary entries", dictionary.len());
        Ok(dictionary)
    }

    fn insert(&mut self, key: String, raw: RawEntry) {
        let slug = normalize_slug(&key);
        if slug.is_empty() || self.by_key.contains_key(&slug) {
            tracing::warn!("Skipping empty or duplicate dictionary key '{}'", key);
            return;
        }

        let pattern = raw.url_pattern.as_deref().and_then(|source| {
            RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .map_err(|e| tracing::warn!("Invalid url_pattern for '{}': {}", key, e))
                .ok()
        });

        let entry = DictionaryEntry {
            name: raw
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| key.clone()),
            key,
            aliases: raw.aliases.map(RawAliases::into_slugs).unwrap_or_default(),
            url: raw.url,
            url_pattern: raw.url_pattern,
            image_url: raw.image_url,
            properties: raw.extra,
            pattern,
        };

        self.by_key.insert(slug, self.entries.len());
        self.entries.push(entry);
    }

    /// Finds an entry by canonical slug, then by alias.
    pub fn lookup(&self, slug: &str) -> Option<&DictionaryEntry> {
        let slug = normalize_slug(slug);
        if slug.is_empty() {
            return None;
        }

        if let Some(&index) = self.by_key.get(&slug) {
            return self.entries.get(index);
        }

        self.entries.iter().find(|entry| entry.has_alias(&slug))
    }

    /// Like [`Dictionary::lookup`] for decoded values; non-strings never match.
    pub fn lookup_value(&self, value: &Value) -> Option<&DictionaryEntry> {
        value.as_str().and_then(|slug| self.lookup(slug))
    }

    /// First entry, in load order, whose pattern matches the normalized `url`.
    pub fn match_url(&self, url: &str) -> Option<&DictionaryEntry> {
        let normalized = url_classifier::normalize(url)?;
        self.entries
            .iter()
            .find(|entry| entry.matches_url(&normalized))
    }

    pub fn entries(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
