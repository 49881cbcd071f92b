//! Turns loosely shaped inventory fragments into [`Service`] trees.
//!
//! A fragment is classified by its shape, in this order:
//!
//! 1. `null` resolves to nothing.
//! 2. A URL-like string becomes a leaf named by the dictionary pattern it
//!    matches, else by the type hint, else by its host.
//! 3. Any other string is a slug: a leaf carrying the dictionary url, if known.
//! 4. A mapping with `service` and `url` keys is a single service record; the
//!    remaining keys become properties. A `service` key that is null or empty
//!    rejects the whole mapping.
//! 5. A mapping whose values are all URLs is a bundle of named services.
//! 6. Any other mapping is scanned key by key, each value classified with the
//!    key as its hint.
//! 7. A sequence is classified element by element with the same hint.
//! 8. Numbers and booleans resolve to nothing.
//!
//! Classification never fails past [`ServiceResolver::resolve`]: a fragment
//! that cannot be turned into a service is dropped, siblings are kept.

use crate::core::dictionary::{kind_of, Dictionary};
use crate::core::url_classifier::{self, capitalize};
use crate::domain::model::Service;
use crate::utils::error::{InventoryError, Result};
use serde_json::{Map, Value};

/// Nesting levels followed before a fragment is given up on.
pub const MAX_DEPTH: usize = 32;

/// Name of a group assembled without a type hint.
pub const UNKNOWN_GROUP: &str = "Unknown";

const SERVICE_KEY: &str = "service";
const URL_KEY: &str = "url";

#[derive(Debug, Clone, Copy)]
pub struct ServiceResolver<'d> {
    dictionary: &'d Dictionary,
    max_depth: usize,
}

impl<'d> ServiceResolver<'d> {
    pub fn new(dictionary: &'d Dictionary) -> Self {
        Self {
            dictionary,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn dictionary(&self) -> &'d Dictionary {
        self.dictionary
    }

    /// Classifies `fragment`, found under the field `type_hint`, into at most one service.
    pub fn resolve(&self, fragment: &Value, type_hint: Option<&str>) -> Option<Service> {
        self.classify_contained(fragment, clean_hint(type_hint), 0)
    }

    fn classify_contained(&self, fragment: &Value, hint: Option<&str>, depth: usize) -> Option<Service> {
        match self.classify(fragment, hint, depth) {
            Ok(service) => service,
            Err(e) => {
                tracing::debug!(
                    "Dropping {} fragment under {:?}: {}",
                    kind_of(fragment),
                    hint,
                    e
                );
                None
            }
        }
    }

    fn classify(&self, fragment: &Value, hint: Option<&str>, depth: usize) -> Result<Option<Service>> {
        if depth >= self.max_depth {
            tracing::warn!(
                "Fragment under {:?} nested deeper than {} levels, skipping",
                hint,
                self.max_depth
            );
            return Ok(None);
        }

        match fragment {
            Value::Null => Ok(None),
            Value::String(text) if url_classifier::is_url_like(text) => {
                self.from_url(text, hint).map(Some)
            }
            Value::String(slug) => self.from_slug(slug).map(Some),
            Value::Object(map) => self.from_map(map, hint, depth),
            Value::Array(items) => self.from_sequence(items, hint, depth),
            Value::Bool(_) | Value::Number(_) => Ok(None),
        }
    }

    fn from_url(&self, raw: &str, hint: Option<&str>) -> Result<Service> {
        let url = url_classifier::normalize(raw).ok_or_else(|| InventoryError::ProcessingError {
            message: format!("'{}' cannot be normalized", raw),
        })?;

        let entry = self.dictionary.match_url(&url);
        let name = match (entry, hint) {
            (Some(entry), _) => entry.name.clone(),
            (None, Some(hint)) => hint.to_string(),
            (None, None) => url_classifier::extract_name(&url),
        };

        tracing::debug!("url: {} <- {}", name, url);
        Ok(Service::leaf(name, Some(url))?
            .with_image_url(entry.and_then(|entry| entry.image_url.clone())))
    }

    fn from_slug(&self, raw: &str) -> Result<Service> {
        let slug = raw.trim();
        let entry = self.dictionary.lookup(slug);

        tracing::debug!(
            "slug: {} -> {:?}",
            slug,
            entry.and_then(|entry| entry.url.as_deref())
        );
        Ok(Service::leaf(slug, entry.and_then(|entry| entry.url.clone()))?
            .with_image_url(entry.and_then(|entry| entry.image_url.clone())))
    }

    fn from_map(&self, map: &Map<String, Value>, hint: Option<&str>, depth: usize) -> Result<Option<Service>> {
        if let Some(service) = map.get(SERVICE_KEY) {
            if scalar_text(service).is_none() {
                return Err(InventoryError::EmptyServiceName);
            }
            if map.contains_key(URL_KEY) {
                return self.service_record(map).map(Some);
            }
        }

        if is_url_bundle(map) {
            let mut children = bundle_children(map);
            match (hint, children.len()) {
                (_, 0) => {}
                (Some(hint), _) => return Service::group(hint, children).map(Some),
                (None, 1) => return Ok(children.pop()),
                // Several unnamed services: the generic scan names the group.
                (None, _) => {}
            }
        }

        self.from_mixed_map(map, hint, depth)
    }

    /// Leaf for a `{service, url, ...}` record.
    fn service_record(&self, map: &Map<String, Value>) -> Result<Service> {
        let slug = map
            .get(SERVICE_KEY)
            .and_then(scalar_text)
            .ok_or(InventoryError::EmptyServiceName)?;
        let url = map.get(URL_KEY).and_then(scalar_text);

        let properties: Map<String, Value> = map
            .iter()
            .filter(|(key, _)| key.as_str() != SERVICE_KEY && key.as_str() != URL_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let image_url = self
            .dictionary
            .lookup(&slug)
            .and_then(|entry| entry.image_url.clone());

        tracing::debug!("record: {} + {:?}", slug, url);
        Ok(Service::leaf(capitalize(&slug), url)?
            .with_image_url(image_url)
            .with_properties(properties))
    }

    fn from_mixed_map(&self, map: &Map<String, Value>, hint: Option<&str>, depth: usize) -> Result<Option<Service>> {
        let mut children: Vec<Service> = map
            .iter()
            .filter_map(|(key, value)| match self.mixed_child(key, value, depth) {
                Ok(child) => child,
                Err(e) => {
                    tracing::debug!("Dropping '{}': {}", key, e);
                    None
                }
            })
            .collect();

        match (children.len(), hint) {
            (0, _) => Ok(None),
            (_, Some(hint)) => Service::group(hint, children).map(Some),
            (1, None) => Ok(children.pop()),
            (_, None) => Service::group(UNKNOWN_GROUP, children).map(Some),
        }
    }

    fn mixed_child(&self, key: &str, value: &Value, depth: usize) -> Result<Option<Service>> {
        match value {
            Value::Object(inner) if is_service_record(inner) => self.service_record(inner).map(Some),
            Value::Object(inner) if is_url_bundle(inner) => {
                let children = bundle_children(inner);
                if children.is_empty() {
                    return Ok(None);
                }
                Service::group(key, children).map(Some)
            }
            Value::Object(inner) => {
                if let Some(child) = self.classify_contained(value, clean_hint(Some(key)), depth + 1) {
                    return Ok(Some(child));
                }

                // Keep the URLs of a branch that failed as a whole.
                let salvaged = bundle_children(inner);
                if salvaged.is_empty() {
                    return Ok(None);
                }
                tracing::debug!("Salvaged {} url entries under '{}'", salvaged.len(), key);
                Service::group(key, salvaged).map(Some)
            }
            // Lists recurse like nested maps, so `ci: [github, circleci]` inside a
            // section becomes a `ci` group rather than being skipped.
            Value::Array(_) => Ok(self.classify_contained(value, clean_hint(Some(key)), depth + 1)),
            Value::String(text) if url_classifier::is_url_like(text) => {
                Service::leaf(capitalize(key), Some(text.trim().to_string())).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn from_sequence(&self, items: &[Value], hint: Option<&str>, depth: usize) -> Result<Option<Service>> {
        let mut results: Vec<Service> = items
            .iter()
            .filter_map(|item| self.classify_contained(item, hint, depth + 1))
            .collect();

        match (results.len(), hint) {
            (0, _) => Ok(None),
            (_, Some(hint)) => Service::group(hint, results).map(Some),
            (1, None) => Ok(results.pop()),
            (count, None) => {
                tracing::debug!("Sequence of {} services without a name, skipping", count);
                Ok(None)
            }
        }
    }
}

/// Resolves one fragment against `dictionary`.
pub fn resolve(fragment: &Value, type_hint: Option<&str>, dictionary: &Dictionary) -> Option<Service> {
    ServiceResolver::new(dictionary).resolve(fragment, type_hint)
}

fn clean_hint(hint: Option<&str>) -> Option<&str> {
    hint.map(str::trim).filter(|hint| !hint.is_empty())
}

/// Non-empty text of a string, number or boolean.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn is_service_record(map: &Map<String, Value>) -> bool {
    map.contains_key(SERVICE_KEY) && map.contains_key(URL_KEY)
}

fn is_url_string(value: &Value) -> bool {
    value.as_str().is_some_and(url_classifier::is_url_like)
}

fn is_url_bundle(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.values().all(is_url_string)
}

/// One leaf per URL-valued entry, named after its key; other entries are ignored.
fn bundle_children(map: &Map<String, Value>) -> Vec<Service> {
    map.iter()
        .filter_map(|(key, value)| {
            let url = value.as_str().filter(|text| url_classifier::is_url_like(text))?;
            Service::leaf(capitalize(key), Some(url.trim().to_string()))
                .map_err(|e| tracing::debug!("Dropping bundle entry '{}': {}", key, e))
                .ok()
        })
        .collect()
}
