use crate::core::dictionary::{kind_of, Dictionary};
use crate::core::resolver::ServiceResolver;
use crate::domain::model::{DomainRecord, FieldValue, Inventory};
use crate::utils::error::{InventoryError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashSet;

/// Fields copied through as-is instead of being resolved into services.
pub const DEFAULT_SIMPLE_FIELDS: &[&str] = &["project", "role", "environment", "bought_at"];

/// Fields ending with this suffix hold timestamps.
pub const TIMESTAMP_SUFFIX: &str = "_at";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%b %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M:%S %p",
    "%b %d, %Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%b %d, %Y", "%B %d, %Y", "%d %b %Y"];

/// Walks domain -> field -> value and decides, per field, between passthrough and service resolution.
#[derive(Debug, Clone)]
pub struct FieldRouter<'d> {
    resolver: ServiceResolver<'d>,
    simple_fields: HashSet<String>,
}

impl<'d> FieldRouter<'d> {
    pub fn new(dictionary: &'d Dictionary) -> Self {
        Self {
            resolver: ServiceResolver::new(dictionary),
            simple_fields: DEFAULT_SIMPLE_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn with_simple_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.simple_fields = fields
            .into_iter()
            .map(|field| {
                let field: String = field.into();
                field.trim().to_string()
            })
            .filter(|field| !field.is_empty())
            .collect();
        self
    }

    pub fn with_resolver(mut self, resolver: ServiceResolver<'d>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn is_simple_field(&self, field: &str) -> bool {
        self.simple_fields.contains(field) || is_timestamp_field(field)
    }

    /// Normalizes a whole inventory document (`domain -> fields`).
    pub fn route(&self, document: &Value) -> Result<Inventory> {
        let domains = match document {
            Value::Object(domains) => domains,
            Value::Null => return Ok(Inventory::new()),
            other => {
                return Err(InventoryError::ProcessingError {
                    message: format!(
                        "inventory must map domains to fields, got a {}",
                        kind_of(other)
                    ),
                })
            }
        };

        let mut inventory = Inventory::new();
        for (domain, fields) in domains {
            inventory.push(self.route_domain(domain, fields));
        }

        tracing::debug!(
            "Routed {} domains, {} services",
            inventory.len(),
            inventory.service_count()
        );
        Ok(inventory)
    }

    pub fn route_domain(&self, domain: &str, fields: &Value) -> DomainRecord {
        let mut record = DomainRecord::new(domain);

        let fields = match fields {
            Value::Object(fields) => fields,
            Value::Null => return record,
            other => {
                tracing::warn!(
                    "Domain '{}' holds a {} instead of fields, leaving it empty",
                    domain,
                    kind_of(other)
                );
                return record;
            }
        };

        for (field, value) in fields {
            match self.route_field(field, value) {
                Some(FieldValue::Services(services)) => {
                    for service in services {
                        record.push_service(field.as_str(), service);
                    }
                }
                Some(value) => record.set(field.as_str(), value),
                None => tracing::debug!(
                    "Service for {} on {} is absent, field will be skipped",
                    field,
                    domain
                ),
            }
        }

        record
    }

    /// Value to store under `field`, or `None` when the field should be dropped.
    pub fn route_field(&self, field: &str, value: &Value) -> Option<FieldValue> {
        if !self.is_simple_field(field) {
            let service = self.resolver.resolve(value, Some(field));
            tracing::debug!("resolve {}: {:?}", field, service);
            return service.map(|service| FieldValue::Services(vec![service]));
        }

        match value {
            Value::String(text) if is_timestamp_field(field) => Some(
                parse_timestamp(text)
                    .map(FieldValue::Timestamp)
                    .unwrap_or_else(|| FieldValue::Scalar(value.clone())),
            ),
            _ => Some(FieldValue::Scalar(value.clone())),
        }
    }
}

pub fn is_timestamp_field(field: &str) -> bool {
    field.ends_with(TIMESTAMP_SUFFIX)
}

/// Parses the timestamp spellings found in hand-written inventories.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
