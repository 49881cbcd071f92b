use crate::utils::error::{InventoryError, Result};
use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

/// A provider or service named in the inventory.
///
/// A leaf carries a url (or nothing, for an unknown slug); a group carries
/// children and never a url of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    #[serde(rename = "service")]
    name: String,
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Service>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,
}

impl Service {
    pub fn leaf(name: impl Into<String>, url: Option<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(InventoryError::EmptyServiceName);
        }
        Ok(Self {
            name,
            url,
            image_url: None,
            children: Vec::new(),
            properties: Map::new(),
        })
    }

    pub fn group(name: impl Into<String>, children: Vec<Service>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(InventoryError::EmptyServiceName);
        }
        if children.is_empty() {
            return Err(InventoryError::EmptyServiceGroup { name });
        }
        Ok(Self {
            name,
            url: None,
            image_url: None,
            children,
            properties: Map::new(),
        })
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn children(&self) -> &[Service] {
        &self.children
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// Rebuilds the `{service, url, ...}` record a leaf would be read from.
    pub fn to_fragment(&self) -> Value {
        let mut map = Map::new();
        map.insert("service".to_string(), Value::String(self.name.clone()));
        map.insert(
            "url".to_string(),
            self.url.clone().map(Value::String).unwrap_or(Value::Null),
        );
        for (key, value) in &self.properties {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// Value stored under one field of a domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Services(Vec<Service>),
    Timestamp(NaiveDateTime),
    Scalar(Value),
}

impl FieldValue {
    pub fn as_services(&self) -> Option<&[Service]> {
        match self {
            FieldValue::Services(services) => Some(services),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&NaiveDateTime> {
        match self {
            FieldValue::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// All normalized fields of one domain, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomainRecord {
    pub domain: String,
    fields: Vec<(String, FieldValue)>,
}

impl DomainRecord {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            fields: Vec::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn services(&self, field: &str) -> &[Service] {
        self.get(field)
            .and_then(FieldValue::as_services)
            .unwrap_or(&[])
    }

    /// Replaces the value of `field`, keeping its original position.
    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn push_service(&mut self, field: impl Into<String>, service: Service) {
        let field = field.into();
        if let Some((_, FieldValue::Services(list))) =
            self.fields.iter_mut().find(|(name, _)| *name == field)
        {
            list.push(service);
            return;
        }
        self.set(field, FieldValue::Services(vec![service]));
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for DomainRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The normalized inventory: domain -> field -> value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Inventory {
    domains: Vec<DomainRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DomainRecord) {
        self.domains.push(record);
    }

    pub fn domain(&self, name: &str) -> Option<&DomainRecord> {
        self.domains.iter().find(|record| record.domain == name)
    }

    pub fn domains(&self) -> &[DomainRecord] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Every service filed under `field`, across domains, in document order.
    pub fn services_by_type(&self, field: &str) -> Vec<&Service> {
        self.domains
            .iter()
            .flat_map(|record| record.services(field))
            .collect()
    }

    pub fn service_count(&self) -> usize {
        self.domains
            .iter()
            .flat_map(|record| record.fields())
            .filter_map(|(_, value)| value.as_services())
            .map(<[Service]>::len)
            .sum()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.domains.len()))?;
        for record in &self.domains {
            map.serialize_entry(&record.domain, record)?;
        }
        map.end()
    }
}
