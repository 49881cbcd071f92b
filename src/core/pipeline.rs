use crate::core::dictionary::Dictionary;
use crate::core::router::FieldRouter;
use crate::core::{ConfigProvider, Inventory, OutputFormat, Pipeline, Storage};
use crate::utils::error::{InventoryError, Result};
use serde_json::Value;
use std::sync::Arc;

/// Reads an inventory document, routes it, and writes the normalized tree.
pub struct InventoryPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    dictionary: Arc<Dictionary>,
}

impl<S: Storage, C: ConfigProvider> InventoryPipeline<S, C> {
    /// Loads the configured dictionary once; the bundled table is used when none is configured.
    pub fn new(storage: S, config: C) -> Self {
        let dictionary = match config.dictionary_path() {
            Some(path) => Arc::new(Dictionary::load(path)),
            None => Dictionary::bundled_shared(),
        };
        Self::with_dictionary(storage, config, dictionary)
    }

    pub fn with_dictionary(storage: S, config: C, dictionary: Arc<Dictionary>) -> Self {
        Self {
            storage,
            config,
            dictionary,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for InventoryPipeline<S, C> {
    async fn extract(&self) -> Result<Value> {
        let path = self.config.inventory_path();
        tracing::debug!("Reading inventory from: {}", path);

        let bytes = self.storage.read_file(path).await?;
        let text = String::from_utf8(bytes).map_err(|e| InventoryError::ProcessingError {
            message: format!("{} is not UTF-8: {}", path, e),
        })?;

        let document = decode_document(&text, path)?;
        unwrap_root(document, self.config.root_key())
    }

    async fn transform(&self, document: Value) -> Result<Inventory> {
        let router = FieldRouter::new(&self.dictionary).with_simple_fields(self.config.simple_fields());
        router.route(&document)
    }

    async fn load(&self, inventory: Inventory) -> Result<String> {
        let output_path = self.config.output_file().to_string();
        let format = self.config.output_format();

        let body = encode_inventory(&inventory, format)?;
        tracing::debug!("Writing {} output ({} bytes)", format.as_str(), body.len());
        self.storage.write_file(&output_path, body.as_bytes()).await?;

        Ok(output_path)
    }
}

/// Decodes JSON when the path says so, YAML otherwise.
pub fn decode_document(text: &str, path: &str) -> Result<Value> {
    if path.to_ascii_lowercase().ends_with(".json") {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Returns the value under `root_key`, or the whole document when no key is configured.
pub fn unwrap_root(document: Value, root_key: Option<&str>) -> Result<Value> {
    let Some(key) = root_key else {
        return Ok(document);
    };

    match document {
        Value::Object(mut map) => map.remove(key).ok_or_else(|| InventoryError::ProcessingError {
            message: format!("root key '{}' not found in inventory", key),
        }),
        _ => Err(InventoryError::ProcessingError {
            message: format!("root key '{}' requires a mapping at the top level", key),
        }),
    }
}

pub fn encode_inventory(inventory: &Inventory, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => inventory.to_json_pretty(),
        OutputFormat::Yaml => inventory.to_yaml(),
    }
}
