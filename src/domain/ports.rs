use crate::domain::model::Inventory;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// Inventory document, relative to the storage root.
    fn inventory_path(&self) -> &str;
    /// Provider table; `None` means the bundled one.
    fn dictionary_path(&self) -> Option<&str>;
    fn output_file(&self) -> &str;
    fn output_format(&self) -> OutputFormat;
    /// Key that wraps the domain map, e.g. `sites`.
    fn root_key(&self) -> Option<&str>;
    fn simple_fields(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<serde_json::Value>;
    async fn transform(&self, document: serde_json::Value) -> Result<Inventory>;
    async fn load(&self, inventory: Inventory) -> Result<String>;
}
