use crate::core::router::DEFAULT_SIMPLE_FIELDS;
use crate::core::{ConfigProvider, OutputFormat};
use crate::utils::error::{InventoryError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

use super::{INVENTORY_EXTENSIONS, OUTPUT_FORMATS};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "stack-inventory")]
#[command(about = "Normalizes a per-domain infrastructure inventory into a service tree")]
pub struct CliConfig {
    /// Inventory file (YAML or JSON), relative to --base-dir
    #[arg(long, default_value = "sites.yml")]
    pub inventory: String,

    /// Directory that relative input and output paths start from
    #[arg(long, default_value = ".")]
    pub base_dir: String,

    /// Provider dictionary; the bundled one is used when omitted
    #[arg(long)]
    pub dictionary: Option<String>,

    #[arg(long, default_value = "inventory.json")]
    pub output: String,

    #[arg(long, default_value = "json")]
    pub format: String,

    /// Key wrapping the domain map inside the inventory, e.g. "sites"
    #[arg(long)]
    pub root_key: Option<String>,

    /// Fields copied through without service resolution
    #[arg(long, value_delimiter = ',')]
    pub simple_fields: Vec<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn inventory_path(&self) -> &str {
        &self.inventory
    }

    fn dictionary_path(&self) -> Option<&str> {
        self.dictionary.as_deref()
    }

    fn output_file(&self) -> &str {
        &self.output
    }

    fn output_format(&self) -> OutputFormat {
        OutputFormat::parse(&self.format).unwrap_or_default()
    }

    fn root_key(&self) -> Option<&str> {
        self.root_key.as_deref()
    }

    fn simple_fields(&self) -> Vec<String> {
        if self.simple_fields.is_empty() {
            DEFAULT_SIMPLE_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            self.simple_fields.clone()
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("inventory", &self.inventory)?;
        validation::validate_file_extensions(
            "inventory",
            std::slice::from_ref(&self.inventory),
            INVENTORY_EXTENSIONS,
        )?;
        validation::validate_path("base_dir", &self.base_dir)?;
        validation::validate_path("output", &self.output)?;
        validation::validate_one_of(
            "format",
            &self.format.to_ascii_lowercase(),
            OUTPUT_FORMATS,
        )?;

        if let Some(dictionary) = &self.dictionary {
            validation::validate_path("dictionary", dictionary)?;
        }
        if let Some(root_key) = &self.root_key {
            validation::validate_non_empty_string("root_key", root_key)?;
        }
        if self.simple_fields.iter().any(|field| field.trim().is_empty()) {
            return Err(InventoryError::InvalidConfigValueError {
                field: "simple_fields".to_string(),
                value: self.simple_fields.join(","),
                reason: "Field names cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> CliConfig {
        let mut argv = vec!["stack-inventory"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.inventory_path(), "sites.yml");
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert!(config.dictionary_path().is_none());
        assert_eq!(config.simple_fields(), vec!["project", "role", "environment", "bought_at"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = config(&[
            "--inventory",
            "infra/sites.yaml",
            "--format",
            "YAML",
            "--root-key",
            "sites",
            "--simple-fields",
            "project,owner",
        ]);
        assert_eq!(config.output_format(), OutputFormat::Yaml);
        assert_eq!(config.root_key(), Some("sites"));
        assert_eq!(config.simple_fields(), vec!["project", "owner"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        assert!(config(&["--inventory", "sites.txt"]).validate().is_err());
        assert!(config(&["--format", "xml"]).validate().is_err());
        assert!(config(&["--root-key", " "]).validate().is_err());
    }
}
