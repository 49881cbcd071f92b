use crate::config::{INVENTORY_EXTENSIONS, OUTPUT_FORMATS};
use crate::core::router::DEFAULT_SIMPLE_FIELDS;
use crate::core::{ConfigProvider, OutputFormat};
use crate::utils::error::{InventoryError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub inventory: InventoryConfig,
    pub dictionary: Option<DictionaryConfig>,
    pub fields: Option<FieldsConfig>,
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub path: String,
    pub root_key: Option<String>,
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    pub simple: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| InventoryError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| InventoryError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${INVENTORY_DIR})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("inventory.path", &self.inventory.path)?;
        validation::validate_file_extensions(
            "inventory.path",
            std::slice::from_ref(&self.inventory.path),
            INVENTORY_EXTENSIONS,
        )?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(format) = &self.output.format {
            validation::validate_one_of("output.format", &format.to_ascii_lowercase(), OUTPUT_FORMATS)?;
        }
        if let Some(root_key) = &self.inventory.root_key {
            validation::validate_non_empty_string("inventory.root_key", root_key)?;
        }
        // A [dictionary] table must name a file; omit the table for the bundled one.
        if let Some(dictionary) = &self.dictionary {
            let path = validation::validate_required_field("dictionary.path", &dictionary.path)?;
            validation::validate_path("dictionary.path", path)?;
        }

        Ok(())
    }

    /// 輸入與輸出相對路徑的根目錄
    pub fn base_dir(&self) -> &str {
        self.inventory.base_dir.as_deref().unwrap_or(".")
    }

    pub fn verbose_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn inventory_path(&self) -> &str {
        &self.inventory.path
    }

    fn dictionary_path(&self) -> Option<&str> {
        self.dictionary.as_ref().and_then(|d| d.path.as_deref())
    }

    fn output_file(&self) -> &str {
        &self.output.path
    }

    fn output_format(&self) -> OutputFormat {
        self.output
            .format
            .as_deref()
            .and_then(OutputFormat::parse)
            .unwrap_or_default()
    }

    fn root_key(&self) -> Option<&str> {
        self.inventory.root_key.as_deref()
    }

    fn simple_fields(&self) -> Vec<String> {
        self.fields
            .as_ref()
            .and_then(|f| f.simple.clone())
            .unwrap_or_else(|| DEFAULT_SIMPLE_FIELDS.iter().map(|f| f.to_string()).collect())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[inventory]
path = "sites.yml"
root_key = "sites"

[dictionary]
path = "data/dictionary.yml"

[fields]
simple = ["project", "owner"]

[output]
path = "out/inventory.yaml"
format = "yaml"

[logging]
verbose = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.inventory_path(), "sites.yml");
        assert_eq!(config.root_key(), Some("sites"));
        assert_eq!(config.dictionary_path(), Some("data/dictionary.yml"));
        assert_eq!(config.simple_fields(), vec!["project", "owner"]);
        assert_eq!(config.output_format(), OutputFormat::Yaml);
        assert_eq!(config.base_dir(), ".");
        assert!(config.verbose_logging());
        assert!(!config.json_logging());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_sections_default() {
        let config = TomlConfig::from_toml_str(
            r#"
[inventory]
path = "sites.json"

[output]
path = "inventory.json"
"#,
        )
        .unwrap();

        assert!(config.dictionary_path().is_none());
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.simple_fields().len(), DEFAULT_SIMPLE_FIELDS.len());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("STACK_INVENTORY_TEST_DIR", "/srv/infra");

        let toml_content = r#"
[inventory]
path = "sites.yml"
base_dir = "${STACK_INVENTORY_TEST_DIR}"

[output]
path = "${STACK_INVENTORY_UNSET_VAR}/out.json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.base_dir(), "/srv/infra");
        assert_eq!(config.output.path, "${STACK_INVENTORY_UNSET_VAR}/out.json");

        std::env::remove_var("STACK_INVENTORY_TEST_DIR");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[inventory]
path = "sites.csv"

[output]
path = "inventory.json"
format = "xml"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dictionary_section_requires_path() {
        let config = TomlConfig::from_toml_str(
            r#"
[inventory]
path = "sites.yml"

[dictionary]

[output]
path = "inventory.json"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(InventoryError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let err = TomlConfig::from_file("/no/such/inventory.toml").unwrap_err();
        assert!(matches!(err, InventoryError::ConfigError { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[inventory\npath = 1").unwrap_err();
        assert!(matches!(err, InventoryError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[inventory]
path = "sites.yml"

[output]
path = "inventory.json"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.inventory.path, "sites.yml");
    }
}
