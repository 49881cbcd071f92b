use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Service name cannot be empty")]
    EmptyServiceName,

    #[error("Service group '{name}' has no children")]
    EmptyServiceGroup { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl InventoryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            InventoryError::IoError(_) => ErrorCategory::Io,
            InventoryError::SerializationError(_)
            | InventoryError::YamlError(_)
            | InventoryError::ProcessingError { .. } => ErrorCategory::Data,
            InventoryError::ConfigError { .. }
            | InventoryError::ConfigValidationError { .. }
            | InventoryError::InvalidConfigValueError { .. }
            | InventoryError::MissingConfigError { .. } => ErrorCategory::Configuration,
            InventoryError::EmptyServiceName | InventoryError::EmptyServiceGroup { .. } => {
                ErrorCategory::Classification
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // A dropped fragment never stops a run.
            InventoryError::EmptyServiceName | InventoryError::EmptyServiceGroup { .. } => {
                ErrorSeverity::Low
            }
            InventoryError::ProcessingError { .. } => ErrorSeverity::Medium,
            InventoryError::SerializationError(_)
            | InventoryError::YamlError(_)
            | InventoryError::ConfigError { .. }
            | InventoryError::ConfigValidationError { .. }
            | InventoryError::InvalidConfigValueError { .. }
            | InventoryError::MissingConfigError { .. } => ErrorSeverity::High,
            InventoryError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the input file exists and the output directory is writable",
            ErrorCategory::Data => "Make sure the inventory is a YAML or JSON mapping of domain -> fields",
            ErrorCategory::Configuration => "Review the command line flags or the TOML configuration file",
            ErrorCategory::Classification => "Give every service a non-empty name and every section at least one url",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            InventoryError::IoError(e) => format!("Could not read or write a file: {}", e),
            InventoryError::YamlError(e) => format!("The inventory is not valid YAML: {}", e),
            InventoryError::SerializationError(e) => format!("Could not encode the result: {}", e),
            InventoryError::MissingConfigError { field } => {
                format!("Please provide a value for '{}'", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            InventoryError::EmptyServiceName.to_string(),
            "Service name cannot be empty"
        );
        let err = InventoryError::InvalidConfigValueError {
            field: "output.format".to_string(),
            value: "xml".to_string(),
            reason: "Unsupported format".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'xml' for 'output.format': Unsupported format"
        );
    }

    #[test]
    fn test_severity_and_category() {
        let io: InventoryError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.category(), ErrorCategory::Io);
        assert_eq!(io.severity(), ErrorSeverity::Critical);

        assert_eq!(
            InventoryError::EmptyServiceName.category(),
            ErrorCategory::Classification
        );
        assert!(InventoryError::EmptyServiceName.severity() < ErrorSeverity::Medium);
    }

    #[test]
    fn test_missing_config_message() {
        let err = InventoryError::MissingConfigError {
            field: "inventory".to_string(),
        };
        assert_eq!(
            err.user_friendly_message(),
            "Please provide a value for 'inventory'"
        );
    }
}
