pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::{
    dictionary::{Dictionary, DictionaryEntry},
    etl::InventoryEngine,
    pipeline::InventoryPipeline,
    resolver::{resolve, ServiceResolver},
    router::FieldRouter,
};
pub use crate::domain::model::{DomainRecord, FieldValue, Inventory, Service};
pub use crate::utils::error::{InventoryError, Result};
