pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub mod args;

#[cfg(feature = "cli")]
pub use args::CliConfig;

pub const INVENTORY_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];
pub const OUTPUT_FORMATS: &[&str] = &["json", "yaml", "yml"];
