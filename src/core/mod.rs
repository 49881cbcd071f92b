pub mod dictionary;
pub mod etl;
pub mod pipeline;
pub mod resolver;
pub mod router;
pub mod url_classifier;

pub use crate::domain::model::{DomainRecord, FieldValue, Inventory, Service};
pub use crate::domain::ports::{ConfigProvider, OutputFormat, Pipeline, Storage};
pub use crate::utils::error::Result;
