pub mod app_config;
pub mod attributes;
pub mod catalog;
mod config;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use attributes::{decode as decode_attributes, AttributeDecodeError, AttributeGroups};
pub use catalog::{
    page_count, slug_from_name, ImageInput, ListCriteria, Principal, ProductInput, ProductUpdate,
    Role, VariantInput,
};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("operation requires the {required} role")]
    Forbidden { required: Role },
    #[error("{0}")]
    Validation(String),
}
