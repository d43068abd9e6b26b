pub mod app_config;
pub mod categories;
pub mod config;
pub mod listing;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use categories::{load_categories, CategoriesFile, CategorySeed, DEFAULT_SEED_URLS};
pub use config::{load_app_config, load_app_config_from_env};
pub use listing::{Assets, CanonicalListing, ListingMetadata, PriceData, VendorInfo};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[from] serde_yaml::Error),

    #[error("categories validation failed: {0}")]
    Validation(String),
}
