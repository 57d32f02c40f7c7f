//! Shared types and configuration for the pricewatch workspace.
//!
//! Holds the record shapes that flow through the pipeline, the declarative
//! per-source field layouts, and the environment-backed application config.

pub mod app_config;
pub mod config;
pub mod records;
pub mod sources;

use thiserror::Error;

pub use app_config::{AppConfig, EmailConfig, SheetsConfig};
pub use config::{load_app_config, load_app_config_from_env, log_level_from_env};
pub use records::{CanonicalRecord, CleanedRecord, RawField, RawRecord, MISSING};
pub use sources::{load_sources, parse_sources, Field, FieldPositions, SourceLayout, SourcesFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("sources validation failed: {0}")]
    Validation(String),
}
