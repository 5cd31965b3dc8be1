// ABOUTME: Application-wide error types for lanattach.
// ABOUTME: Uses thiserror for config, fixture and CLI failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::attach::AttachError;
use crate::types::IdError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("pool not found in fixture: {0}")]
    UnknownPool(String),

    #[error("unsupported pool file format: {0} (expected .yml, .yaml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Attach(#[from] AttachError),

    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
