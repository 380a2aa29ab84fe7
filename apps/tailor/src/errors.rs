use std::path::PathBuf;

use thiserror::Error;

/// Application-level error type for loading inputs and writing outputs.
/// The tailoring run itself never fails: it falls back instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Fetch of {url} returned status {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("Invalid input: {0}")]
    Invalid(String),
}
