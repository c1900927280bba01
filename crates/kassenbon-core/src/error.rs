//! Error types for kassenbon

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rule document error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("OCR backend unavailable: {0}")]
    OcrUnavailable(String),

    #[error("OCR extraction failed: {0}")]
    OcrFailed(String),

    #[error("Routing error: {0}")]
    Routing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
