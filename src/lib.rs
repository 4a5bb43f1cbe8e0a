pub mod api;
pub mod calibration;
pub mod config;
pub mod consts;
pub mod engine;
pub mod export;
pub mod geometry;
pub mod mapping;
pub mod notes;
pub mod settings;
pub mod sweep;
pub mod util;
// cmd and reports are binary modules (declared in main.rs).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeylightError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid Key: {0}")]
    InvalidKey(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Settings Error: {0}")]
    Settings(String),
}

pub type KlResult<T> = Result<T, KeylightError>;
