use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TilerError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("Failed to write array: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid tile window: {0}")]
    InvalidWindow(String),

    #[error("No georeferencing transform available")]
    MissingTransform,

    #[error("No classification tags found for subscene {0}")]
    MissingClassificationTags(String),

    #[error("Failed to load {path}: {reason}")]
    FileLoad { path: PathBuf, reason: String },

    #[error("Mask tile has {channels} channels, channel {channel} requested")]
    MissingChannel { channel: usize, channels: usize },

    #[error("Subscene and mask tiles do not line up: {0}")]
    TileMismatch(String),

    #[error("Unknown sensor variant in identifier: {0}")]
    UnknownSensor(String),

    #[error("Invalid classification tags file: {0}")]
    InvalidTags(String),

    #[error("Invalid compression type: {0}")]
    InvalidCompression(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Input array has invalid dimensions: {0:?}")]
    InvalidDimensions(Vec<usize>),
}

impl TilerError {
    pub fn file_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TilerError::FileLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TilerError>;
