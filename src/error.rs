//! Error types for level generation

use thiserror::Error;

/// Errors raised by the generation pipeline.
///
/// Search exhaustion (no island spot, no object cell) is not an error and is
/// reported through `Option` instead.
#[derive(Debug, Error)]
pub enum LevelGenError {
    #[error("grid shape mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    ShapeMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("buffer of {len} cells cannot form a {width}x{height} grid")]
    BufferLength { len: usize, width: usize, height: usize },

    #[error("expected one start height per column ({columns} columns), got {len}")]
    ColumnCount { columns: usize, len: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, LevelGenError>;
