//! Error type shared by map creation, persistence and configuration loading.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HexMapError {
    /// Dimensions must be positive multiples of the chunk size.
    #[error("unsupported map size {width}x{height}")]
    InvalidMapSize { width: i32, height: i32 },

    /// Save file written by a newer format version.
    #[error("unknown map format {found} (newest supported is {supported})")]
    UnknownVersion { found: i32, supported: i32 },

    #[error("file does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("corrupt map data: {0}")]
    CorruptData(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
