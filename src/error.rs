use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole map load.
///
/// Problems limited to one layer or one tile (unsupported compression,
/// corrupt layer data, a bad hitbox) are logged and skipped instead.
#[derive(Debug, Error)]
pub enum MapError {
    /// The document is not in the expected format; the other loader may
    /// still accept it.
    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    #[error("level {index} does not exist")]
    MissingLevel { index: usize },

    /// The level was saved in its own file and is not embedded in the
    /// project JSON.
    #[error("level {index} has no layer data (saved as an external level?)")]
    MissingLevelData { index: usize },

    /// The map's cell count or pixel size does not fit the model.
    #[error("invalid map dimensions: {dim_x}x{dim_y} tiles of {tile_width}x{tile_height} px")]
    InvalidDimensions {
        tile_width: u32,
        tile_height: u32,
        dim_x: u32,
        dim_y: u32,
    },

    #[error("no identifier left for stacked tiles")]
    StackIdsExhausted,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
