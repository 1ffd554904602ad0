pub mod layer_data;
pub mod ldtk;
pub mod stack;
pub mod tiled;

use crate::config::LoadOptions;
use crate::error::MapError;
use crate::loader::ldtk::{load_ldtk_with, LdtkMap};
use crate::loader::stack::StackIdAllocator;
use crate::loader::tiled::{load_tiled, TiledMap};
use crate::map::EditableTileMap;
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::{info, warn};

/// A parsed tile map document whose format has been identified.
#[derive(Debug, Clone)]
pub enum TileMapFile {
    Tiled(TiledMap),
    Ldtk(LdtkMap),
}

impl TileMapFile {
    /// Detects the format from its marker key and deserializes the matching
    /// schema.
    pub fn identify(json: JsonValue) -> Result<Self, MapError> {
        if json.get("tiledversion").is_some() {
            info!("detected a map created with Tiled");
            return Ok(TileMapFile::Tiled(serde_json::from_value(json)?));
        }
        let app = json
            .get("__header__")
            .and_then(|h| h.get("app"))
            .and_then(JsonValue::as_str);
        if app == Some("LDtk") {
            info!("detected a map created with LDtk");
            return Ok(TileMapFile::Ldtk(serde_json::from_value(json)?));
        }
        warn!("the tile map has neither a `tiledversion` nor an LDtk `__header__` key");
        Err(MapError::FormatMismatch(
            "expected a Tiled (mapeditor.org) or LDtk (ldtk.io) JSON export".into(),
        ))
    }

    pub fn from_json_str(text: &str) -> Result<Self, MapError> {
        Self::identify(serde_json::from_str(text)?)
    }

    pub fn load(&self, options: &LoadOptions) -> Result<EditableTileMap, MapError> {
        match self {
            TileMapFile::Tiled(map) => load_tiled(map),
            TileMapFile::Ldtk(map) => load_ldtk_with(
                map,
                options.level_index,
                StackIdAllocator::new(options.stack_id_start, options.stack_id_floor),
            ),
        }
    }
}

/// Reads, identifies and loads a `.json`/`.tmj`/`.ldtk` file.
pub fn load_file(path: impl AsRef<Path>, options: &LoadOptions) -> Result<EditableTileMap, MapError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    TileMapFile::from_json_str(&text)?.load(options)
}
