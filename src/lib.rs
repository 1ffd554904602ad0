//! Tile maps from Tiled and LDtk JSON exports, loaded into one editable model
//! with tagged collision hitboxes.

mod cache;
pub mod collision;
mod config;
mod error;
pub mod geometry;
pub mod gid;
mod layer;
pub mod loader;
mod map;
mod tileset;

pub use cache::TileMapCache;
pub use collision::{all_hitboxes, hitboxes_in_rect, CellRect, TileHitbox};
pub use config::{LoadOptions, DEFAULT_STACK_ID_FLOOR, DEFAULT_STACK_ID_START, MAX_MAP_CELLS};
pub use error::MapError;
pub use geometry::Polygon;
pub use gid::{Flips, Gid};
pub use layer::{Layer, ObjectLayer, TileLayer, TileObject};
pub use loader::ldtk::{load_ldtk, load_ldtk_with, LdtkMap};
pub use loader::stack::StackIdAllocator;
pub use loader::tiled::{load_tiled, TiledMap};
pub use loader::{load_file, TileMapFile};
pub use map::{EditableTileMap, TileMapBuilder};
pub use tileset::{TileDefinition, TileSet};
