// src/loader/ldtk.rs
use crate::error::MapError;
use crate::gid::{Flips, Gid, GID_MASK};
use crate::layer::Layer;
use crate::loader::stack::{StackIdAllocator, TileStacker};
use crate::map::{EditableTileMap, TileMapBuilder};
use crate::tileset::{TileDefinition, TileSet};
use serde::Deserialize;
use tracing::{debug, warn};

/// An LDtk project with its levels embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct LdtkMap {
    #[serde(default, rename = "__header__")]
    pub header: Option<LdtkHeader>,
    #[serde(default)]
    pub levels: Vec<LdtkLevel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LdtkHeader {
    #[serde(default)]
    pub app: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LdtkLevel {
    #[serde(default)]
    pub identifier: String,
    /// `null` when the level is saved in a separate file.
    #[serde(default, rename = "layerInstances")]
    pub layer_instances: Option<Vec<LdtkLayerInstance>>,
    #[serde(default, rename = "bgRelPath")]
    pub bg_rel_path: Option<String>,
}

fn default_true() -> bool {
    true
}
fn one_f32() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct LdtkLayerInstance {
    #[serde(default, rename = "__tilesetDefUid")]
    pub tileset_def_uid: Option<u32>,
    #[serde(rename = "__gridSize")]
    pub grid_size: u32,
    #[serde(default, rename = "__cWid")]
    pub c_wid: u32,
    #[serde(default, rename = "__cHei")]
    pub c_hei: u32,
    #[serde(rename = "__type")]
    pub kind: String,
    #[serde(default = "one_f32", rename = "__opacity")]
    pub opacity: f32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, rename = "gridTiles")]
    pub grid_tiles: Vec<LdtkTile>,
    #[serde(default, rename = "autoLayerTiles")]
    pub auto_layer_tiles: Vec<LdtkTile>,
}

impl LdtkLayerInstance {
    /// Auto-layer tiles first, then hand placed tiles, in paint order.
    fn tiles(&self) -> impl Iterator<Item = &LdtkTile> {
        self.auto_layer_tiles.iter().chain(&self.grid_tiles)
    }

    fn is_gridded(&self) -> bool {
        matches!(self.kind.as_str(), "IntGrid" | "AutoLayer" | "Tiles")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LdtkTile {
    /// Tile id, unique within its tileset only.
    pub t: u32,
    /// Flip code: bit 0 is X, bit 1 is Y.
    #[serde(default)]
    pub f: u8,
    /// Pixel position of the tile in the layer.
    pub px: [i64; 2],
    /// Pixel position of the tile in the atlas.
    #[serde(default)]
    pub src: [i64; 2],
}

/// Largest tileset uid whose tiles still fit in the 29 bits of a gid.
pub const MAX_LDTK_TILESET_UID: u32 = GID_MASK >> 16;

/// LDtk tile ids are only unique in their tileset, so the tileset uid goes
/// in the high bits. `None` when the pair does not fit in a gid.
pub fn ldtk_tile_id(tileset_uid: u32, tile_id: u32) -> Option<u32> {
    (tileset_uid <= MAX_LDTK_TILESET_UID && tile_id <= 0xFFFF).then(|| (tileset_uid << 16) | tile_id)
}

/// Builds the canonical map from one level of an LDtk project.
///
/// A negative `level_index` means the first level.
pub fn load_ldtk(map: &LdtkMap, level_index: i32) -> Result<EditableTileMap, MapError> {
    load_ldtk_with(map, level_index, StackIdAllocator::default())
}

/// [`load_ldtk`] with the allocator used for stacked tile ids.
pub fn load_ldtk_with(
    map: &LdtkMap,
    level_index: i32,
    allocator: StackIdAllocator,
) -> Result<EditableTileMap, MapError> {
    match &map.header {
        Some(header) if header.app == "LDtk" => {}
        _ => {
            return Err(MapError::FormatMismatch(
                "no `__header__.app == \"LDtk\"`, the file does not look like an LDtk project".into(),
            ))
        }
    }

    let index = usize::try_from(level_index).unwrap_or(0);
    let level = map
        .levels
        .get(index)
        .ok_or(MapError::MissingLevel { index })?;
    let layers = level
        .layer_instances
        .as_ref()
        .ok_or(MapError::MissingLevelData { index })?;

    // First pass: tile definitions and the grid geometry.
    let mut tile_set = TileSet::new();
    let (mut grid_size, mut dim_x, mut dim_y) = (0, 0, 0);
    for layer in layers.iter().rev() {
        let uid = layer.tileset_def_uid.unwrap_or(0);
        let mut unaddressable = 0usize;
        for tile in layer.tiles() {
            match ldtk_tile_id(uid, tile.t) {
                Some(id) => {
                    tile_set.entry(id).or_insert_with(|| TileDefinition::new(0));
                }
                None => unaddressable += 1,
            }
        }
        if unaddressable > 0 {
            warn!(
                tileset = uid,
                count = unaddressable,
                "tileset uid or tile id too large for a tile identifier, skipping these tiles"
            );
        }

        if layer.is_gridded() {
            if grid_size == 0 {
                grid_size = layer.grid_size;
                dim_x = layer.c_wid;
                dim_y = layer.c_hei;
            } else if layer.grid_size != grid_size {
                warn!(
                    expected = grid_size,
                    found = layer.grid_size,
                    "grid size differs across layers, only the first layer grid size is followed"
                );
            }
        }
    }

    let mut builder = TileMapBuilder::try_new(grid_size, grid_size, dim_x, dim_y, tile_set)?;
    let mut stacker = TileStacker::new(allocator);

    // Second pass, in paint order.
    for (layer_id, layer) in layers.iter().enumerate().rev() {
        let mut tiles = builder.new_tile_layer(layer_id as u32);
        tiles.set_alpha(layer.opacity);
        tiles.visible = layer.visible;

        let uid = layer.tileset_def_uid.unwrap_or(0);
        let cell_size = i64::from(layer.grid_size);
        if cell_size == 0 && layer.tiles().next().is_some() {
            warn!(layer = layer_id, "layer has tiles but no grid size, skipping its tiles");
        }

        for tile in layer.tiles().filter(|_| cell_size > 0) {
            let (cx, cy) = (tile.px[0].div_euclid(cell_size), tile.px[1].div_euclid(cell_size));
            let (Ok(x), Ok(y)) = (usize::try_from(cx), usize::try_from(cy)) else {
                debug!(layer = layer_id, cx, cy, "tile outside the level");
                continue;
            };
            let Some(id) = ldtk_tile_id(uid, tile.t) else {
                continue;
            };
            let gid = Gid::with_flips(id, Flips::from_ldtk(tile.f));

            match tiles.tile_gid(x, y) {
                None => tiles.set_tile_gid(x, y, gid),
                Some(below) => {
                    let stacked = stacker.stack(builder.tile_set_mut(), below, gid)?;
                    tiles.set_tile(x, y, stacked);
                }
            }
        }
        builder.push_layer(Layer::Tile(tiles));
    }

    if let Some(path) = &level.bg_rel_path {
        builder.set_background_resource_name(path.clone());
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project(layers: serde_json::Value) -> LdtkMap {
        serde_json::from_value(json!({
            "__header__": { "app": "LDtk" },
            "levels": [ { "identifier": "Level_0", "layerInstances": layers } ]
        }))
        .expect("valid LDtk project")
    }

    fn tile(t: u32, f: u8, px: [i64; 2]) -> serde_json::Value {
        json!({ "t": t, "f": f, "px": px, "src": [0, 0] })
    }

    #[test]
    fn qualifies_ids_with_the_tileset_uid() {
        assert_eq!(ldtk_tile_id(3, 7), Some(0x0003_0007));
        assert_eq!(ldtk_tile_id(MAX_LDTK_TILESET_UID, 0xFFFF), Some(GID_MASK));
        assert_eq!(ldtk_tile_id(MAX_LDTK_TILESET_UID + 1, 0), None);
        assert_eq!(ldtk_tile_id(1, 0x1_0000), None);
    }

    #[test]
    fn rejects_other_formats() {
        let map: LdtkMap = serde_json::from_value(json!({ "levels": [] })).unwrap();
        assert!(matches!(load_ldtk(&map, 0), Err(MapError::FormatMismatch(_))));
    }

    #[test]
    fn geometry_comes_from_the_first_gridded_layer() {
        let map = project(json!([
            { "__type": "Entities", "__gridSize": 32, "__cWid": 1, "__cHei": 1 },
            { "__type": "Tiles", "__gridSize": 16, "__cWid": 4, "__cHei": 3,
              "__tilesetDefUid": 1, "gridTiles": [] },
            { "__type": "IntGrid", "__gridSize": 8, "__cWid": 8, "__cHei": 6 }
        ]));
        let loaded = load_ldtk(&map, 0).unwrap();
        // layers are read back to front, the IntGrid layer comes first
        assert_eq!((loaded.tile_width(), loaded.dim_x(), loaded.dim_y()), (8, 8, 6));
        let ids: Vec<_> = loaded.layers().iter().map(Layer::id).collect();
        assert_eq!(ids, vec![2, 1, 0]);
    }

    #[test]
    fn translates_flip_codes() {
        let map = project(json!([
            { "__type": "Tiles", "__gridSize": 8, "__cWid": 4, "__cHei": 1, "__tilesetDefUid": 2,
              "__opacity": 0.5, "visible": false,
              "gridTiles": [ tile(1, 0, [0, 0]), tile(1, 1, [8, 0]), tile(1, 2, [16, 0]), tile(1, 3, [24, 0]) ] }
        ]));
        let loaded = load_ldtk(&map, -1).unwrap();
        let layer = loaded.tile_layer(0).unwrap();
        assert_eq!(layer.alpha(), 0.5);
        assert!(!layer.visible);
        let id = ldtk_tile_id(2, 1).unwrap();
        assert_eq!(layer.tile_gid(0, 0), Some(Gid::pack(id, false, false, false)));
        assert_eq!(layer.tile_gid(1, 0), Some(Gid::pack(id, true, false, false)));
        assert_eq!(layer.tile_gid(2, 0), Some(Gid::pack(id, false, true, false)));
        assert_eq!(layer.tile_gid(3, 0), Some(Gid::pack(id, true, true, false)));
    }

    #[test]
    fn tiles_outside_the_level_are_dropped() {
        let map = project(json!([
            { "__type": "Tiles", "__gridSize": 8, "__cWid": 1, "__cHei": 1, "__tilesetDefUid": 1,
              "gridTiles": [ tile(0, 0, [-8, 0]), tile(0, 0, [64, 0]) ] }
        ]));
        let loaded = load_ldtk(&map, 0).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn external_levels_cannot_be_loaded() {
        let map: LdtkMap = serde_json::from_value(json!({
            "__header__": { "app": "LDtk" },
            "levels": [ { "identifier": "Level_0", "layerInstances": null } ]
        }))
        .unwrap();
        assert!(matches!(load_ldtk(&map, 0), Err(MapError::MissingLevelData { index: 0 })));
        assert!(matches!(load_ldtk(&map, 3), Err(MapError::MissingLevel { index: 3 })));
    }

    #[test]
    fn oversized_tileset_uids_do_not_alias_other_tiles() {
        let map = project(json!([
            { "__type": "Tiles", "__gridSize": 8, "__cWid": 2, "__cHei": 1, "__tilesetDefUid": 8193,
              "gridTiles": [ tile(0, 0, [8, 0]) ] },
            { "__type": "Tiles", "__gridSize": 8, "__cWid": 2, "__cHei": 1, "__tilesetDefUid": 1,
              "gridTiles": [ tile(0, 0, [0, 0]) ] }
        ]));
        let loaded = load_ldtk(&map, 0).unwrap();
        let ids: Vec<_> = loaded.tile_definitions().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0x1_0000]);
        assert_eq!(loaded.tile_id(0, 0, 1), Some(0x1_0000));
        assert_eq!(loaded.tile_id(1, 0, 0), None);
        assert!(loaded.tile_layer(0).unwrap().is_empty());
    }

    #[test]
    fn oversized_levels_are_rejected() {
        let map = project(json!([
            { "__type": "IntGrid", "__gridSize": 16, "__cWid": 4294967295u32, "__cHei": 4294967295u32 }
        ]));
        assert!(matches!(load_ldtk(&map, 0), Err(MapError::InvalidDimensions { .. })));
    }
}
