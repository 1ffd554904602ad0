// src/loader/tiled.rs
use crate::error::MapError;
use crate::geometry::{self, Polygon};
use crate::gid::{tile_index_from_tiled, Gid};
use crate::layer::{Layer, TileObject};
use crate::loader::layer_data::{decode_layer_data, LayerDataError, TiledLayerData};
use crate::map::{EditableTileMap, TileMapBuilder};
use crate::tileset::{TileDefinition, TileSet};
use macroquad::prelude::vec2;
use serde::Deserialize;
use tracing::{debug, error, warn};

/// A map exported by Tiled as JSON, tilesets embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct TiledMap {
    #[serde(default)]
    pub tiledversion: Option<String>,
    pub tilewidth: u32,
    pub tileheight: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub tilesets: Vec<TiledTileset>,
    #[serde(default)]
    pub layers: Vec<TiledLayer>,
}

fn default_true() -> bool {
    true
}
fn one() -> u32 {
    1
}
fn one_f32() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledTileset {
    #[serde(default = "one")]
    pub firstgid: u32,
    #[serde(default)]
    pub tilecount: u32,
    #[serde(default)]
    pub tiles: Vec<TiledTile>,
    /// Set for tilesets saved in their own file, which this loader cannot
    /// follow.
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledTile {
    pub id: u32,
    #[serde(default)]
    pub class: Option<String>,
    /// Name of `class` before Tiled 1.9.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub animation: Vec<TiledFrame>,
    #[serde(default)]
    pub objectgroup: Option<TiledObjectGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledFrame {
    pub tileid: u32,
    #[serde(default)]
    pub duration: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TiledObjectGroup {
    #[serde(default)]
    pub objects: Vec<TiledObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledObject {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub polygon: Option<Vec<TiledPoint>>,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TiledPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledLayer {
    #[serde(default)]
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "one_f32")]
    pub opacity: f32,
    #[serde(default)]
    pub data: Option<TiledLayerData>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub compression: Option<String>,
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub height: usize,
    #[serde(default)]
    pub objects: Vec<TiledObject>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl TiledTile {
    fn class_name(&self) -> Option<&str> {
        non_empty(&self.class).or_else(|| non_empty(&self.kind))
    }
}

impl TiledObject {
    fn class_name(&self) -> Option<&str> {
        non_empty(&self.class).or_else(|| non_empty(&self.kind))
    }

    /// The object's shape in tile space, `None` for shapes with no area
    /// information (e.g. a bare point).
    fn hitbox(&self) -> Option<Result<Polygon, geometry::GeometryError>> {
        let origin = vec2(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0));
        if let Some(points) = &self.polygon {
            let points: Vec<_> = points.iter().map(|p| vec2(p.x, p.y)).collect();
            return Some(geometry::rotated_polygon(origin, &points, self.rotation));
        }
        match (self.x, self.y, self.width, self.height) {
            (Some(x), Some(y), Some(w), Some(h)) => Some(geometry::rectangle(x, y, w, h)),
            _ => None,
        }
    }
}

/// Builds a definition from one tile's metadata.
fn tile_definition(tile: &TiledTile, tile_width: u32, tile_height: u32) -> TileDefinition {
    let mut def = TileDefinition::new(tile.animation.len() as u32);
    let (tw, th) = (tile_width as f32, tile_height as f32);

    let Some(group) = &tile.objectgroup else {
        if let Some(class) = tile.class_name() {
            let full = vec![vec2(0.0, 0.0), vec2(0.0, th), vec2(tw, th), vec2(tw, 0.0)];
            def.add_hitbox(class, full, true);
        }
        return def;
    };

    for object in &group.objects {
        // untagged shapes are decoration only
        let Some(tag) = object.class_name().or_else(|| tile.class_name()) else {
            continue;
        };
        match object.hitbox() {
            Some(Ok(polygon)) => {
                let full = object.polygon.is_none()
                    && object.x == Some(0.0)
                    && object.y == Some(0.0)
                    && object.width == Some(tw)
                    && object.height == Some(th);
                def.add_hitbox(tag, polygon, full);
            }
            Some(Err(err)) => {
                warn!(tile = tile.id, object = object.id, %err, "skipping tile hitbox");
            }
            None => debug!(tile = tile.id, object = object.id, "object has no shape"),
        }
    }
    def
}

fn build_tile_set(map: &TiledMap) -> TileSet {
    let mut tilesets: Vec<&TiledTileset> = map.tilesets.iter().collect();
    tilesets.sort_by_key(|t| t.firstgid);

    let mut tile_set = TileSet::new();
    for tileset in tilesets {
        if let Some(source) = &tileset.source {
            warn!(%source, "external tilesets are not supported, embed the tileset in the map");
        }
        for tile in &tileset.tiles {
            let Some(index) = tile_index_from_tiled(tileset.firstgid.saturating_add(tile.id)) else {
                continue;
            };
            tile_set.insert(index, tile_definition(tile, map.tilewidth, map.tileheight));
        }
        for local in 0..tileset.tilecount {
            if let Some(index) = tile_index_from_tiled(tileset.firstgid.saturating_add(local)) {
                tile_set.entry(index).or_insert_with(|| TileDefinition::new(0));
            }
        }
    }
    tile_set
}

/// Splits a raw Tiled gid into the canonical gid (0-based index, same
/// flips). `None` for an empty cell.
fn canonical_gid(raw: u32) -> Option<Gid> {
    let raw = Gid(raw);
    let index = tile_index_from_tiled(raw.bare_id())?;
    Some(Gid::with_flips(index, raw.flips()))
}

fn decode_tile_layer(layer: &TiledLayer) -> Result<Option<Vec<u32>>, LayerDataError> {
    match &layer.data {
        Some(data) => decode_layer_data(data, layer.encoding.as_deref(), layer.compression.as_deref()).map(Some),
        None => Ok(None),
    }
}

/// Builds the canonical map from a Tiled map.
///
/// Fails when `tiledversion` is missing or the map is too large to hold. A
/// tile layer that cannot be decoded is logged and left out of the result.
pub fn load_tiled(map: &TiledMap) -> Result<EditableTileMap, MapError> {
    if map.tiledversion.is_none() {
        return Err(MapError::FormatMismatch(
            "no `tiledversion` key, the file does not look like a Tiled export".into(),
        ));
    }

    let mut builder = TileMapBuilder::try_new(
        map.tilewidth,
        map.tileheight,
        map.width,
        map.height,
        build_tile_set(map),
    )?;

    for layer in &map.layers {
        match layer.kind.as_str() {
            "objectgroup" => {
                let mut objects = builder.new_object_layer(layer.id);
                objects.visible = layer.visible;
                for object in &layer.objects {
                    if !object.visible {
                        continue;
                    }
                    let Some(gid) = object.gid.and_then(canonical_gid) else {
                        continue;
                    };
                    objects.objects.push(TileObject {
                        x: object.x.unwrap_or(0.0),
                        y: object.y.unwrap_or(0.0),
                        gid,
                    });
                }
                builder.push_layer(Layer::Object(objects));
            }
            "tilelayer" => {
                let cells = match decode_tile_layer(layer) {
                    Ok(Some(cells)) => cells,
                    Ok(None) => {
                        warn!(layer = layer.id, "tile layer has no data (infinite maps are not supported)");
                        continue;
                    }
                    Err(err @ LayerDataError::UnsupportedCompression(_)) => {
                        error!(layer = layer.id, %err, "skipping layer");
                        continue;
                    }
                    Err(err) => {
                        error!(layer = layer.id, %err, "failed to decode layer data, skipping layer");
                        continue;
                    }
                };

                let mut tiles = builder.new_tile_layer(layer.id);
                tiles.visible = layer.visible;
                tiles.set_alpha(layer.opacity);

                // row-major over the layer's own size; cells past the map are dropped
                let row = layer.width.max(1);
                let in_layer = layer.width.saturating_mul(layer.height);
                for (i, raw) in cells.into_iter().enumerate().take(in_layer) {
                    let Some(gid) = canonical_gid(raw) else {
                        continue;
                    };
                    let (x, y) = (i % row, i / row);
                    if !builder.tile_set().contains_key(&gid.bare_id()) {
                        warn!(layer = layer.id, tile = gid.bare_id(), x, y, "invalid tile definition index");
                        continue;
                    }
                    tiles.set_tile_gid(x, y, gid);
                }
                builder.push_layer(Layer::Tile(tiles));
            }
            other => debug!(layer = layer.id, kind = other, "ignoring layer type"),
        }
    }

    Ok(builder.build())
}
