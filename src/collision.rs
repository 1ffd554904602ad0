use crate::geometry::{transform_polygon, Polygon};
use crate::layer::Layer;
use crate::map::EditableTileMap;
use macroquad::prelude::{vec2, Vec2};

/// One tile hitbox in map pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct TileHitbox {
    pub layer_id: u32,
    pub x: usize,
    pub y: usize,
    pub polygon: Polygon,
}

/// Inclusive range of cells, already clamped to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x_min: usize,
    pub y_min: usize,
    pub x_max: usize,
    pub y_max: usize,
}

impl CellRect {
    /// Clamps an inclusive cell rectangle to the map. Corners may be given in
    /// any order. `None` when nothing of it lies on the map.
    pub fn clamped(map: &EditableTileMap, x0: i64, y0: i64, x1: i64, y1: i64) -> Option<Self> {
        let (mut x_min, mut x_max) = (x0.min(x1), x0.max(x1));
        let (mut y_min, mut y_max) = (y0.min(y1), y0.max(y1));
        let (dim_x, dim_y) = (i64::from(map.dim_x()), i64::from(map.dim_y()));

        if x_max < 0 || y_max < 0 || x_min >= dim_x || y_min >= dim_y {
            return None;
        }
        x_min = x_min.max(0);
        y_min = y_min.max(0);
        x_max = x_max.min(dim_x - 1);
        y_max = y_max.min(dim_y - 1);

        Some(CellRect {
            x_min: x_min as usize,
            y_min: y_min as usize,
            x_max: x_max as usize,
            y_max: y_max as usize,
        })
    }

    /// Cells touched by a rectangle in map pixel space.
    pub fn from_world(map: &EditableTileMap, min: Vec2, max: Vec2) -> Option<Self> {
        let tw = map.tile_width().max(1) as f32;
        let th = map.tile_height().max(1) as f32;
        Self::clamped(
            map,
            (min.x / tw).floor() as i64,
            (min.y / th).floor() as i64,
            (max.x / tw).floor() as i64,
            (max.y / th).floor() as i64,
        )
    }
}

/// Hitboxes tagged `tag` of every tile layer in `cells`, layer by layer then
/// row by row. Each local polygon gets its cell's flips applied and is moved
/// to the cell position. Hidden layers still collide.
pub fn hitboxes_in_rect(map: &EditableTileMap, tag: &str, cells: CellRect) -> Vec<TileHitbox> {
    let tw = map.tile_width() as f32;
    let th = map.tile_height() as f32;
    let mut out = Vec::new();

    for layer in map.layers() {
        let Layer::Tile(tiles) = layer else {
            continue;
        };
        for y in cells.y_min..=cells.y_max {
            for x in cells.x_min..=cells.x_max {
                let Some(gid) = tiles.tile_gid(x, y) else {
                    continue;
                };
                let Some(polygons) = map
                    .tile_definition(gid.bare_id())
                    .and_then(|def| def.hitboxes(tag))
                else {
                    continue;
                };
                let offset = vec2(x as f32 * tw, y as f32 * th);
                for polygon in polygons {
                    let mut polygon = transform_polygon(polygon, gid.flips(), tw, th);
                    polygon.iter_mut().for_each(|v| *v += offset);
                    out.push(TileHitbox {
                        layer_id: tiles.id,
                        x,
                        y,
                        polygon,
                    });
                }
            }
        }
    }
    out
}

/// Hitboxes tagged `tag` over the whole map.
pub fn all_hitboxes(map: &EditableTileMap, tag: &str) -> Vec<TileHitbox> {
    match CellRect::clamped(
        map,
        0,
        0,
        i64::from(map.dim_x()) - 1,
        i64::from(map.dim_y()) - 1,
    ) {
        Some(cells) => hitboxes_in_rect(map, tag, cells),
        None => Vec::new(),
    }
}
