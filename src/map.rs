use crate::config::MAX_MAP_CELLS;
use crate::error::MapError;
use crate::layer::{Layer, ObjectLayer, TileLayer};
use crate::tileset::{TileDefinition, TileSet};
use tracing::warn;

/// Canonical, format-agnostic tile map.
///
/// Built once by a loader through [`TileMapBuilder`]; collision queries and
/// renderers only read it. Nothing in it refers back to the source format.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableTileMap {
    tile_width: u32,
    tile_height: u32,
    dim_x: u32,
    dim_y: u32,
    tile_set: TileSet,
    layers: Vec<Layer>,
    background_resource_name: Option<String>,
}

impl EditableTileMap {
    /// Width of a tile in pixels.
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Height of a tile in pixels.
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Number of tile columns.
    pub fn dim_x(&self) -> u32 {
        self.dim_x
    }

    /// Number of tile rows.
    pub fn dim_y(&self) -> u32 {
        self.dim_y
    }

    /// Map width in pixels.
    pub fn width(&self) -> u32 {
        self.tile_width.saturating_mul(self.dim_x)
    }

    /// Map height in pixels.
    pub fn height(&self) -> u32 {
        self.tile_height.saturating_mul(self.dim_y)
    }

    pub fn tile_definition(&self, tile_id: u32) -> Option<&TileDefinition> {
        self.tile_set.get(&tile_id)
    }

    pub fn tile_definitions(&self) -> impl Iterator<Item = (u32, &TileDefinition)> {
        self.tile_set.iter().map(|(&id, def)| (id, def))
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn tile_layer(&self, id: u32) -> Option<&TileLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::Tile(t) if t.id == id => Some(t),
            _ => None,
        })
    }

    pub fn tile_layer_mut(&mut self, id: u32) -> Option<&mut TileLayer> {
        self.layers.iter_mut().find_map(|l| match l {
            Layer::Tile(t) if t.id == id => Some(t),
            _ => None,
        })
    }

    /// Opaque reference to the level background image, if any.
    pub fn background_resource_name(&self) -> Option<&str> {
        self.background_resource_name.as_deref()
    }

    /// True when no layer holds a tile or an object.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Layer::is_empty)
    }

    /// Whether the point lies in the square of a tile carrying a `tag`
    /// hitbox. The hitbox polygons themselves are not tested.
    ///
    /// Layers are scanned in order and the scan stops with `false` at the
    /// first tile layer with no tile at that cell, even if a later layer has
    /// a tagged tile there. Object layers are skipped.
    pub fn point_is_inside_tile(&self, x: f32, y: f32, tag: &str) -> bool {
        let index_x = (x / self.tile_width as f32).floor();
        let index_y = (y / self.tile_height as f32).floor();
        let cell = (index_x >= 0.0 && index_y >= 0.0).then(|| (index_x as usize, index_y as usize));

        for layer in &self.layers {
            let Layer::Tile(tile_layer) = layer else {
                continue;
            };
            let Some(tile_id) = cell.and_then(|(cx, cy)| tile_layer.tile_id(cx, cy)) else {
                return false;
            };
            if self
                .tile_set
                .get(&tile_id)
                .is_some_and(|def| def.has_tagged_hitbox(tag))
            {
                return true;
            }
        }
        false
    }

    /// Returns the tile id at a cell of a tile layer.
    pub fn tile_id(&self, x: usize, y: usize, layer_id: u32) -> Option<u32> {
        self.tile_layer(layer_id)?.tile_id(x, y)
    }

    /// Places an unflipped tile. Ids without a definition are rejected.
    pub fn set_tile(&mut self, x: usize, y: usize, layer_id: u32, tile_id: u32) {
        if !self.tile_set.contains_key(&tile_id) {
            warn!(tile = tile_id, "invalid tile definition index");
            return;
        }
        if let Some(layer) = self.tile_layer_mut(layer_id) {
            layer.set_tile(x, y, tile_id);
        }
    }

    pub fn remove_tile(&mut self, x: usize, y: usize, layer_id: u32) {
        if let Some(layer) = self.tile_layer_mut(layer_id) {
            layer.remove_tile(x, y);
        }
    }

    pub fn flip_tile_horizontally(&mut self, x: usize, y: usize, layer_id: u32, flip: bool) {
        if let Some(layer) = self.tile_layer_mut(layer_id) {
            layer.set_flipped_horizontally(x, y, flip);
        }
    }

    pub fn flip_tile_vertically(&mut self, x: usize, y: usize, layer_id: u32, flip: bool) {
        if let Some(layer) = self.tile_layer_mut(layer_id) {
            layer.set_flipped_vertically(x, y, flip);
        }
    }
}

/// Accumulates the tile set and layers of a map being loaded.
///
/// Dimensions are fixed up front; every tile layer created through the
/// builder gets exactly `dim_x * dim_y` cells.
#[derive(Debug)]
pub struct TileMapBuilder {
    map: EditableTileMap,
}

impl TileMapBuilder {
    pub fn new(tile_width: u32, tile_height: u32, dim_x: u32, dim_y: u32, tile_set: TileSet) -> Self {
        Self {
            map: EditableTileMap {
                tile_width,
                tile_height,
                dim_x,
                dim_y,
                tile_set,
                layers: Vec::new(),
                background_resource_name: None,
            },
        }
    }

    /// [`new`](Self::new) for dimensions read from a file: rejects maps with
    /// more than [`MAX_MAP_CELLS`] cells or a pixel size overflowing `u32`.
    pub fn try_new(
        tile_width: u32,
        tile_height: u32,
        dim_x: u32,
        dim_y: u32,
        tile_set: TileSet,
    ) -> Result<Self, MapError> {
        let cells = u64::from(dim_x) * u64::from(dim_y);
        let fits = cells <= MAX_MAP_CELLS
            && tile_width.checked_mul(dim_x).is_some()
            && tile_height.checked_mul(dim_y).is_some();
        if !fits {
            return Err(MapError::InvalidDimensions {
                tile_width,
                tile_height,
                dim_x,
                dim_y,
            });
        }
        Ok(Self::new(tile_width, tile_height, dim_x, dim_y, tile_set))
    }

    pub fn tile_set(&self) -> &TileSet {
        &self.map.tile_set
    }

    pub fn tile_set_mut(&mut self) -> &mut TileSet {
        &mut self.map.tile_set
    }

    /// A fresh, empty layer sized to the map. It is not part of the map
    /// until passed to [`push_layer`](Self::push_layer).
    pub fn new_tile_layer(&self, id: u32) -> TileLayer {
        TileLayer::new(id, self.map.dim_x as usize, self.map.dim_y as usize)
    }

    pub fn new_object_layer(&self, id: u32) -> ObjectLayer {
        ObjectLayer::new(id)
    }

    pub fn push_layer(&mut self, layer: Layer) {
        self.map.layers.push(layer);
    }

    pub fn set_background_resource_name(&mut self, name: impl Into<String>) {
        self.map.background_resource_name = Some(name.into());
    }

    pub fn build(self) -> EditableTileMap {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rectangle;

    fn tagged(tag: &str) -> TileDefinition {
        let mut def = TileDefinition::new(0);
        def.add_hitbox(tag, rectangle(0.0, 0.0, 8.0, 8.0).unwrap(), true);
        def
    }

    /// Two 2x1 tile layers on 8x8 tiles: tile 0 is untagged, 1 is an
    /// obstacle, 2 is lava.
    fn two_layer_map(first: [Option<u32>; 2], second: [Option<u32>; 2]) -> EditableTileMap {
        let tile_set: TileSet = [
            (0, TileDefinition::new(0)),
            (1, tagged("obstacle")),
            (2, tagged("lava")),
        ]
        .into_iter()
        .collect();
        let mut builder = TileMapBuilder::new(8, 8, 2, 1, tile_set);
        for (id, cells) in [(1, first), (2, second)] {
            let mut layer = builder.new_tile_layer(id);
            for (x, cell) in cells.iter().enumerate() {
                if let Some(tile) = cell {
                    layer.set_tile(x, 0, *tile);
                }
            }
            builder.push_layer(Layer::Tile(layer));
        }
        builder.build()
    }

    #[test]
    fn pixel_size_is_tile_size_times_dimensions() {
        let map = TileMapBuilder::new(16, 8, 5, 3, TileSet::new()).build();
        assert_eq!(map.width(), 80);
        assert_eq!(map.height(), 24);
    }

    #[test]
    fn finds_a_tag_on_any_layer() {
        let map = two_layer_map([Some(0), Some(1)], [Some(2), Some(2)]);
        assert!(map.point_is_inside_tile(3.0, 3.0, "lava"));
        assert!(!map.point_is_inside_tile(3.0, 3.0, "obstacle"));
        assert!(map.point_is_inside_tile(8.0, 7.9, "obstacle"));
        assert!(!map.point_is_inside_tile(16.0, 0.0, "lava"));
        assert!(!map.point_is_inside_tile(-0.5, 0.0, "lava"));
    }

    #[test]
    fn stops_scanning_at_the_first_empty_cell() {
        let map = two_layer_map([None, Some(0)], [Some(2), Some(2)]);
        // layer 2 has lava at x = 0 but layer 1 is empty there
        assert!(!map.point_is_inside_tile(1.0, 1.0, "lava"));
        assert!(map.point_is_inside_tile(9.0, 1.0, "lava"));
    }

    #[test]
    fn object_layers_do_not_stop_the_scan() {
        let mut builder = TileMapBuilder::new(8, 8, 1, 1, [(1, tagged("obstacle"))].into_iter().collect());
        let objects = builder.new_object_layer(1);
        builder.push_layer(Layer::Object(objects));
        let mut tiles = builder.new_tile_layer(2);
        tiles.set_tile(0, 0, 1);
        builder.push_layer(Layer::Tile(tiles));
        let map = builder.build();
        assert!(map.point_is_inside_tile(4.0, 4.0, "obstacle"));
    }

    #[test]
    fn editing_rejects_unknown_tiles() {
        let mut map = two_layer_map([None, None], [None, None]);
        assert!(map.is_empty());
        map.set_tile(0, 0, 1, 42);
        assert_eq!(map.tile_id(0, 0, 1), None);
        map.set_tile(0, 0, 1, 2);
        map.flip_tile_vertically(0, 0, 1, true);
        assert_eq!(map.tile_id(0, 0, 1), Some(2));
        assert!(map.tile_layer(1).unwrap().is_flipped_vertically(0, 0));
        map.remove_tile(0, 0, 1);
        assert!(map.is_empty());
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let too_many_cells = TileMapBuilder::try_new(8, 8, u32::MAX, u32::MAX, TileSet::new());
        assert!(matches!(too_many_cells, Err(MapError::InvalidDimensions { .. })));

        let too_wide = TileMapBuilder::try_new(65_536, 8, 65_536, 1, TileSet::new());
        assert!(matches!(too_wide, Err(MapError::InvalidDimensions { dim_x: 65_536, .. })));

        let map = TileMapBuilder::try_new(8, 8, 8192, 8192, TileSet::new()).unwrap().build();
        assert_eq!(map.width(), 65_536);
    }

    #[test]
    fn pixel_size_saturates_for_hand_built_maps() {
        let map = TileMapBuilder::new(65_536, 1, 65_536, 1, TileSet::new()).build();
        assert_eq!(map.width(), u32::MAX);
    }
}
