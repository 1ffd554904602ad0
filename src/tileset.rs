use crate::geometry::Polygon;
use crate::gid::Gid;
use std::collections::HashMap;

/// Tile definitions by tile index.
pub type TileSet = HashMap<u32, TileDefinition>;

#[derive(Debug, Clone, PartialEq)]
struct TaggedHitBox {
    tag: String,
    polygons: Vec<Polygon>,
    has_full_hitbox: bool,
}

/// Per tile index metadata shared by every cell using that index.
///
/// A definition is either a real tile (optionally animated, optionally with
/// hitboxes) or a synthetic stack of several tiles drawn in the same cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileDefinition {
    // a tile rarely has more than a handful of tags, a Vec beats a map here
    tagged_hitboxes: Vec<TaggedHitBox>,
    animation_length: u32,
    stacked_tiles: Vec<Gid>,
    stack_tile_id: Option<u32>,
}

impl TileDefinition {
    pub fn new(animation_length: u32) -> Self {
        Self {
            animation_length,
            ..Default::default()
        }
    }

    /// A synthetic definition drawing `tiles` in order under `stack_tile_id`.
    pub fn stacked(stack_tile_id: u32, tiles: Vec<Gid>) -> Self {
        Self {
            stacked_tiles: tiles,
            stack_tile_id: Some(stack_tile_id),
            ..Default::default()
        }
    }

    /// Adds a polygon under `tag`. `has_full_hitbox` marks a polygon covering
    /// the whole tile.
    pub fn add_hitbox(&mut self, tag: &str, polygon: Polygon, has_full_hitbox: bool) {
        let index = match self.tagged_hitboxes.iter().position(|h| h.tag == tag) {
            Some(i) => i,
            None => {
                self.tagged_hitboxes.push(TaggedHitBox {
                    tag: tag.to_owned(),
                    polygons: Vec::new(),
                    has_full_hitbox: false,
                });
                self.tagged_hitboxes.len() - 1
            }
        };
        let entry = &mut self.tagged_hitboxes[index];
        entry.has_full_hitbox |= has_full_hitbox;
        entry.polygons.push(polygon);
    }

    pub fn has_tagged_hitbox(&self, tag: &str) -> bool {
        self.tagged_hitboxes.iter().any(|h| h.tag == tag)
    }

    /// Local space polygons tagged `tag`.
    ///
    /// Only this definition's own metadata is consulted: a stacked
    /// definition does not expose the hitboxes of its components.
    pub fn hitboxes(&self, tag: &str) -> Option<&[Polygon]> {
        self.tagged_hitboxes
            .iter()
            .find(|h| h.tag == tag)
            .map(|h| h.polygons.as_slice())
    }

    pub fn has_full_hitbox(&self, tag: &str) -> bool {
        self.tagged_hitboxes
            .iter()
            .any(|h| h.tag == tag && h.has_full_hitbox)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tagged_hitboxes.iter().map(|h| h.tag.as_str())
    }

    /// Number of animation frames, `0` for a still tile. Frames are laid out
    /// horizontally next to each other on the atlas.
    pub fn animation_length(&self) -> u32 {
        self.animation_length
    }

    pub fn stack_tile_id(&self) -> Option<u32> {
        self.stack_tile_id
    }

    pub fn stacked_tiles(&self) -> &[Gid] {
        &self.stacked_tiles
    }

    pub fn has_stacked_tiles(&self) -> bool {
        !self.stacked_tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rectangle;

    #[test]
    fn groups_polygons_by_tag() {
        let mut def = TileDefinition::new(0);
        def.add_hitbox("obstacle", rectangle(0.0, 0.0, 8.0, 8.0).unwrap(), true);
        def.add_hitbox("lava", rectangle(0.0, 0.0, 4.0, 4.0).unwrap(), false);
        def.add_hitbox("obstacle", rectangle(0.0, 0.0, 2.0, 2.0).unwrap(), false);

        assert_eq!(def.hitboxes("obstacle").map(<[_]>::len), Some(2));
        assert_eq!(def.hitboxes("lava").map(<[_]>::len), Some(1));
        assert!(def.hitboxes("water").is_none());
        assert!(def.has_full_hitbox("obstacle"));
        assert!(!def.has_full_hitbox("lava"));
        assert_eq!(def.tags().collect::<Vec<_>>(), vec!["obstacle", "lava"]);
    }

    #[test]
    fn stacks_do_not_expose_component_hitboxes() {
        let def = TileDefinition::stacked(0x0FFF_FFFF, vec![Gid(1), Gid(2)]);
        assert!(def.has_stacked_tiles());
        assert_eq!(def.stack_tile_id(), Some(0x0FFF_FFFF));
        assert!(!def.has_tagged_hitbox("obstacle"));
    }
}
