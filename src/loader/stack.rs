//! Composition of several tiles painted into one cell.
//!
//! The canonical model keeps one gid per cell, so when a layer paints a
//! second tile over an occupied cell the pair is replaced by a synthetic
//! "stacked" tile definition listing the components in paint order.

use crate::config::{DEFAULT_STACK_ID_FLOOR, DEFAULT_STACK_ID_START};
use crate::error::MapError;
use crate::gid::Gid;
use crate::tileset::{TileDefinition, TileSet};
use std::collections::HashMap;

/// Hands out stacked tile ids counting down from `start`, never below
/// `floor`.
#[derive(Debug, Clone)]
pub struct StackIdAllocator {
    next: Option<u32>,
    floor: u32,
}

impl Default for StackIdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_ID_START, DEFAULT_STACK_ID_FLOOR)
    }
}

impl StackIdAllocator {
    pub fn new(start: u32, floor: u32) -> Self {
        Self {
            next: (start >= floor).then_some(start),
            floor,
        }
    }

    /// Next free id, skipping ids for which `is_taken` holds. `None` once
    /// the range is used up.
    pub fn allocate(&mut self, is_taken: impl Fn(u32) -> bool) -> Option<u32> {
        loop {
            let id = self.next?;
            self.next = id.checked_sub(1).filter(|&n| n >= self.floor);
            if !is_taken(id) {
                return Some(id);
            }
        }
    }
}

/// Builds stacked tiles, sharing one definition between every cell with the
/// same ordered components.
#[derive(Debug, Default)]
pub struct TileStacker {
    allocator: StackIdAllocator,
    known: HashMap<Vec<Gid>, u32>,
}

impl TileStacker {
    pub fn new(allocator: StackIdAllocator) -> Self {
        Self {
            allocator,
            known: HashMap::new(),
        }
    }

    /// Returns the id of the tile showing `above` painted over `below`.
    ///
    /// When `below` is already a stack, `above` is appended to its
    /// components instead of nesting stacks.
    pub fn stack(&mut self, tile_set: &mut TileSet, below: Gid, above: Gid) -> Result<u32, MapError> {
        let mut components = match tile_set.get(&below.bare_id()) {
            Some(def) if def.has_stacked_tiles() => def.stacked_tiles().to_vec(),
            _ => vec![below],
        };
        components.push(above);

        if let Some(&id) = self.known.get(&components) {
            return Ok(id);
        }
        let id = self
            .allocator
            .allocate(|id| tile_set.contains_key(&id))
            .ok_or(MapError::StackIdsExhausted)?;
        tile_set.insert(id, TileDefinition::stacked(id, components.clone()));
        self.known.insert(components, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_downwards_and_skips_taken_ids() {
        let mut alloc = StackIdAllocator::new(10, 7);
        assert_eq!(alloc.allocate(|_| false), Some(10));
        assert_eq!(alloc.allocate(|id| id == 9), Some(8));
        assert_eq!(alloc.allocate(|_| false), Some(7));
        assert_eq!(alloc.allocate(|_| false), None);
        assert_eq!(alloc.allocate(|_| false), None);
    }

    #[test]
    fn allocator_reaching_zero_is_exhausted() {
        let mut alloc = StackIdAllocator::new(0, 0);
        assert_eq!(alloc.allocate(|_| false), Some(0));
        assert_eq!(alloc.allocate(|_| false), None);
        assert_eq!(StackIdAllocator::new(1, 5).allocate(|_| false), None);
    }

    #[test]
    fn same_components_share_a_definition() {
        let mut tile_set: TileSet = (0..3).map(|i| (i, TileDefinition::new(0))).collect();
        let mut stacker = TileStacker::new(StackIdAllocator::new(100, 50));

        let a = Gid(1);
        let b = Gid::pack(2, true, false, false);
        let first = stacker.stack(&mut tile_set, a, b).unwrap();
        let second = stacker.stack(&mut tile_set, a, b).unwrap();
        assert_eq!(first, 100);
        assert_eq!(first, second);
        assert_eq!(tile_set[&first].stacked_tiles(), &[a, b]);

        // order matters
        assert_eq!(stacker.stack(&mut tile_set, b, a).unwrap(), 99);
    }

    #[test]
    fn appends_to_an_existing_stack() {
        let mut tile_set: TileSet = (0..3).map(|i| (i, TileDefinition::new(0))).collect();
        let mut stacker = TileStacker::new(StackIdAllocator::new(100, 50));
        let ab = stacker.stack(&mut tile_set, Gid(0), Gid(1)).unwrap();
        let abc = stacker.stack(&mut tile_set, Gid(ab), Gid(2)).unwrap();
        assert_eq!(tile_set[&abc].stacked_tiles(), &[Gid(0), Gid(1), Gid(2)]);
        assert_eq!(tile_set[&abc].stack_tile_id(), Some(abc));
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut tile_set: TileSet = (0..3).map(|i| (i, TileDefinition::new(0))).collect();
        let mut stacker = TileStacker::new(StackIdAllocator::new(1, 0));
        // ids 1 and 0 are real tiles
        assert!(matches!(
            stacker.stack(&mut tile_set, Gid(0), Gid(1)),
            Err(MapError::StackIdsExhausted)
        ));
    }
}
