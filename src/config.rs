use serde::Deserialize;

/// First identifier handed out to stacked tiles, counting down.
pub const DEFAULT_STACK_ID_START: u32 = 0x0FFF_FFFF;
/// Stacked tile identifiers never go below this.
pub const DEFAULT_STACK_ID_FLOOR: u32 = 0x0800_0000;
/// Largest `dim_x * dim_y` a loaded map may have. Every tile layer holds one
/// `u32` per cell.
pub const MAX_MAP_CELLS: u64 = 1 << 26;

/// Knobs for [`TileMapFile::load`](crate::TileMapFile::load).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// LDtk level to load. Negative values mean the first level. Ignored for
    /// Tiled maps.
    pub level_index: i32,
    pub stack_id_start: u32,
    pub stack_id_floor: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            level_index: 0,
            stack_id_start: DEFAULT_STACK_ID_START,
            stack_id_floor: DEFAULT_STACK_ID_FLOOR,
        }
    }
}

impl LoadOptions {
    pub fn with_level(level_index: i32) -> Self {
        Self {
            level_index,
            ..Self::default()
        }
    }
}
