use crate::gid::{Flips, Gid};

/// A drawing/collision unit of an [`EditableTileMap`](crate::EditableTileMap).
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Tile(TileLayer),
    Object(ObjectLayer),
}

impl Layer {
    pub fn id(&self) -> u32 {
        match self {
            Layer::Tile(l) => l.id,
            Layer::Object(l) => l.id,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Layer::Tile(l) => l.visible,
            Layer::Object(l) => l.visible,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Layer::Tile(l) => l.is_empty(),
            Layer::Object(l) => l.objects.is_empty(),
        }
    }

    pub fn as_tile_layer(&self) -> Option<&TileLayer> {
        match self {
            Layer::Tile(l) => Some(l),
            Layer::Object(_) => None,
        }
    }

    pub fn as_object_layer(&self) -> Option<&ObjectLayer> {
        match self {
            Layer::Object(l) => Some(l),
            Layer::Tile(_) => None,
        }
    }
}

/// Tiles placed with pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLayer {
    pub id: u32,
    pub visible: bool,
    pub objects: Vec<TileObject>,
}

impl ObjectLayer {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            visible: true,
            objects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileObject {
    /// Left side of the tile.
    pub x: f32,
    /// Bottom side of the tile, as Tiled anchors tile objects.
    pub y: f32,
    pub gid: Gid,
}

impl TileObject {
    pub fn tile_id(&self) -> u32 {
        self.gid.bare_id()
    }

    pub fn flips(&self) -> Flips {
        self.gid.flips()
    }
}

/// A dense grid of tiles.
///
/// Cells hold `bare id + 1` with the flip bits on top, so that `0` stays free
/// for "no tile". Every accessor is bounds checked: out of range reads give
/// `None`/`false` and out of range writes are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub id: u32,
    pub visible: bool,
    alpha: f32,
    dim_x: usize,
    dim_y: usize,
    cells: Vec<u32>,
}

impl TileLayer {
    pub fn new(id: u32, dim_x: usize, dim_y: usize) -> Self {
        Self {
            id,
            visible: true,
            alpha: 1.0,
            dim_x,
            dim_y,
            cells: vec![0; dim_x * dim_y],
        }
    }

    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    pub fn dim_y(&self) -> usize {
        self.dim_y
    }

    /// Opacity between 0 and 1.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.dim_x && y < self.dim_y).then(|| y * self.dim_x + x)
    }

    /// The packed gid (index + flips) at a cell.
    pub fn tile_gid(&self, x: usize, y: usize) -> Option<Gid> {
        let cell = self.cells[self.index(x, y)?];
        if cell == 0 {
            return None;
        }
        let stored = Gid(cell);
        Some(Gid::with_flips(stored.bare_id().wrapping_sub(1), stored.flips()))
    }

    pub fn tile_id(&self, x: usize, y: usize) -> Option<u32> {
        self.tile_gid(x, y).map(Gid::bare_id)
    }

    /// Places `gid`, flips included.
    pub fn set_tile_gid(&mut self, x: usize, y: usize, gid: Gid) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Gid::with_flips(gid.bare_id().wrapping_add(1), gid.flips()).raw();
        }
    }

    /// Places an unflipped tile, clearing previous flips.
    pub fn set_tile(&mut self, x: usize, y: usize, tile_id: u32) {
        self.set_tile_gid(x, y, Gid::pack(tile_id, false, false, false));
    }

    pub fn remove_tile(&mut self, x: usize, y: usize) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = 0;
        }
    }

    fn update_flip(&mut self, x: usize, y: usize, update: impl FnOnce(Gid) -> Gid) {
        if let Some(i) = self.index(x, y) {
            if self.cells[i] != 0 {
                self.cells[i] = update(Gid(self.cells[i])).raw();
            }
        }
    }

    pub fn set_flipped_horizontally(&mut self, x: usize, y: usize, flipped: bool) {
        self.update_flip(x, y, |g| g.with_flipped_horizontally(flipped));
    }

    pub fn set_flipped_vertically(&mut self, x: usize, y: usize, flipped: bool) {
        self.update_flip(x, y, |g| g.with_flipped_vertically(flipped));
    }

    pub fn set_flipped_diagonally(&mut self, x: usize, y: usize, flipped: bool) {
        self.update_flip(x, y, |g| g.with_flipped_diagonally(flipped));
    }

    pub fn flips(&self, x: usize, y: usize) -> Flips {
        self.index(x, y)
            .map(|i| Gid(self.cells[i]).flips())
            .unwrap_or_default()
    }

    pub fn is_flipped_horizontally(&self, x: usize, y: usize) -> bool {
        self.flips(x, y).horizontal
    }

    pub fn is_flipped_vertically(&self, x: usize, y: usize) -> bool {
        self.flips(x, y).vertical
    }

    pub fn is_flipped_diagonally(&self, x: usize, y: usize) -> bool {
        self.flips(x, y).diagonal
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    /// Occupied cells as `(x, y, gid)`, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, usize, Gid)> + '_ {
        (0..self.dim_y).flat_map(move |y| {
            (0..self.dim_x).filter_map(move |x| self.tile_gid(x, y).map(|gid| (x, y, gid)))
        })
    }
}
