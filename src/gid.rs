//! Global tile ids: a bare tile index packed with three flip bits.
//!
//! Bit positions are the ones Tiled uses in TMX/JSON; LDtk tiles are
//! translated into the same layout by the LDtk loader.

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits

/// A tile index with its flip flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Gid(pub u32);

/// The three flip flags of a [`Gid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flips {
    pub horizontal: bool,
    pub vertical: bool,
    pub diagonal: bool,
}

impl Flips {
    pub const NONE: Flips = Flips {
        horizontal: false,
        vertical: false,
        diagonal: false,
    };

    /// LDtk stores flips as a 2 bit code: 1 = X, 2 = Y, 3 = both.
    /// LDtk has no diagonal flip.
    pub fn from_ldtk(code: u8) -> Self {
        Flips {
            horizontal: code == 1 || code == 3,
            vertical: code == 2 || code == 3,
            diagonal: false,
        }
    }
}

impl Gid {
    /// Tile indices wider than 29 bits are truncated.
    #[inline]
    pub fn pack(tile_index: u32, flip_h: bool, flip_v: bool, flip_d: bool) -> Self {
        let mut raw = tile_index & GID_MASK;
        if flip_h {
            raw |= FLIP_H;
        }
        if flip_v {
            raw |= FLIP_V;
        }
        if flip_d {
            raw |= FLIP_D;
        }
        Gid(raw)
    }

    #[inline]
    pub fn with_flips(tile_index: u32, flips: Flips) -> Self {
        Self::pack(tile_index, flips.horizontal, flips.vertical, flips.diagonal)
    }

    #[inline]
    pub fn unpack(self) -> (u32, bool, bool, bool) {
        (
            self.bare_id(),
            self.is_flipped_horizontally(),
            self.is_flipped_vertically(),
            self.is_flipped_diagonally(),
        )
    }

    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn bare_id(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn is_flipped_horizontally(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn is_flipped_vertically(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn is_flipped_diagonally(self) -> bool { (self.0 & FLIP_D) != 0 }

    #[inline]
    pub fn flips(self) -> Flips {
        Flips {
            horizontal: self.is_flipped_horizontally(),
            vertical: self.is_flipped_vertically(),
            diagonal: self.is_flipped_diagonally(),
        }
    }

    #[inline]
    pub fn with_flipped_horizontally(self, flipped: bool) -> Self {
        Gid(set_bit(self.0, FLIP_H, flipped))
    }

    #[inline]
    pub fn with_flipped_vertically(self, flipped: bool) -> Self {
        Gid(set_bit(self.0, FLIP_V, flipped))
    }

    #[inline]
    pub fn with_flipped_diagonally(self, flipped: bool) -> Self {
        Gid(set_bit(self.0, FLIP_D, flipped))
    }
}

#[inline]
fn set_bit(raw: u32, bit: u32, on: bool) -> u32 {
    if on {
        raw | bit
    } else {
        raw & !bit
    }
}

/// Tiled global ids are 1-based, `0` meaning "no tile".
#[inline]
pub fn tile_index_from_tiled(global_id: u32) -> Option<u32> {
    global_id.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_flip_combination() {
        let samples = [0, 1, 7, 0xFFFF, 0x0FFF_FFFF, GID_MASK];
        for &index in &samples {
            for bits in 0..8u8 {
                let (h, v, d) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
                let gid = Gid::pack(index, h, v, d);
                assert_eq!(gid.unpack(), (index, h, v, d));
            }
        }
    }

    #[test]
    fn flags_use_tiled_bit_positions() {
        assert_eq!(Gid::pack(5, true, false, false).raw(), 0x8000_0005);
        assert_eq!(Gid::pack(5, false, true, false).raw(), 0x4000_0005);
        assert_eq!(Gid::pack(5, false, false, true).raw(), 0x2000_0005);
        assert_eq!(Gid(0xE000_0003).bare_id(), 3);
    }

    #[test]
    fn setters_clear_and_set_single_bits() {
        let gid = Gid::pack(9, true, true, true);
        let cleared = gid.with_flipped_vertically(false);
        assert_eq!(cleared.unpack(), (9, true, false, true));
        assert_eq!(cleared.with_flipped_vertically(true), gid);
    }

    #[test]
    fn ldtk_flip_codes() {
        assert_eq!(Flips::from_ldtk(0), Flips::NONE);
        assert!(Flips::from_ldtk(1).horizontal && !Flips::from_ldtk(1).vertical);
        assert!(!Flips::from_ldtk(2).horizontal && Flips::from_ldtk(2).vertical);
        assert!(Flips::from_ldtk(3).horizontal && Flips::from_ldtk(3).vertical);
    }

    #[test]
    fn tiled_offset() {
        assert_eq!(tile_index_from_tiled(0), None);
        assert_eq!(tile_index_from_tiled(1), Some(0));
    }
}
