use crate::gid::Flips;
use macroquad::prelude::{vec2, Vec2};
use thiserror::Error;

/// Ordered vertices in local tile space (or world space once transformed).
pub type Polygon = Vec<Vec2>;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("polygon has no vertices")]
    Empty,
    #[error("vertex {index} is not finite")]
    NonFinite { index: usize },
}

/// Polygon vertices relative to `origin`, rotated by `rotation` degrees
/// around it.
///
/// `cos`/`sin` are snapped to exactly `0` when the other one is `±1`, so a
/// quarter-turn rotation does not leave `1e-16` residue in the result.
pub fn rotated_polygon(origin: Vec2, points: &[Vec2], rotation: f32) -> Result<Polygon, GeometryError> {
    if points.is_empty() {
        return Err(GeometryError::Empty);
    }
    let (cos, sin) = snapped_cos_sin(rotation);
    let (ox, oy) = (origin.x as f64, origin.y as f64);
    let polygon: Polygon = points
        .iter()
        .map(|p| {
            let (px, py) = (p.x as f64, p.y as f64);
            vec2(
                (ox + px * cos - py * sin) as f32,
                (oy + px * sin + py * cos) as f32,
            )
        })
        .collect();
    check_finite(polygon)
}

pub fn snapped_cos_sin(rotation: f32) -> (f64, f64) {
    let angle = (rotation as f64).to_radians();
    let mut cos = angle.cos();
    let mut sin = angle.sin();
    if cos == 1.0 || cos == -1.0 {
        sin = 0.0;
    }
    if sin == 1.0 || sin == -1.0 {
        cos = 0.0;
    }
    (cos, sin)
}

/// Corners of an axis aligned rectangle, clockwise from the top-left in a
/// y-down space: `(x,y) (x,y+h) (x+w,y+h) (x+w,y)`.
pub fn rectangle(x: f32, y: f32, width: f32, height: f32) -> Result<Polygon, GeometryError> {
    check_finite(vec![
        vec2(x, y),
        vec2(x, y + height),
        vec2(x + width, y + height),
        vec2(x + width, y),
    ])
}

fn check_finite(polygon: Polygon) -> Result<Polygon, GeometryError> {
    match polygon.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(GeometryError::NonFinite { index }),
        None => Ok(polygon),
    }
}

/// Applies a tile's flips to one of its local hitbox polygons.
///
/// The diagonal flip swaps the axes the two other flips refer to, so it has
/// to be applied first.
pub fn transform_polygon(polygon: &[Vec2], flips: Flips, tile_width: f32, tile_height: f32) -> Polygon {
    polygon
        .iter()
        .map(|&v| transform_vertex(v, flips, tile_width, tile_height))
        .collect()
}

#[inline]
pub fn transform_vertex(v: Vec2, flips: Flips, tile_width: f32, tile_height: f32) -> Vec2 {
    let (mut x, mut y) = (v.x, v.y);
    if flips.diagonal {
        std::mem::swap(&mut x, &mut y);
    }
    if flips.horizontal {
        x = tile_width - x;
    }
    if flips.vertical {
        y = tile_height - y;
    }
    vec2(x, y)
}
