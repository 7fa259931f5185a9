//! Solidity shapes
//!
//! A shape answers two questions about another rectangle: does it touch solid
//! material right now (`probe`), and how far along a delta can it travel
//! before it does (`raycast`, a fraction in [0, 1]).
//!
//! Shapes live in the unit square; a [`Transform`] places them in the world.
//! A body's transform maps the unit square onto its footprint.

use std::fmt;
use std::rc::Rc;

use glam::Vec2;

use super::rect::{Rect, overlaps};
use crate::consts::{PROBE_MAX_SAMPLES, PROBE_RAYCAST_STEPS};

/// Maps the unit square onto a world rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate: Vec2,
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    /// Transform mapping the unit square onto `rect`
    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            translate: rect.pos,
            scale: rect.size,
        }
    }

    /// World rectangle covered by the unit square
    pub fn unit_rect(&self) -> Rect {
        Rect::new(self.translate, self.scale)
    }
}

/// User-provided solid geometry (slopes, one-off obstacles)
pub trait CustomShape {
    fn probe(&self, transform: Transform, other: Rect) -> bool;

    /// Defaults to marching `probe` along the path.
    fn raycast(&self, transform: Transform, other: Rect, delta: Vec2) -> f32 {
        march_free_fraction(|rect| self.probe(transform, rect), other, delta)
    }
}

/// Solidity of a body or of the level edifice
#[derive(Clone)]
pub enum Shape {
    /// Solid across the whole unit square
    Box,
    /// Grid of solid cells spread over the unit square
    Tilemap(TileMap),
    /// Solidity callback over rectangles relative to the transform origin
    Predicate(Rc<dyn Fn(Rect) -> bool>),
    Custom(Rc<dyn CustomShape>),
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Box => write!(f, "Box"),
            Shape::Tilemap(map) => f.debug_tuple("Tilemap").field(map).finish(),
            Shape::Predicate(_) => write!(f, "Predicate(..)"),
            Shape::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Shape {
    pub fn predicate(is_solid: impl Fn(Rect) -> bool + 'static) -> Self {
        Shape::Predicate(Rc::new(is_solid))
    }

    pub fn custom(shape: impl CustomShape + 'static) -> Self {
        Shape::Custom(Rc::new(shape))
    }

    /// True if `other` touches solid material
    pub fn probe(&self, transform: Transform, other: Rect) -> bool {
        match self {
            Shape::Box => overlaps(&transform.unit_rect(), &other),
            Shape::Tilemap(map) => map.probe(transform, other),
            Shape::Predicate(is_solid) => is_solid(other - transform.translate),
            Shape::Custom(shape) => shape.probe(transform, other),
        }
    }

    /// Fraction of `delta` that `other` can travel before touching solid material
    pub fn raycast(&self, transform: Transform, other: Rect, delta: Vec2) -> f32 {
        let fraction = match self {
            Shape::Box => raycast_box(transform.unit_rect(), other, delta),
            Shape::Tilemap(map) => map.raycast(transform, other, delta),
            Shape::Predicate(is_solid) => {
                march_free_fraction(|rect| is_solid(rect), other - transform.translate, delta)
            }
            Shape::Custom(shape) => shape.raycast(transform, other, delta),
        };
        fraction.clamp(0.0, 1.0)
    }
}

/// Rectangular grid of solid/empty cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    width: usize,
    height: usize,
    solid: Vec<bool>,
}

impl TileMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            solid: vec![false; width * height],
        }
    }

    /// Build from text rows, `#` is solid. The first row is the top of the map.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut map = Self::new(width, height);
        for (row, line) in rows.iter().enumerate() {
            let y = height - 1 - row;
            for (x, c) in line.chars().enumerate() {
                map.set(x, y, c == '#');
            }
        }
        map
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set(&mut self, x: usize, y: usize, solid: bool) {
        if x < self.width && y < self.height {
            self.solid[y * self.width + x] = solid;
        }
    }

    /// Out-of-range cells are empty
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.solid[y as usize * self.width + x as usize]
    }

    /// World size of one cell under `transform`
    pub fn tile_size(&self, transform: Transform) -> Vec2 {
        transform.scale / Vec2::new(self.width.max(1) as f32, self.height.max(1) as f32)
    }

    pub fn tile_rect(&self, transform: Transform, x: i64, y: i64) -> Rect {
        let tile = self.tile_size(transform);
        Rect::new(transform.translate + Vec2::new(x as f32, y as f32) * tile, tile)
    }

    /// Solid cells whose rect overlaps the cells under `area`
    fn solid_tiles_near(&self, transform: Transform, area: Rect) -> Vec<Rect> {
        let tile = self.tile_size(transform);
        if tile.x <= 0.0 || tile.y <= 0.0 {
            return Vec::new();
        }
        let lo = ((area.min() - transform.translate) / tile).floor();
        let hi = ((area.max() - transform.translate) / tile).floor();
        let x0 = (lo.x as i64).max(0);
        let y0 = (lo.y as i64).max(0);
        let x1 = (hi.x as i64).min(self.width as i64 - 1);
        let y1 = (hi.y as i64).min(self.height as i64 - 1);

        let mut tiles = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.is_solid(x, y) {
                    tiles.push(self.tile_rect(transform, x, y));
                }
            }
        }
        tiles
    }

    pub fn probe(&self, transform: Transform, other: Rect) -> bool {
        self.solid_tiles_near(transform, other)
            .iter()
            .any(|tile| overlaps(tile, &other))
    }

    pub fn raycast(&self, transform: Transform, other: Rect, delta: Vec2) -> f32 {
        self.solid_tiles_near(transform, other.swept(delta))
            .into_iter()
            .map(|tile| raycast_box(tile, other, delta))
            .fold(1.0, f32::min)
    }
}

/// Fraction of `delta` a moving box travels before overlapping `obstacle`
pub fn raycast_box(obstacle: Rect, mover: Rect, delta: Vec2) -> f32 {
    if obstacle.is_degenerate() || mover.is_degenerate() {
        return 1.0;
    }
    raycast_against_aabb(
        mover.center(),
        delta,
        obstacle.center(),
        obstacle.half_size() + mover.half_size(),
    )
}

/// Slab test of the segment `pos..pos + delta` against an open box.
///
/// Returns the fraction of `delta` before the segment enters the box, 1.0 when
/// it never does. Grazing an edge is not a hit. A segment starting inside is
/// blocked (0.0) only if it heads for the center along the axis of shallowest
/// penetration, so embedded boxes can always back out or slide along a face.
pub fn raycast_against_aabb(
    pos: Vec2,
    delta: Vec2,
    obstacle_pos: Vec2,
    obstacle_half_size: Vec2,
) -> f32 {
    let lo = obstacle_pos - obstacle_half_size;
    let hi = obstacle_pos + obstacle_half_size;

    let mut enter = f32::NEG_INFINITY;
    let mut leave = f32::INFINITY;

    for axis in 0..2 {
        let (p, d) = (pos[axis], delta[axis]);
        if d == 0.0 {
            if p <= lo[axis] || p >= hi[axis] {
                return 1.0;
            }
            continue;
        }
        let t1 = (lo[axis] - p) / d;
        let t2 = (hi[axis] - p) / d;
        enter = enter.max(t1.min(t2));
        leave = leave.min(t1.max(t2));
    }

    if enter >= leave || leave <= 0.0 || enter >= 1.0 {
        return 1.0;
    }
    if enter >= 0.0 {
        return enter;
    }

    // Started inside
    let offset = pos - obstacle_pos;
    let depth = obstacle_half_size - offset.abs();
    let shallowest = depth.min_element();
    let deepens =
        (0..2).any(|axis| depth[axis] <= shallowest && delta[axis] * offset[axis] < 0.0);
    if deepens { 0.0 } else { 1.0 }
}

/// Fraction of `delta` a box travels before `blocked` reports solid material.
///
/// Only needs a probe. The path is sampled in steps no longer than the box's
/// smallest side so thin walls are not skipped, then the first blocked step is
/// bisected. A box that starts embedded may only move to a clear target.
pub fn march_free_fraction(blocked: impl Fn(Rect) -> bool, other: Rect, delta: Vec2) -> f32 {
    if delta == Vec2::ZERO || !blocked(other.swept(delta)) {
        return 1.0;
    }
    if blocked(other) {
        return if blocked(other + delta) { 0.0 } else { 1.0 };
    }

    let extent = other.size.min_element();
    let samples = if extent > 0.0 {
        (delta.length() / extent)
            .ceil()
            .clamp(1.0, PROBE_MAX_SAMPLES as f32) as u32
    } else {
        PROBE_MAX_SAMPLES
    };

    let mut free = 0.0_f32;
    for i in 1..=samples {
        let t = i as f32 / samples as f32;
        if blocked(other + delta * t) {
            let (from, span) = (free, t - free);
            let s = bisect_free_fraction(
                |s| blocked(other + delta * (from + span * s)),
                PROBE_RAYCAST_STEPS,
            );
            return from + span * s;
        }
        free = t;
    }
    1.0
}

/// Largest `t` in [0, 1] with `blocked_at(t)` false, found by halving.
///
/// Assumes blocking is monotonic along the path.
pub fn bisect_free_fraction(blocked_at: impl Fn(f32) -> bool, steps: u32) -> f32 {
    if !blocked_at(1.0) {
        return 1.0;
    }
    if blocked_at(0.0) {
        return 0.0;
    }
    let (mut free, mut blocked) = (0.0_f32, 1.0_f32);
    for _ in 0..steps {
        let mid = (free + blocked) * 0.5;
        if blocked_at(mid) {
            blocked = mid;
        } else {
            free = mid;
        }
    }
    free
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_coords(x, y, w, h)
    }

    #[test]
    fn test_raycast_hits_box_ahead() {
        let obstacle = rect(200.0, 5.0, 10.0, 10.0);
        let mover = rect(100.0, 10.0, 1.0, 1.0);
        let t = raycast_box(obstacle, mover, Vec2::new(100.0, 0.0));
        assert!((t - 0.99).abs() < 1e-4);
    }

    #[test]
    fn test_raycast_misses_box_beside_path() {
        let obstacle = rect(200.0, 5.0, 10.0, 10.0);
        // Slides along the top face without entering
        let mover = rect(150.0, 15.0, 1.0, 1.0);
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(100.0, 0.0)), 1.0);
    }

    #[test]
    fn test_raycast_from_touching_position_is_blocked() {
        let obstacle = rect(10.0, 0.0, 5.0, 5.0);
        let mover = rect(9.0, 1.0, 1.0, 1.0);
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(1.0, 0.0)), 0.0);
        // Moving away from a touching obstacle is free
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(-1.0, 0.0)), 1.0);
    }

    #[test]
    fn test_raycast_short_of_obstacle_is_free() {
        let obstacle = rect(10.0, 0.0, 5.0, 5.0);
        let mover = rect(0.0, 1.0, 1.0, 1.0);
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(9.0, 0.0)), 1.0);
    }

    #[test]
    fn test_raycast_diagonal() {
        let obstacle = rect(10.0, 10.0, 10.0, 10.0);
        let mover = rect(0.0, 0.0, 2.0, 2.0);
        let t = raycast_box(obstacle, mover, Vec2::new(16.0, 16.0));
        assert!((t - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_embedded_box_leaves_freely() {
        let obstacle = rect(0.0, 0.0, 10.0, 10.0);
        let mover = rect(8.0, 2.0, 4.0, 4.0);
        // Ends clear of the obstacle
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(20.0, 0.0)), 1.0);
        // Still inside, but backing out along the shallow axis
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(1.0, 0.0)), 1.0);
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(1.0, 2.0)), 1.0);
        // Sliding along the deep axis
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(0.0, 3.0)), 1.0);
        // Pushing deeper through the near face
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(-1.0, 0.0)), 0.0);
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(-1.0, 2.0)), 0.0);
        // Even when the target would be clear on the far side
        assert_eq!(raycast_box(obstacle, mover, Vec2::new(-30.0, 0.0)), 0.0);
    }

    #[test]
    fn test_degenerate_boxes_never_block() {
        let flat = rect(10.0, 0.0, 5.0, 0.0);
        let mover = rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(raycast_box(flat, mover, Vec2::new(20.0, 0.0)), 1.0);
    }

    #[test]
    fn test_bisect_finds_boundary() {
        let t = bisect_free_fraction(|t| t > 0.3, 24);
        assert!((t - 0.3).abs() < 1e-5);
        assert_eq!(bisect_free_fraction(|_| false, 24), 1.0);
        assert_eq!(bisect_free_fraction(|_| true, 24), 0.0);
    }

    #[test]
    fn test_predicate_shape_clamps_at_wall() {
        let wall = Shape::predicate(|r| r.pos.x < 0.0);
        let mover = rect(10.0, 10.0, 1.0, 1.0);
        let t = wall.raycast(Transform::IDENTITY, mover, Vec2::new(-20.0, 0.0));
        assert!((t - 0.5).abs() < 1e-4);
        assert!(wall.probe(Transform::IDENTITY, rect(-1.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_predicate_thin_wall_is_not_skipped() {
        // One tile thick: solid for 0 <= x < 16
        let wall = Shape::predicate(|r| r.pos.x < 16.0 && r.pos.x + r.size.x > 0.0);
        let mover = rect(-20.0, 0.0, 4.0, 4.0);
        let t = wall.raycast(Transform::IDENTITY, mover, Vec2::new(40.0, 0.0));
        assert!((t - 0.4).abs() < 1e-4, "got {t}");
        // Clear path
        let t = wall.raycast(Transform::IDENTITY, mover, Vec2::new(0.0, 40.0));
        assert_eq!(t, 1.0);
    }

    #[test]
    fn test_march_from_embedded_start() {
        let solid = |r: Rect| r.pos.x < 5.0;
        let inside = rect(2.0, 0.0, 1.0, 1.0);
        assert_eq!(march_free_fraction(solid, inside, Vec2::new(10.0, 0.0)), 1.0);
        assert_eq!(march_free_fraction(solid, inside, Vec2::new(1.0, 0.0)), 0.0);
        assert_eq!(march_free_fraction(solid, inside, Vec2::ZERO), 1.0);
    }

    #[test]
    fn test_tilemap_from_rows() {
        let map = TileMap::from_rows(&["#..", "..#"]);
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert!(map.is_solid(0, 1));
        assert!(map.is_solid(2, 0));
        assert!(!map.is_solid(1, 0));
        assert!(!map.is_solid(-1, 0));
        assert!(!map.is_solid(5, 5));
    }

    #[test]
    fn test_tilemap_probe_and_raycast() {
        // 4x2 map of 16-unit tiles, floor along the bottom row
        let map = TileMap::from_rows(&["....", "####"]);
        let tx = Transform {
            translate: Vec2::ZERO,
            scale: Vec2::new(64.0, 32.0),
        };
        let shape = Shape::Tilemap(map);

        assert!(shape.probe(tx, rect(10.0, 10.0, 4.0, 4.0)));
        // Resting exactly on the floor is not a contact
        assert!(!shape.probe(tx, rect(10.0, 16.0, 4.0, 4.0)));

        let t = shape.raycast(tx, rect(10.0, 24.0, 4.0, 4.0), Vec2::new(0.0, -16.0));
        assert!((t - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_custom_shape_default_raycast() {
        // Solid below the diagonal y = x
        struct Slope;
        impl CustomShape for Slope {
            fn probe(&self, transform: Transform, other: Rect) -> bool {
                let local = other.pos - transform.translate;
                local.y < local.x + other.size.x
            }
        }

        let shape = Shape::custom(Slope);
        let mover = rect(0.0, 10.0, 1.0, 1.0);
        let t = shape.raycast(Transform::IDENTITY, mover, Vec2::new(0.0, -10.0));
        // Touches the slope at y = 1
        assert!((t - 0.9).abs() < 1e-3);
    }
}
