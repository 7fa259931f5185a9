//! Axis-aligned rectangles
//!
//! A rectangle is a position (bottom-left corner, y-up) plus a size.
//! Overlap is strict: rectangles that only share an edge do not overlap,
//! and a rectangle with zero width or height overlaps nothing.

use std::ops::{Add, Sub};

use glam::Vec2;

/// Width and height of a rectangle
pub type Size = Vec2;

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Bottom-left corner
    pub pos: Vec2,
    /// Extent along each axis (never negative for a body footprint)
    pub size: Size,
}

impl Rect {
    pub const fn new(pos: Vec2, size: Size) -> Self {
        Self { pos, size }
    }

    pub fn from_coords(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(width, height))
    }

    /// Bottom-left corner
    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    /// Top-right corner
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    #[inline]
    pub fn half_size(&self) -> Vec2 {
        self.size * 0.5
    }

    /// True when the rectangle has no area
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let min = self.min().min(other.min());
        let max = self.max().max(other.max());
        Rect::new(min, max - min)
    }

    /// Region covered while translating by `delta`
    pub fn swept(&self, delta: Vec2) -> Rect {
        self.union(&(*self + delta))
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        overlaps(self, other)
    }
}

impl Add<Vec2> for Rect {
    type Output = Rect;

    fn add(self, delta: Vec2) -> Rect {
        Rect::new(self.pos + delta, self.size)
    }
}

impl Sub<Vec2> for Rect {
    type Output = Rect;

    fn sub(self, delta: Vec2) -> Rect {
        Rect::new(self.pos - delta, self.size)
    }
}

/// Strict overlap of the open segments [a_min, a_max) and [b_min, b_max).
///
/// Empty segments never overlap.
#[inline]
pub fn segments_overlap(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> bool {
    if a_max <= a_min || b_max <= b_min {
        return false;
    }
    a_min < b_max && b_min < a_max
}

/// Strict rectangle overlap, symmetric in its arguments
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());
    segments_overlap(a_min.x, a_max.x, b_min.x, b_max.x)
        && segments_overlap(a_min.y, a_max.y, b_min.y, b_max.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_basic() {
        let a = Rect::from_coords(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_coords(5.0, 5.0, 10.0, 10.0);
        let c = Rect::from_coords(20.0, 0.0, 1.0, 1.0);
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
        assert!(!overlaps(&a, &c));
        assert!(overlaps(&a, &a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::from_coords(0.0, 0.0, 10.0, 10.0);
        let right = Rect::from_coords(10.0, 0.0, 5.0, 5.0);
        let above = Rect::from_coords(2.0, 10.0, 5.0, 5.0);
        assert!(!overlaps(&a, &right));
        assert!(!overlaps(&a, &above));
    }

    #[test]
    fn test_degenerate_rect_overlaps_nothing() {
        let a = Rect::from_coords(0.0, 0.0, 10.0, 10.0);
        let line = Rect::from_coords(5.0, 0.0, 0.0, 10.0);
        let flat = Rect::from_coords(0.0, 5.0, 10.0, 0.0);
        assert!(!overlaps(&a, &line));
        assert!(!overlaps(&line, &a));
        assert!(!overlaps(&flat, &a));
        assert!(!overlaps(&line, &line));
    }

    #[test]
    fn test_negative_coordinates() {
        let a = Rect::from_coords(-10.0, -10.0, 5.0, 5.0);
        let b = Rect::from_coords(-6.0, -6.0, 5.0, 5.0);
        assert!(overlaps(&a, &b));
    }

    #[test]
    fn test_union_and_swept() {
        let a = Rect::from_coords(0.0, 0.0, 2.0, 2.0);
        let swept = a.swept(Vec2::new(5.0, -3.0));
        assert_eq!(swept, Rect::from_coords(0.0, -3.0, 7.0, 5.0));
    }

    #[test]
    fn test_translation_ops() {
        let a = Rect::from_coords(1.0, 2.0, 3.0, 4.0);
        let moved = a + Vec2::new(1.0, 1.0);
        assert_eq!(moved.pos, Vec2::new(2.0, 3.0));
        assert_eq!(moved.size, a.size);
        assert_eq!(moved - Vec2::new(1.0, 1.0), a);
        assert_eq!(a.center(), Vec2::new(2.5, 4.0));
    }
}
