//! Bodies and contacts
//!
//! A body is an axis-aligned box moved kinematically by gameplay code. The
//! world owns every body; gameplay holds a [`BodyKey`] and reads position and
//! size back each frame. Position and size only change through the world so
//! the broad-phase index stays in sync.

use std::rc::Rc;

use glam::Vec2;

use super::rect::{Rect, Size};
use super::shape::{Shape, Transform};
use crate::consts::{ALL_GROUPS, DEFAULT_GROUP};

slotmap::new_key_type! {
    /// Generational handle to a body registered with a world
    pub struct BodyKey;
}

/// A collidable body
#[derive(Debug, Clone)]
pub struct Body {
    pos: Vec2,
    size: Size,
    /// Other bodies may be blocked by this one
    pub solid: bool,
    /// Carries bodies resting on it and shoves bodies in its path
    pub pusher: bool,
    /// Set when a pusher could not carry this body the full distance
    pub crushed: bool,
    /// Bitmask identity
    pub collision_group: u32,
    /// Groups this body reacts to
    pub collides_with: u32,
    /// Overrides the plain box solidity of this body
    pub shape: Option<Rc<Shape>>,
    pub(crate) ground: Option<BodyKey>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            size: Vec2::ONE,
            solid: false,
            pusher: false,
            crushed: false,
            collision_group: DEFAULT_GROUP,
            collides_with: ALL_GROUPS,
            shape: None,
            ground: None,
        }
    }
}

impl Body {
    pub fn new(pos: Vec2, size: Size) -> Self {
        debug_assert!(size.x >= 0.0 && size.y >= 0.0, "negative body size {size:?}");
        Self {
            pos,
            size,
            ..Default::default()
        }
    }

    pub fn as_solid(mut self) -> Self {
        self.solid = true;
        self
    }

    pub fn as_pusher(mut self) -> Self {
        self.pusher = true;
        self
    }

    pub fn with_groups(mut self, group: u32, collides_with: u32) -> Self {
        self.collision_group = group;
        self.collides_with = collides_with;
        self
    }

    pub fn with_shape(mut self, shape: Rc<Shape>) -> Self {
        self.shape = Some(shape);
        self
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// World-space footprint
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    /// The solid body this one rests on, if any
    #[inline]
    pub fn ground(&self) -> Option<BodyKey> {
        self.ground
    }

    /// Transform placing this body's shape over its footprint
    pub fn transform(&self) -> Transform {
        Transform::from_rect(&self.rect())
    }

    /// True if `other`'s group is in this body's mask
    #[inline]
    pub fn reacts_to(&self, other: &Body) -> bool {
        self.collides_with & other.collision_group != 0
    }

    /// Solid-material test against this body's shape (its box by default)
    pub fn probe(&self, other: Rect) -> bool {
        match &self.shape {
            Some(shape) => shape.probe(self.transform(), other),
            None => Shape::Box.probe(self.transform(), other),
        }
    }

    /// Fraction of `delta` `other` can travel before touching this body
    pub fn raycast(&self, other: Rect, delta: Vec2) -> f32 {
        match &self.shape {
            Some(shape) => shape.raycast(self.transform(), other, delta),
            None => Shape::Box.raycast(self.transform(), other, delta),
        }
    }

    pub(crate) fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    pub(crate) fn set_size(&mut self, size: Size) {
        self.size = size;
    }
}

/// A collision delivered to a body's handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Body whose handler is running
    pub receiver: BodyKey,
    /// Body it collided with
    pub other: BodyKey,
    /// Collision group of `other`
    pub other_group: u32,
}

/// Per-body collision callback
pub type CollisionHandler = Box<dyn FnMut(&Contact)>;
