//! Movement results and axis-separated sliding

use glam::Vec2;

use super::body::BodyKey;
use super::world::PhysicsWorld;

/// Outcome of a single `move_body` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Movement {
    /// The whole delta was applied
    Free,
    /// Only `fraction` of the delta was applied
    Partial { fraction: f32 },
    /// Nothing was applied
    Blocked,
}

impl Movement {
    pub fn from_fraction(fraction: f32) -> Self {
        if fraction >= 1.0 {
            Movement::Free
        } else if fraction <= 0.0 {
            Movement::Blocked
        } else {
            Movement::Partial { fraction }
        }
    }

    /// Fraction of the requested delta that was applied
    pub fn fraction(&self) -> f32 {
        match *self {
            Movement::Free => 1.0,
            Movement::Partial { fraction } => fraction,
            Movement::Blocked => 0.0,
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(self, Movement::Free)
    }

    /// True if anything stopped the move short
    #[inline]
    pub fn was_obstructed(&self) -> bool {
        !self.is_free()
    }
}

/// Per-axis result of [`PhysicsWorld::slide_move`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trace {
    /// The horizontal component was fully applied
    pub horz: bool,
    /// The vertical component was fully applied
    pub vert: bool,
}

impl PhysicsWorld {
    /// Move along X, then along Y.
    ///
    /// Each axis is resolved on its own, so a body pressed into a wall keeps
    /// sliding along it.
    pub fn slide_move(&mut self, key: BodyKey, delta: Vec2) -> Trace {
        let horz = self.move_body(key, Vec2::new(delta.x, 0.0)).is_free();
        let vert = self.move_body(key, Vec2::new(0.0, delta.y)).is_free();
        Trace { horz, vert }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_from_fraction() {
        assert_eq!(Movement::from_fraction(1.0), Movement::Free);
        assert_eq!(Movement::from_fraction(0.0), Movement::Blocked);
        assert_eq!(
            Movement::from_fraction(0.25),
            Movement::Partial { fraction: 0.25 }
        );
        assert_eq!(Movement::Partial { fraction: 0.25 }.fraction(), 0.25);
        assert!(Movement::Blocked.was_obstructed());
        assert!(!Movement::Free.was_obstructed());
    }
}
