//! Simulation layer
//!
//! Everything that decides where bodies end up. This module must stay
//! deterministic:
//! - Movement is kinematic, gameplay supplies every delta
//! - Sweeps and queries visit bodies in registration order
//! - No rendering or platform dependencies

pub mod body;
pub mod motion;
pub mod rect;
pub mod shape;
pub mod spatial_hash;
pub mod world;

pub use body::{Body, BodyKey, CollisionHandler, Contact};
pub use motion::{Movement, Trace};
pub use rect::{Rect, Size, overlaps, segments_overlap};
pub use shape::{
    CustomShape, Shape, TileMap, Transform, bisect_free_fraction, march_free_fraction,
    raycast_against_aabb, raycast_box,
};
pub use spatial_hash::SpatialHash;
pub use world::PhysicsWorld;
