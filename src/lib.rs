//! Ledge - kinematic collision for tile-based 2D platformers
//!
//! Core modules:
//! - `sim`: Bodies, shapes, the spatial hash and the physics world
//! - `settings`: Data-driven tuning (hash layout, ground probe, resolution policy)
//! - `error`: Error types
//!
//! The world uses a y-up coordinate system: "below" a body means smaller y.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{LedgeError, Result};
pub use settings::{ResolutionPolicy, Settings};
pub use sim::{
    Body, BodyKey, Contact, CustomShape, Movement, PhysicsWorld, Rect, Shape, TileMap, Trace,
    Transform,
};

/// Engine constants
pub mod consts {
    /// Edge length of one spatial hash cell (world units)
    pub const HASH_CELL_SIZE: f32 = 8.0;
    /// Number of buckets in the spatial hash table
    pub const BUCKET_COUNT: usize = 256;
    /// Odd multipliers spreading cell coordinates over buckets
    pub const HASH_MUL_X: i32 = 92_837_111;
    pub const HASH_MUL_Y: i32 = 689_287_499;

    /// Height of the probe used to find what a body stands on
    pub const GROUND_PROBE_DEPTH: f32 = 1.0 / 64.0;
    /// Halvings used when raycasting a shape that can only be probed
    pub const PROBE_RAYCAST_STEPS: u32 = 24;
    /// Upper bound on path samples when raycasting a shape that can only be probed
    pub const PROBE_MAX_SAMPLES: u32 = 256;
    /// Gap left between a swept body and whatever stopped it
    pub const CONTACT_SKIN: f32 = 1.0 / 512.0;
    /// Contact fractions closer than this count as simultaneous
    pub const CONTACT_TOLERANCE: f32 = 1e-4;

    /// Group given to new bodies
    pub const DEFAULT_GROUP: u32 = 1;
    /// Mask matching every collision group
    pub const ALL_GROUPS: u32 = u32::MAX;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Floor division of a world coordinate into integer cell units.
///
/// Uses floor, not truncation, so -0.5 lands in cell -1.
#[inline]
pub fn cell_coord(value: f32, cell_size: f32) -> i32 {
    (value / cell_size).floor() as i32
}
