//! World settings
//!
//! Tuning that a level or a game may want to change without recompiling.
//! Loaded from JSON; every field falls back to the engine default.

use serde::{Deserialize, Serialize};

use crate::consts::{BUCKET_COUNT, CONTACT_SKIN, GROUND_PROBE_DEPTH, HASH_CELL_SIZE};
use crate::error::{LedgeError, Result};

/// How `move_body` resolves a blocked delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Travel the largest free fraction of the delta
    #[default]
    Swept,
    /// Apply the whole delta or nothing
    Discrete,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::Swept => "swept",
            ResolutionPolicy::Discrete => "discrete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "swept" | "sweep" => Some(ResolutionPolicy::Swept),
            "discrete" => Some(ResolutionPolicy::Discrete),
            _ => None,
        }
    }
}

/// Physics world settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Edge length of a spatial hash cell (world units)
    pub hash_cell_size: f32,
    /// Number of spatial hash buckets
    pub bucket_count: usize,
    /// Height of the probe below a body used to refresh its ground
    pub ground_probe_depth: f32,
    /// Distance a swept move stops short of the contact face
    pub contact_skin: f32,
    /// Movement resolution policy
    pub resolution: ResolutionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hash_cell_size: HASH_CELL_SIZE,
            bucket_count: BUCKET_COUNT,
            ground_probe_depth: GROUND_PROBE_DEPTH,
            contact_skin: CONTACT_SKIN,
            resolution: ResolutionPolicy::Swept,
        }
    }
}

impl Settings {
    /// Default settings with all-or-nothing movement
    pub fn discrete() -> Self {
        Self {
            resolution: ResolutionPolicy::Discrete,
            ..Default::default()
        }
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        log::debug!(
            "Loaded settings: cell={} buckets={} policy={}",
            settings.hash_cell_size,
            settings.bucket_count,
            settings.resolution.as_str()
        );
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.hash_cell_size.is_finite() || self.hash_cell_size <= 0.0 {
            return Err(LedgeError::InvalidSettings(format!(
                "hash_cell_size must be positive, got {}",
                self.hash_cell_size
            )));
        }
        if self.bucket_count == 0 {
            return Err(LedgeError::InvalidSettings(
                "bucket_count must be at least 1".into(),
            ));
        }
        if !self.ground_probe_depth.is_finite() || self.ground_probe_depth <= 0.0 {
            return Err(LedgeError::InvalidSettings(format!(
                "ground_probe_depth must be positive, got {}",
                self.ground_probe_depth
            )));
        }
        // A body resting a skin above a floor must still find it
        if !self.contact_skin.is_finite()
            || self.contact_skin < 0.0
            || self.contact_skin >= self.ground_probe_depth
        {
            return Err(LedgeError::InvalidSettings(format!(
                "contact_skin must be in [0, ground_probe_depth), got {}",
                self.contact_skin
            )));
        }
        Ok(())
    }
}
