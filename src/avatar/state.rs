//! Avatar pose snapshot
//!
//! One fully-resolved animation frame: blendshape weights keyed by rig
//! name plus the head bone rotation. Snapshots are cheap to clone and
//! are fanned out to consumers over a broadcast channel.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single frame of avatar animation output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AvatarPose {
    /// Rig blendshape name → weight (0.0 - 1.0)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    blend_weights: HashMap<String, f32>,
    /// Head rotation (pitch, yaw, roll) in radians
    head_rotation: [f32; 3],
    /// Whether a face was tracked when this pose was produced
    tracked: bool,
    /// Capture timestamp of the driving frame in milliseconds
    timestamp_ms: u64,
}

impl AvatarPose {
    /// Get one blendshape weight, if it has been written
    pub fn blend_weight(&self, name: &str) -> Option<f32> {
        self.blend_weights.get(name).copied()
    }

    /// Get the full blendshape weight map
    pub fn blend_weights(&self) -> &HashMap<String, f32> {
        &self.blend_weights
    }

    /// Get the head rotation (pitch, yaw, roll) in radians
    pub fn head_rotation(&self) -> [f32; 3] {
        self.head_rotation
    }

    /// Whether a face was tracked for this pose
    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    /// Capture timestamp of the driving frame
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Set one blendshape weight, clamped to `[0, 1]`
    pub fn set_blend_weight(&mut self, name: &str, value: f32) {
        self.blend_weights
            .insert(name.to_string(), value.clamp(0.0, 1.0));
    }

    /// Set the head rotation (pitch, yaw, roll) in radians
    pub fn set_head_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.head_rotation = [pitch, yaw, roll];
    }

    /// Create a copy with the tracked flag changed
    pub fn with_tracked(mut self, tracked: bool) -> Self {
        self.tracked = tracked;
        self
    }

    /// Create a copy with the timestamp changed
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}
