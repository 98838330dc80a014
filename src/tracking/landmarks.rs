//! Landmark types and anatomical index constants.
//!
//! Landmarks are normalized image coordinates: `x` grows rightward,
//! `y` grows downward, both in `[0, 1]` relative to frame dimensions.
//! `z` is relative depth where the detector provides it. Detections are
//! immutable snapshots, replaced wholesale each frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of points in a full face detection
pub const FACE_LANDMARK_COUNT: usize = 468;
/// Number of points in a hand detection
pub const HAND_LANDMARK_COUNT: usize = 21;

/// A single normalized keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn pos2(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<[f32; 3]> for Landmark {
    fn from(p: [f32; 3]) -> Self {
        Self {
            x: p[0],
            y: p[1],
            z: p[2],
        }
    }
}

/// One face detection: up to [`FACE_LANDMARK_COUNT`] indexed points
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceLandmarks {
    points: Vec<Landmark>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn from_raw(raw: &[[f32; 3]]) -> Self {
        Self {
            points: raw.iter().map(|&p| Landmark::from(p)).collect(),
        }
    }

    /// Point at an anatomical index, or `None` if the detection is short
    pub fn point(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    /// 2D position at an anatomical index
    pub fn pos2(&self, index: usize) -> Option<Vec2> {
        self.point(index).map(|p| p.pos2())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One hand detection: up to [`HAND_LANDMARK_COUNT`] indexed points
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandLandmarks {
    points: Vec<Landmark>,
}

impl HandLandmarks {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn from_raw(raw: &[[f32; 3]]) -> Self {
        Self {
            points: raw.iter().map(|&p| Landmark::from(p)).collect(),
        }
    }

    pub fn point(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub fn pos2(&self, index: usize) -> Option<Vec2> {
        self.point(index).map(|p| p.pos2())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Face landmark indices (468-point face mesh topology).
///
/// "Left"/"right" are the subject's left/right as seen in the mirrored
/// camera image, matching what the tracker emits.
pub mod face {
    pub const NOSE_TIP: usize = 1;

    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_UPPER_1: usize = 159;
    pub const LEFT_EYE_UPPER_2: usize = 158;
    pub const LEFT_EYE_LOWER_1: usize = 145;
    pub const LEFT_EYE_LOWER_2: usize = 153;

    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_UPPER_1: usize = 386;
    pub const RIGHT_EYE_UPPER_2: usize = 385;
    pub const RIGHT_EYE_LOWER_1: usize = 374;
    pub const RIGHT_EYE_LOWER_2: usize = 380;

    pub const MOUTH_LEFT: usize = 61;
    pub const MOUTH_RIGHT: usize = 291;
    pub const UPPER_LIP_INNER: usize = 13;
    pub const LOWER_LIP_INNER: usize = 14;
    pub const UPPER_LIP_OUTER: usize = 0;
    pub const LOWER_LIP_OUTER: usize = 17;

    pub const LEFT_BROW: usize = 105;
    pub const RIGHT_BROW: usize = 334;
}

/// Hand landmark indices (21-point hand topology, wrist first)
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;

    /// Fingertips other than the thumb, in anatomical order
    pub const FINGER_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
}
