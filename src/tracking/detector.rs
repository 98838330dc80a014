//! Detector abstractions over landmark sources.
//!
//! The pipeline never talks to a camera or a tracking backend directly;
//! it asks these traits for landmarks per frame, which keeps the core
//! deterministic and lets tests substitute scripted detections.

use crate::tracking::landmarks::{FaceLandmarks, HandLandmarks};

/// One tick of the capture clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFrame {
    /// Monotonic frame counter from the capture source
    pub seq: u64,
    /// Capture timestamp in milliseconds
    pub timestamp_ms: u64,
}

/// Produces at most one face detection per frame.
pub trait FaceDetector {
    /// `None` means no face was found in this frame, which is normal
    /// data rather than an error.
    fn detect_face(&mut self, frame: &VideoFrame) -> Option<FaceLandmarks>;
}

/// Produces zero or more hand detections per frame.
pub trait HandDetector {
    fn detect_hands(&mut self, frame: &VideoFrame) -> Vec<HandLandmarks>;
}
