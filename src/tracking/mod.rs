//! Tracking module
//!
//! Landmark acquisition and interpretation:
//! - JSON-over-UDP feed from the MediaPipe tracker helper
//! - raw landmark containers and canonical indices
//! - geometric signal extraction (eyes, mouth, brows, head pose)
//! - tracker subprocess lifecycle

pub mod detector;
pub mod feed;
pub mod geometry;
pub mod landmarks;
pub mod subprocess;
