//! Avatar animation module
//!
//! Maps extracted face signals onto a rig: blendshape resolution,
//! expression and head pose smoothing, and the pose snapshot type.

pub mod expression;
pub mod head;
pub mod rig;
pub mod state;

pub use expression::ExpressionMapper;
pub use head::HeadPoseMapper;
pub use rig::{AvatarRig, BlendChannel, BlendMap, PoseRig};
pub use state::AvatarPose;
