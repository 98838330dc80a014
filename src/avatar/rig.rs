//! Avatar rig abstraction and blendshape name resolution.
//!
//! Rigs disagree on blendshape naming: ARKit-style `eyeBlinkLeft`,
//! VRM-style `Blink_L`, snake_case exports, and so on. Each semantic
//! channel carries an ordered list of candidate name sets; resolution
//! picks the first set whose names are all present on the rig and is
//! done once per rig, not per frame.

use std::collections::{HashMap, HashSet};

use crate::avatar::state::AvatarPose;

/// A bindable avatar rig.
///
/// Rotations are in radians. Implementations ignore writes to
/// blendshape names they do not carry.
pub trait AvatarRig {
    /// Blendshape names this rig exposes
    fn blend_names(&self) -> Vec<String>;

    /// Set one blendshape weight, expected in `[0, 1]`
    fn set_blend_weight(&mut self, name: &str, value: f32);

    /// Set the head bone rotation (pitch, yaw, roll)
    fn set_bone_rotation(&mut self, pitch: f32, yaw: f32, roll: f32);
}

/// Semantic blendshape channels driven by face tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendChannel {
    LeftEyeBlink,
    RightEyeBlink,
    MouthOpen,
    Smile,
    BrowRaise,
}

impl BlendChannel {
    pub const ALL: [BlendChannel; 5] = [
        BlendChannel::LeftEyeBlink,
        BlendChannel::RightEyeBlink,
        BlendChannel::MouthOpen,
        BlendChannel::Smile,
        BlendChannel::BrowRaise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlendChannel::LeftEyeBlink => "left_eye_blink",
            BlendChannel::RightEyeBlink => "right_eye_blink",
            BlendChannel::MouthOpen => "mouth_open",
            BlendChannel::Smile => "smile",
            BlendChannel::BrowRaise => "brow_raise",
        }
    }

    /// Candidate name sets, most preferred first.
    ///
    /// A set matches only when every name in it exists on the rig, so a
    /// split channel like smile left/right is driven as a pair or not
    /// at all.
    pub fn aliases(&self) -> &'static [&'static [&'static str]] {
        match self {
            BlendChannel::LeftEyeBlink => &[
                &["eyeBlinkLeft"],
                &["EyeBlinkLeft"],
                &["eye_blink_left"],
                &["Blink_L"],
            ],
            BlendChannel::RightEyeBlink => &[
                &["eyeBlinkRight"],
                &["EyeBlinkRight"],
                &["eye_blink_right"],
                &["Blink_R"],
            ],
            BlendChannel::MouthOpen => &[&["jawOpen"], &["mouthOpen"], &["JawOpen"], &["A"]],
            BlendChannel::Smile => &[
                &["mouthSmileLeft", "mouthSmileRight"],
                &["mouthSmile"],
                &["smile"],
                &["Joy"],
            ],
            BlendChannel::BrowRaise => &[
                &["browInnerUp"],
                &["browOuterUpLeft", "browOuterUpRight"],
                &["browRaise"],
            ],
        }
    }
}

/// Channel-to-rig-name resolution, computed once at bind time.
#[derive(Debug, Clone, Default)]
pub struct BlendMap {
    resolved: HashMap<BlendChannel, Vec<String>>,
}

impl BlendMap {
    /// Resolve every channel against the rig's declared blendshapes.
    pub fn resolve(rig: &dyn AvatarRig) -> Self {
        let available: HashSet<String> = rig.blend_names().into_iter().collect();
        let mut resolved = HashMap::new();

        for channel in BlendChannel::ALL {
            let hit = channel
                .aliases()
                .iter()
                .find(|set| set.iter().all(|name| available.contains(*name)));

            match hit {
                Some(set) => {
                    resolved.insert(channel, set.iter().map(|s| s.to_string()).collect());
                }
                None => {
                    tracing::debug!(
                        "no blendshape match for channel '{}' on this rig",
                        channel.as_str()
                    );
                }
            }
        }

        Self { resolved }
    }

    /// Write a value to every rig name behind a channel.
    ///
    /// Unresolved channels are skipped without error so a rig missing a
    /// shape key still animates everything else.
    pub fn write(&self, rig: &mut dyn AvatarRig, channel: BlendChannel, value: f32) {
        if let Some(names) = self.resolved.get(&channel) {
            let clamped = value.clamp(0.0, 1.0);
            for name in names {
                rig.set_blend_weight(name, clamped);
            }
        }
    }

    /// Rig names a channel resolved to, if any
    pub fn names(&self, channel: BlendChannel) -> Option<&[String]> {
        self.resolved.get(&channel).map(|v| v.as_slice())
    }

    pub fn is_resolved(&self, channel: BlendChannel) -> bool {
        self.resolved.contains_key(&channel)
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}

/// Rig implementation backed by an [`AvatarPose`].
///
/// Declares a fixed set of blendshape names and drops writes to any
/// name outside it, mirroring how a real rig ignores unknown keys.
#[derive(Debug, Clone)]
pub struct PoseRig {
    names: HashSet<String>,
    pose: AvatarPose,
}

impl PoseRig {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            names: names.iter().map(|s| s.as_ref().to_string()).collect(),
            pose: AvatarPose::default(),
        }
    }

    /// Current pose snapshot
    pub fn pose(&self) -> &AvatarPose {
        &self.pose
    }
}

impl AvatarRig for PoseRig {
    fn blend_names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    fn set_blend_weight(&mut self, name: &str, value: f32) {
        if self.names.contains(name) {
            self.pose.set_blend_weight(name, value);
        }
    }

    fn set_bone_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.pose.set_head_rotation(pitch, yaw, roll);
    }
}
