//! Head pose mapping
//!
//! Smooths yaw, pitch, and roll estimates and drives the rig's head
//! bone. Yaw and pitch pass through a dead-zone before smoothing so
//! detector jitter around neutral does not wobble the head.

use kagami_smooth::{apply_deadzone, ExpSmoother};

use crate::avatar::rig::AvatarRig;
use crate::config::TuningConfig;
use crate::tracking::geometry::FaceSignals;

/// Smoothed head rotation state
pub struct HeadPoseMapper {
    pitch: ExpSmoother,
    yaw: ExpSmoother,
    roll: ExpSmoother,
    deadzone: f32,
}

impl HeadPoseMapper {
    pub fn new(tuning: &TuningConfig) -> Self {
        Self {
            pitch: ExpSmoother::new(tuning.head_alpha),
            yaw: ExpSmoother::new(tuning.head_alpha),
            roll: ExpSmoother::new(tuning.head_alpha),
            deadzone: tuning.head_deadzone,
        }
    }

    /// Fold one frame of pose signals in and write the head rotation.
    ///
    /// Nothing is written until at least one axis has produced data;
    /// after that, missing axes hold their last smoothed value.
    pub fn apply(&mut self, signals: &FaceSignals, rig: &mut dyn AvatarRig) {
        if let Some(raw) = signals.pitch {
            self.pitch.update(apply_deadzone(raw, self.deadzone));
        }
        if let Some(raw) = signals.yaw {
            self.yaw.update(apply_deadzone(raw, self.deadzone));
        }
        if let Some(raw) = signals.roll {
            self.roll.update(raw);
        }

        let any = self.pitch.value().is_some()
            || self.yaw.value().is_some()
            || self.roll.value().is_some();
        if any {
            rig.set_bone_rotation(
                self.pitch.value_or(0.0),
                self.yaw.value_or(0.0),
                self.roll.value_or(0.0),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::rig::PoseRig;

    #[test]
    fn test_deadzone_zeroes_jitter() {
        let tuning = TuningConfig::default();
        let mut rig = PoseRig::new(&["jawOpen"]);
        let mut mapper = HeadPoseMapper::new(&tuning);

        // Both below the 0.02 dead-zone
        let signals = FaceSignals {
            yaw: Some(0.01),
            pitch: Some(-0.015),
            roll: Some(0.0),
            ..Default::default()
        };
        mapper.apply(&signals, &mut rig);
        assert_eq!(rig.pose().head_rotation(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rotation_written_above_deadzone() {
        let tuning = TuningConfig::default();
        let mut rig = PoseRig::new(&["jawOpen"]);
        let mut mapper = HeadPoseMapper::new(&tuning);

        let signals = FaceSignals {
            yaw: Some(0.4),
            pitch: Some(-0.3),
            roll: Some(0.1),
            ..Default::default()
        };
        mapper.apply(&signals, &mut rig);

        // First samples snap straight through
        let [pitch, yaw, roll] = rig.pose().head_rotation();
        assert!((pitch - -0.3).abs() < 1e-6);
        assert!((yaw - 0.4).abs() < 1e-6);
        assert!((roll - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_no_write_before_any_pose_signal() {
        let tuning = TuningConfig::default();
        let mut rig = PoseRig::new(&["jawOpen"]);
        let mut mapper = HeadPoseMapper::new(&tuning);

        mapper.apply(&FaceSignals::default(), &mut rig);
        assert_eq!(rig.pose().head_rotation(), [0.0, 0.0, 0.0]);

        // After real data, a signal-less frame keeps the last rotation
        let signals = FaceSignals {
            yaw: Some(0.4),
            ..Default::default()
        };
        mapper.apply(&signals, &mut rig);
        mapper.apply(&FaceSignals::default(), &mut rig);
        assert!((rig.pose().head_rotation()[1] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_smoothing_steps_toward_target() {
        let tuning = TuningConfig::default();
        let mut rig = PoseRig::new(&["jawOpen"]);
        let mut mapper = HeadPoseMapper::new(&tuning);

        let zero = FaceSignals {
            yaw: Some(0.0),
            ..Default::default()
        };
        let one = FaceSignals {
            yaw: Some(1.0),
            ..Default::default()
        };
        mapper.apply(&zero, &mut rig);
        mapper.apply(&one, &mut rig);

        // One smoothing step at head_alpha from 0 toward 1
        let got = rig.pose().head_rotation()[1];
        assert!((got - tuning.head_alpha).abs() < 1e-6, "got {}", got);
    }
}
