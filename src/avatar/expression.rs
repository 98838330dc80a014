//! Face signal to blendshape mapping
//!
//! Smooths the extracted face signals and writes them to the rig's
//! expression channels. Each channel keeps its own smoother so a
//! missing signal holds its last value instead of snapping to zero
//! when the detector drops a landmark for a frame.

use kagami_smooth::ExpSmoother;

use crate::avatar::rig::{AvatarRig, BlendChannel, BlendMap};
use crate::config::TuningConfig;
use crate::tracking::geometry::FaceSignals;

/// Smoothed expression state for one avatar
pub struct ExpressionMapper {
    left_eye: ExpSmoother,
    right_eye: ExpSmoother,
    mouth: ExpSmoother,
    smile: ExpSmoother,
    brow: ExpSmoother,
    smile_damping: f32,
    brow_damping: f32,
}

impl ExpressionMapper {
    pub fn new(tuning: &TuningConfig) -> Self {
        Self {
            left_eye: ExpSmoother::new(tuning.eye_alpha),
            right_eye: ExpSmoother::new(tuning.eye_alpha),
            mouth: ExpSmoother::new(tuning.mouth_alpha),
            smile: ExpSmoother::new(tuning.smile_alpha),
            brow: ExpSmoother::new(tuning.brow_alpha),
            smile_damping: tuning.smile_damping,
            brow_damping: tuning.brow_damping,
        }
    }

    /// Fold one frame of signals into the smoothers and write the
    /// result to the rig.
    ///
    /// Openness signals are inverted into blink weights here: the
    /// extractor reports 1.0 for an open eye, the rig expects 1.0 for
    /// a closed lid. Channels that have never received a signal are
    /// not written at all.
    pub fn apply(&mut self, signals: &FaceSignals, map: &BlendMap, rig: &mut dyn AvatarRig) {
        if let Some(open) = signals.left_eye_open {
            self.left_eye.update(open);
        }
        if let Some(open) = signals.right_eye_open {
            self.right_eye.update(open);
        }
        if let Some(open) = signals.mouth_open {
            self.mouth.update(open);
        }
        if let Some(smile) = signals.smile {
            self.smile.update(smile);
        }
        if let Some(raise) = signals.brow_raise {
            self.brow.update(raise);
        }

        if let Some(open) = self.left_eye.value() {
            map.write(rig, BlendChannel::LeftEyeBlink, 1.0 - open);
        }
        if let Some(open) = self.right_eye.value() {
            map.write(rig, BlendChannel::RightEyeBlink, 1.0 - open);
        }
        if let Some(open) = self.mouth.value() {
            map.write(rig, BlendChannel::MouthOpen, open);
        }
        if let Some(smile) = self.smile.value() {
            map.write(rig, BlendChannel::Smile, smile * self.smile_damping);
        }
        if let Some(raise) = self.brow.value() {
            map.write(rig, BlendChannel::BrowRaise, raise * self.brow_damping);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::rig::PoseRig;

    fn arkit_rig() -> (PoseRig, BlendMap) {
        let rig = PoseRig::new(&[
            "eyeBlinkLeft",
            "eyeBlinkRight",
            "jawOpen",
            "mouthSmileLeft",
            "mouthSmileRight",
            "browInnerUp",
        ]);
        let map = BlendMap::resolve(&rig);
        (rig, map)
    }

    #[test]
    fn test_closed_eye_becomes_full_blink() {
        let tuning = TuningConfig::default();
        let (mut rig, map) = arkit_rig();
        let mut mapper = ExpressionMapper::new(&tuning);

        let signals = FaceSignals {
            left_eye_open: Some(0.0),
            right_eye_open: Some(1.0),
            ..Default::default()
        };
        mapper.apply(&signals, &map, &mut rig);

        assert_eq!(rig.pose().blend_weight("eyeBlinkLeft"), Some(1.0));
        assert_eq!(rig.pose().blend_weight("eyeBlinkRight"), Some(0.0));
    }

    #[test]
    fn test_missing_signal_holds_last_value() {
        let tuning = TuningConfig::default();
        let (mut rig, map) = arkit_rig();
        let mut mapper = ExpressionMapper::new(&tuning);

        let open = FaceSignals {
            mouth_open: Some(0.8),
            ..Default::default()
        };
        mapper.apply(&open, &map, &mut rig);
        assert_eq!(rig.pose().blend_weight("jawOpen"), Some(0.8));

        // Face lost: nothing extracted, mouth must not snap shut
        mapper.apply(&FaceSignals::default(), &map, &mut rig);
        assert_eq!(rig.pose().blend_weight("jawOpen"), Some(0.8));
    }

    #[test]
    fn test_no_writes_before_any_signal() {
        let tuning = TuningConfig::default();
        let (mut rig, map) = arkit_rig();
        let mut mapper = ExpressionMapper::new(&tuning);

        mapper.apply(&FaceSignals::default(), &map, &mut rig);
        assert!(rig.pose().blend_weights().is_empty());
    }

    #[test]
    fn test_smile_is_damped() {
        let tuning = TuningConfig::default();
        let (mut rig, map) = arkit_rig();
        let mut mapper = ExpressionMapper::new(&tuning);

        let signals = FaceSignals {
            smile: Some(1.0),
            ..Default::default()
        };
        mapper.apply(&signals, &map, &mut rig);

        // First sample snaps, then damping scales the write
        let expected = tuning.smile_damping;
        let left = rig.pose().blend_weight("mouthSmileLeft").unwrap();
        let right = rig.pose().blend_weight("mouthSmileRight").unwrap();
        assert!((left - expected).abs() < 1e-6, "expected {}, got {}", expected, left);
        assert_eq!(left, right, "smile pair must move together");
    }

    #[test]
    fn test_smoothing_converges_over_frames() {
        let tuning = TuningConfig::default();
        let (mut rig, map) = arkit_rig();
        let mut mapper = ExpressionMapper::new(&tuning);

        mapper.apply(
            &FaceSignals {
                mouth_open: Some(0.0),
                ..Default::default()
            },
            &map,
            &mut rig,
        );
        mapper.apply(
            &FaceSignals {
                mouth_open: Some(1.0),
                ..Default::default()
            },
            &map,
            &mut rig,
        );

        // One step from 0 toward 1 at the mouth alpha
        let expected = tuning.mouth_alpha;
        let got = rig.pose().blend_weight("jawOpen").unwrap();
        assert!((got - expected).abs() < 1e-6, "expected {}, got {}", expected, got);
    }
}
