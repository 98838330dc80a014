//! Face geometry extraction.
//!
//! Converts a raw face landmark array into semantic signals: eye
//! openness, mouth openness, smile, brow raise, and head rotation.
//! Everything here is a pure function of the landmark positions and the
//! tuning parameters, so identical input yields identical output. A
//! missing landmark index disables only the signals derived from it;
//! the rest of the frame still produces data.

use glam::Vec2;

use crate::config::TuningConfig;
use crate::tracking::landmarks::{face, FaceLandmarks};

/// Degenerate-geometry floor for divisions (coincident landmarks)
const MIN_SPAN: f32 = 1e-4;

/// Semantic signals extracted from one face detection.
///
/// Each channel is `None` when the landmarks required to derive it were
/// absent from the detection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceSignals {
    /// 0.0 = fully closed, 1.0 = fully open
    pub left_eye_open: Option<f32>,
    pub right_eye_open: Option<f32>,
    /// 0.0 = closed mouth, 1.0 = wide open
    pub mouth_open: Option<f32>,
    /// 0.0 = neutral, 1.0 = full smile
    pub smile: Option<f32>,
    /// 0.0 = resting brows, 1.0 = fully raised
    pub brow_raise: Option<f32>,
    /// Positive = looking toward the subject's left (viewer's right)
    pub yaw: Option<f32>,
    /// Positive = looking down
    pub pitch: Option<f32>,
    /// Head tilt in radians, positive = clockwise in image space
    pub roll: Option<f32>,
}

/// Extract all semantic signals from one face detection.
pub fn extract_signals(face: &FaceLandmarks, tuning: &TuningConfig) -> FaceSignals {
    FaceSignals {
        left_eye_open: eye_openness(
            face,
            (face::LEFT_EYE_OUTER, face::LEFT_EYE_INNER),
            [
                (face::LEFT_EYE_UPPER_1, face::LEFT_EYE_LOWER_1),
                (face::LEFT_EYE_UPPER_2, face::LEFT_EYE_LOWER_2),
            ],
            tuning,
        ),
        right_eye_open: eye_openness(
            face,
            (face::RIGHT_EYE_OUTER, face::RIGHT_EYE_INNER),
            [
                (face::RIGHT_EYE_UPPER_1, face::RIGHT_EYE_LOWER_1),
                (face::RIGHT_EYE_UPPER_2, face::RIGHT_EYE_LOWER_2),
            ],
            tuning,
        ),
        mouth_open: mouth_openness(face, tuning),
        smile: smile(face, tuning),
        brow_raise: brow_raise(face, tuning),
        yaw: head_yaw(face, tuning),
        pitch: head_pitch(face, tuning),
        roll: head_roll(face),
    }
}

/// Eye openness from the Eye Aspect Ratio.
///
/// `EAR = (v1 + v2) / (2 * h)` with two vertical lid pairs and one
/// horizontal corner pair, then a linear ramp between the closed and
/// open thresholds.
fn eye_openness(
    face: &FaceLandmarks,
    corners: (usize, usize),
    lids: [(usize, usize); 2],
    tuning: &TuningConfig,
) -> Option<f32> {
    let h = face.pos2(corners.0)?.distance(face.pos2(corners.1)?);
    if h < MIN_SPAN {
        return None;
    }
    let v1 = face.pos2(lids[0].0)?.distance(face.pos2(lids[0].1)?);
    let v2 = face.pos2(lids[1].0)?.distance(face.pos2(lids[1].1)?);
    let ear = (v1 + v2) / (2.0 * h);
    Some(ear_to_openness(ear, tuning.ear_closed, tuning.ear_open))
}

/// Linear ramp: `closed` and below maps to 0, `open` and above to 1.
fn ear_to_openness(ear: f32, closed: f32, open: f32) -> f32 {
    ((ear - closed) / (open - closed)).clamp(0.0, 1.0)
}

/// Inner-lip gap scaled into `[0, 1]`
fn mouth_openness(face: &FaceLandmarks, tuning: &TuningConfig) -> Option<f32> {
    let upper = face.point(face::UPPER_LIP_INNER)?;
    let lower = face.point(face::LOWER_LIP_INNER)?;
    let gap = (lower.y - upper.y).abs();
    Some((gap * tuning.mouth_gain).clamp(0.0, 1.0))
}

/// Smile from the mouth width/height ratio.
///
/// A smile stretches the mouth wide and flattens it, raising the ratio;
/// ratios at or below the threshold read as neutral. A collapsed mouth
/// height reads as neutral rather than dividing toward infinity.
fn smile(face: &FaceLandmarks, tuning: &TuningConfig) -> Option<f32> {
    let width = face
        .pos2(face::MOUTH_LEFT)?
        .distance(face.pos2(face::MOUTH_RIGHT)?);
    let height = face
        .pos2(face::UPPER_LIP_OUTER)?
        .distance(face.pos2(face::LOWER_LIP_OUTER)?);
    if height < MIN_SPAN {
        return Some(0.0);
    }
    let ratio = width / height;
    Some(((ratio - tuning.smile_ratio_threshold) * tuning.smile_gain).clamp(0.0, 1.0))
}

/// Average brow-to-eyelid gap across both sides, offset-corrected
fn brow_raise(face: &FaceLandmarks, tuning: &TuningConfig) -> Option<f32> {
    let left = face.point(face::LEFT_EYE_UPPER_1)?.y - face.point(face::LEFT_BROW)?.y;
    let right = face.point(face::RIGHT_EYE_UPPER_1)?.y - face.point(face::RIGHT_BROW)?.y;
    let gap = (left + right) * 0.5;
    Some(((gap - tuning.brow_offset) * tuning.brow_gain).clamp(0.0, 1.0))
}

/// Horizontal nose offset from the midpoint of the eye outer corners
fn head_yaw(face: &FaceLandmarks, tuning: &TuningConfig) -> Option<f32> {
    let nose = face.point(face::NOSE_TIP)?;
    let left = face.point(face::LEFT_EYE_OUTER)?;
    let right = face.point(face::RIGHT_EYE_OUTER)?;
    let eye_center_x = (left.x + right.x) * 0.5;
    Some((nose.x - eye_center_x) * tuning.yaw_gain)
}

/// Vertical nose offset from frame center, bias-corrected.
///
/// The nose tip rests below frame center at a neutral pose, so the
/// offset cancels that bias and neutral reads near zero.
fn head_pitch(face: &FaceLandmarks, tuning: &TuningConfig) -> Option<f32> {
    let nose = face.point(face::NOSE_TIP)?;
    Some((nose.y - 0.5) * tuning.pitch_gain + tuning.pitch_offset)
}

/// Tilt of the line through the eye outer corners
fn head_roll(face: &FaceLandmarks) -> Option<f32> {
    let left = face.pos2(face::LEFT_EYE_OUTER)?;
    let right = face.pos2(face::RIGHT_EYE_OUTER)?;
    let d: Vec2 = right - left;
    Some(d.y.atan2(d.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::landmarks::{Landmark, FACE_LANDMARK_COUNT};

    fn set(points: &mut [Landmark], index: usize, x: f32, y: f32) {
        points[index] = Landmark { x, y, z: 0.0 };
    }

    /// Neutral face: eyes open at exactly the open threshold, mouth
    /// relaxed, brows at the configured resting gap, head level.
    fn neutral_face() -> FaceLandmarks {
        let mut p = vec![Landmark { x: 0.5, y: 0.5, z: 0.0 }; FACE_LANDMARK_COUNT];

        set(&mut p, face::NOSE_TIP, 0.5, 0.55);

        // Left eye: corners 0.1 apart, lid gaps giving EAR = 0.28
        set(&mut p, face::LEFT_EYE_OUTER, 0.35, 0.50);
        set(&mut p, face::LEFT_EYE_INNER, 0.45, 0.50);
        set(&mut p, face::LEFT_EYE_UPPER_1, 0.40, 0.485);
        set(&mut p, face::LEFT_EYE_LOWER_1, 0.40, 0.515);
        set(&mut p, face::LEFT_EYE_UPPER_2, 0.42, 0.487);
        set(&mut p, face::LEFT_EYE_LOWER_2, 0.42, 0.513);

        set(&mut p, face::RIGHT_EYE_OUTER, 0.65, 0.50);
        set(&mut p, face::RIGHT_EYE_INNER, 0.55, 0.50);
        set(&mut p, face::RIGHT_EYE_UPPER_1, 0.60, 0.485);
        set(&mut p, face::RIGHT_EYE_LOWER_1, 0.60, 0.515);
        set(&mut p, face::RIGHT_EYE_UPPER_2, 0.58, 0.487);
        set(&mut p, face::RIGHT_EYE_LOWER_2, 0.58, 0.513);

        set(&mut p, face::MOUTH_LEFT, 0.42, 0.62);
        set(&mut p, face::MOUTH_RIGHT, 0.58, 0.62);
        set(&mut p, face::UPPER_LIP_INNER, 0.50, 0.615);
        set(&mut p, face::LOWER_LIP_INNER, 0.50, 0.625);
        set(&mut p, face::UPPER_LIP_OUTER, 0.50, 0.595);
        set(&mut p, face::LOWER_LIP_OUTER, 0.50, 0.650);

        set(&mut p, face::LEFT_BROW, 0.40, 0.45);
        set(&mut p, face::RIGHT_BROW, 0.60, 0.45);

        FaceLandmarks::new(p)
    }

    #[test]
    fn test_neutral_face_reads_neutral() {
        let tuning = TuningConfig::default();
        let signals = extract_signals(&neutral_face(), &tuning);

        let left = signals.left_eye_open.unwrap();
        let right = signals.right_eye_open.unwrap();
        assert!((left - 1.0).abs() < 0.01, "open eye should read 1.0, got {}", left);
        assert!((right - 1.0).abs() < 0.01, "open eye should read 1.0, got {}", right);

        assert_eq!(signals.smile, Some(0.0), "relaxed mouth should not smile");
        assert!(
            signals.brow_raise.unwrap().abs() < 0.01,
            "resting brows should read 0, got {:?}",
            signals.brow_raise
        );
        assert!(signals.yaw.unwrap().abs() < 1e-5);
        assert!(signals.pitch.unwrap().abs() < 1e-5);
        assert!(signals.roll.unwrap().abs() < 1e-5);
    }

    #[test]
    fn test_ear_ramp_endpoints() {
        assert_eq!(ear_to_openness(0.15, 0.15, 0.28), 0.0);
        assert_eq!(ear_to_openness(0.05, 0.15, 0.28), 0.0);
        assert_eq!(ear_to_openness(0.28, 0.15, 0.28), 1.0);
        assert_eq!(ear_to_openness(0.40, 0.15, 0.28), 1.0);
    }

    #[test]
    fn test_ear_ramp_monotonic() {
        let mut prev = ear_to_openness(0.15, 0.15, 0.28);
        for i in 1..=26 {
            let ear = 0.15 + i as f32 * 0.005;
            let v = ear_to_openness(ear, 0.15, 0.28);
            assert!(
                v >= prev,
                "openness must not decrease as EAR rises: {} -> {} at EAR {}",
                prev,
                v,
                ear
            );
            prev = v;
        }
        // Midpoint lands halfway up the ramp
        let mid = ear_to_openness(0.215, 0.15, 0.28);
        assert!((mid - 0.5).abs() < 0.01, "midpoint should be ~0.5, got {}", mid);
    }

    #[test]
    fn test_closed_eye_reads_zero() {
        let tuning = TuningConfig::default();
        let mut face_lm = neutral_face();
        // Collapse the left lids to a sliver: EAR ~ 0.03
        {
            let mut p: Vec<Landmark> =
                (0..face_lm.len()).map(|i| face_lm.point(i).unwrap()).collect();
            set(&mut p, face::LEFT_EYE_UPPER_1, 0.40, 0.4985);
            set(&mut p, face::LEFT_EYE_LOWER_1, 0.40, 0.5015);
            set(&mut p, face::LEFT_EYE_UPPER_2, 0.42, 0.4985);
            set(&mut p, face::LEFT_EYE_LOWER_2, 0.42, 0.5015);
            face_lm = FaceLandmarks::new(p);
        }

        let signals = extract_signals(&face_lm, &tuning);
        assert_eq!(signals.left_eye_open, Some(0.0));
        // Right eye untouched
        assert!((signals.right_eye_open.unwrap() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_idempotent() {
        let tuning = TuningConfig::default();
        let face_lm = neutral_face();
        let a = extract_signals(&face_lm, &tuning);
        let b = extract_signals(&face_lm, &tuning);
        assert_eq!(a, b, "identical landmarks must produce bit-identical signals");
    }

    #[test]
    fn test_short_detection_yields_no_signals() {
        let tuning = TuningConfig::default();
        let face_lm = FaceLandmarks::from_raw(&[[0.5, 0.5, 0.0]; 10]);
        let signals = extract_signals(&face_lm, &tuning);
        assert_eq!(signals, FaceSignals::default());
    }

    #[test]
    fn test_zero_mouth_height_is_guarded() {
        let tuning = TuningConfig::default();
        let mut p = vec![Landmark { x: 0.5, y: 0.5, z: 0.0 }; FACE_LANDMARK_COUNT];
        set(&mut p, face::MOUTH_LEFT, 0.42, 0.62);
        set(&mut p, face::MOUTH_RIGHT, 0.58, 0.62);
        // Outer lips coincide exactly
        set(&mut p, face::UPPER_LIP_OUTER, 0.50, 0.62);
        set(&mut p, face::LOWER_LIP_OUTER, 0.50, 0.62);

        let signals = extract_signals(&FaceLandmarks::new(p), &tuning);
        let smile = signals.smile.unwrap();
        assert!(smile.is_finite(), "zero height must not produce inf/NaN");
        assert_eq!(smile, 0.0);
    }

    #[test]
    fn test_wide_mouth_smiles() {
        let tuning = TuningConfig::default();
        let mut p = vec![Landmark { x: 0.5, y: 0.5, z: 0.0 }; FACE_LANDMARK_COUNT];
        // Ratio 0.2 / 0.05 = 4.0 -> (4.0 - 3.0) * 0.8 = 0.8
        set(&mut p, face::MOUTH_LEFT, 0.40, 0.62);
        set(&mut p, face::MOUTH_RIGHT, 0.60, 0.62);
        set(&mut p, face::UPPER_LIP_OUTER, 0.50, 0.595);
        set(&mut p, face::LOWER_LIP_OUTER, 0.50, 0.645);

        let smile = extract_signals(&FaceLandmarks::new(p), &tuning).smile.unwrap();
        assert!((smile - 0.8).abs() < 0.01, "expected 0.8, got {}", smile);
    }

    #[test]
    fn test_open_mouth() {
        let tuning = TuningConfig::default();
        let mut face_lm = neutral_face();
        {
            let mut p: Vec<Landmark> =
                (0..face_lm.len()).map(|i| face_lm.point(i).unwrap()).collect();
            // Gap 0.06 * gain 12 = 0.72
            set(&mut p, face::UPPER_LIP_INNER, 0.50, 0.60);
            set(&mut p, face::LOWER_LIP_INNER, 0.50, 0.66);
            face_lm = FaceLandmarks::new(p);
        }
        let mouth = extract_signals(&face_lm, &tuning).mouth_open.unwrap();
        assert!((mouth - 0.72).abs() < 0.01, "expected 0.72, got {}", mouth);
    }

    #[test]
    fn test_yaw_sign_follows_nose() {
        let tuning = TuningConfig::default();
        let mut face_lm = neutral_face();
        {
            let mut p: Vec<Landmark> =
                (0..face_lm.len()).map(|i| face_lm.point(i).unwrap()).collect();
            set(&mut p, face::NOSE_TIP, 0.55, 0.55);
            face_lm = FaceLandmarks::new(p);
        }
        let yaw = extract_signals(&face_lm, &tuning).yaw.unwrap();
        // (0.55 - 0.5) * 8.0 = 0.4
        assert!((yaw - 0.4).abs() < 0.01, "expected 0.4, got {}", yaw);
    }

    #[test]
    fn test_roll_from_tilted_eye_line() {
        let tuning = TuningConfig::default();
        let mut face_lm = neutral_face();
        {
            let mut p: Vec<Landmark> =
                (0..face_lm.len()).map(|i| face_lm.point(i).unwrap()).collect();
            // Right eye corner dropped 0.05 below the left
            set(&mut p, face::RIGHT_EYE_OUTER, 0.65, 0.55);
            face_lm = FaceLandmarks::new(p);
        }
        let roll = extract_signals(&face_lm, &tuning).roll.unwrap();
        let expected = (0.05f32).atan2(0.30);
        assert!((roll - expected).abs() < 1e-4, "expected {}, got {}", expected, roll);
    }

    #[test]
    fn test_raised_brows() {
        let tuning = TuningConfig::default();
        let mut face_lm = neutral_face();
        {
            let mut p: Vec<Landmark> =
                (0..face_lm.len()).map(|i| face_lm.point(i).unwrap()).collect();
            // Brows lifted 0.02 above resting: gap 0.055, (0.055-0.035)*25 = 0.5
            set(&mut p, face::LEFT_BROW, 0.40, 0.43);
            set(&mut p, face::RIGHT_BROW, 0.60, 0.43);
            face_lm = FaceLandmarks::new(p);
        }
        let brow = extract_signals(&face_lm, &tuning).brow_raise.unwrap();
        assert!((brow - 0.5).abs() < 0.01, "expected 0.5, got {}", brow);
    }
}
