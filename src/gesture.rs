//! Hand gesture recognition
//!
//! Classifies wave and thumbs-up gestures from hand landmark frames.
//! Wave detection watches the primary hand's wrist over a short history
//! window: enough horizontal direction reversals, enough horizontal
//! travel, and little vertical drift. Thumbs-up is a stateless check of
//! thumb extension against curled fingers, on any detected hand. Each
//! gesture kind has an independent cooldown so one sweep of the arm
//! cannot fire a burst of events.
//!
//! All coordinates are normalized image space with y growing downward,
//! so "above the wrist" means a smaller y.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::config::GesturesConfig;
use crate::tracking::landmarks::{hand, HandLandmarks};

/// Recognized gesture kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Wave,
    ThumbsUp,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Wave => "wave",
            GestureKind::ThumbsUp => "thumbs_up",
        }
    }
}

impl std::fmt::Display for GestureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub kind: GestureKind,
    /// Wrist position of the triggering hand, normalized image coords
    pub position: [f32; 2],
    /// Capture timestamp of the triggering frame
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct WristSample {
    x: f32,
    y: f32,
}

/// Stateful gesture classifier over successive hand frames
pub struct GestureRecognizer {
    config: GesturesConfig,
    history: VecDeque<WristSample>,
    last_fired: HashMap<GestureKind, u64>,
}

impl GestureRecognizer {
    pub fn new(config: &GesturesConfig) -> Self {
        Self {
            config: config.clone(),
            history: VecDeque::with_capacity(config.wave_history),
            last_fired: HashMap::new(),
        }
    }

    /// Feed one frame of hand detections.
    ///
    /// An empty frame leaves the wrist history untouched, so a detector
    /// dropout in the middle of a wave does not erase the motion seen
    /// so far. The first hand in the slice is the primary hand for wave
    /// tracking; thumbs-up may trigger from any hand.
    pub fn observe_hands(
        &mut self,
        hands: &[HandLandmarks],
        timestamp_ms: u64,
    ) -> Vec<GestureEvent> {
        if hands.is_empty() {
            return Vec::new();
        }

        let mut events = Vec::new();

        if let Some(wrist) = hands[0].point(hand::WRIST) {
            self.history.push_back(WristSample {
                x: wrist.x,
                y: wrist.y,
            });
            while self.history.len() > self.config.wave_history {
                self.history.pop_front();
            }

            if self.history.len() >= self.config.wave_min_samples
                && self.wave_detected()
                && self.cooldown_elapsed(GestureKind::Wave, timestamp_ms)
            {
                // Consume the motion so the same sweep cannot re-fire
                self.history.clear();
                self.last_fired.insert(GestureKind::Wave, timestamp_ms);
                events.push(GestureEvent {
                    kind: GestureKind::Wave,
                    position: [wrist.x, wrist.y],
                    timestamp_ms,
                });
            }
        }

        if self.cooldown_elapsed(GestureKind::ThumbsUp, timestamp_ms) {
            for hand_lm in hands {
                if let Some(position) =
                    thumbs_up_position(hand_lm, self.config.thumb_curl_tolerance)
                {
                    self.last_fired.insert(GestureKind::ThumbsUp, timestamp_ms);
                    events.push(GestureEvent {
                        kind: GestureKind::ThumbsUp,
                        position,
                        timestamp_ms,
                    });
                    break;
                }
            }
        }

        events
    }

    /// Classify the current wrist history as a wave or not.
    ///
    /// A reversal is a sign change between consecutive non-zero
    /// horizontal deltas; zero deltas neither count nor reset the
    /// running direction.
    fn wave_detected(&self) -> bool {
        let mut reversals = 0usize;
        let mut last_dir = 0i8;
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_step_y = 0.0f32;
        let mut prev: Option<WristSample> = None;

        for sample in &self.history {
            min_x = min_x.min(sample.x);
            max_x = max_x.max(sample.x);

            if let Some(p) = prev {
                let dx = sample.x - p.x;
                let dir = if dx > 0.0 {
                    1
                } else if dx < 0.0 {
                    -1
                } else {
                    0
                };
                if dir != 0 {
                    if last_dir != 0 && dir != last_dir {
                        reversals += 1;
                    }
                    last_dir = dir;
                }

                let step = (sample.y - p.y).abs();
                if step > max_step_y {
                    max_step_y = step;
                }
            }
            prev = Some(*sample);
        }

        reversals >= self.config.wave_min_reversals
            && (max_x - min_x) >= self.config.wave_min_range_x
            && max_step_y <= self.config.wave_max_step_y
    }

    fn cooldown_elapsed(&self, kind: GestureKind, now_ms: u64) -> bool {
        match self.last_fired.get(&kind) {
            Some(&fired) => now_ms.saturating_sub(fired) >= self.config.cooldown_ms,
            None => true,
        }
    }
}

/// Check one hand for a thumbs-up, returning the wrist position on a hit.
///
/// The thumb tip must sit above both the wrist and the thumb IP joint,
/// and every other fingertip must stay at or below the wrist level
/// minus the curl tolerance.
fn thumbs_up_position(hand_lm: &HandLandmarks, tolerance: f32) -> Option<[f32; 2]> {
    let wrist = hand_lm.point(hand::WRIST)?;
    let thumb_tip = hand_lm.point(hand::THUMB_TIP)?;
    let thumb_ip = hand_lm.point(hand::THUMB_IP)?;

    if thumb_tip.y >= wrist.y || thumb_tip.y >= thumb_ip.y {
        return None;
    }
    for &tip in &hand::FINGER_TIPS {
        if hand_lm.point(tip)?.y < wrist.y - tolerance {
            return None;
        }
    }

    Some([wrist.x, wrist.y])
}
