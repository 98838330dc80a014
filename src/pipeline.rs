//! Frame processing pipeline
//!
//! Single entry point that turns video frames into avatar animation:
//! face detection feeds the expression and head mappers every processed
//! frame, hand detection runs on a reduced cadence and feeds the
//! gesture recognizer, and performance counters are folded in last.
//! A frame whose timestamp matches the previous one is dropped before
//! any detector runs, so an idle feed costs nothing.

use kagami_smooth::ExpSmoother;

use crate::avatar::rig::{AvatarRig, BlendMap};
use crate::avatar::{ExpressionMapper, HeadPoseMapper};
use crate::config::{Config, TuningConfig};
use crate::gesture::{GestureEvent, GestureRecognizer};
use crate::tracking::detector::{FaceDetector, HandDetector, VideoFrame};
use crate::tracking::geometry::{self, FaceSignals};
use crate::tracking::landmarks::HandLandmarks;

/// Smoothing factor for the rolling frame-interval average
const INTERVAL_ALPHA: f32 = 0.1;

/// What one call to [`TrackingPipeline::process_frame`] did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// False when the frame was a duplicate and nothing ran
    pub processed: bool,
    /// Whether a face was detected this frame
    pub face_tracked: bool,
    /// Number of hands visible to the recognizer this frame
    pub hands_tracked: usize,
    /// Gestures fired this frame
    pub events: Vec<GestureEvent>,
}

/// Running pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerfStats {
    /// Frames actually processed
    pub ticks: u64,
    /// Duplicate-timestamp frames dropped
    pub frames_skipped: u64,
    /// Processed frames that carried a face detection
    pub face_frames: u64,
    /// Processed frames on which hand detection ran
    pub hand_ticks: u64,
    /// Total gesture events fired
    pub gestures_emitted: u64,
    /// Smoothed interval between processed frames (ms)
    pub avg_frame_interval_ms: f32,
}

/// Stateful frame-to-animation pipeline
pub struct TrackingPipeline {
    tuning: TuningConfig,
    expression: ExpressionMapper,
    head: HeadPoseMapper,
    recognizer: GestureRecognizer,
    gestures_enabled: bool,
    hand_interval: u64,
    blend_map: Option<BlendMap>,
    last_timestamp_ms: Option<u64>,
    tick: u64,
    last_hands: Vec<HandLandmarks>,
    interval: ExpSmoother,
    stats: PerfStats,
}

impl TrackingPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            tuning: config.tuning.clone(),
            expression: ExpressionMapper::new(&config.tuning),
            head: HeadPoseMapper::new(&config.tuning),
            recognizer: GestureRecognizer::new(&config.gestures),
            gestures_enabled: config.gestures.enabled,
            hand_interval: config.gestures.hand_interval,
            blend_map: None,
            last_timestamp_ms: None,
            tick: 0,
            last_hands: Vec::new(),
            interval: ExpSmoother::new(INTERVAL_ALPHA),
            stats: PerfStats::default(),
        }
    }

    /// Resolve blendshape channels against a rig ahead of the first
    /// frame. Without this, resolution happens lazily on first use.
    pub fn bind_rig(&mut self, rig: &dyn AvatarRig) {
        let map = BlendMap::resolve(rig);
        tracing::info!(
            "rig bound, {}/{} blend channels resolved",
            map.resolved_count(),
            crate::avatar::BlendChannel::ALL.len()
        );
        self.blend_map = Some(map);
    }

    /// Process one video frame end to end.
    ///
    /// Face runs every processed frame; hands run every
    /// `hand_interval`-th frame, and only those fresh detections feed
    /// the gesture recognizer. Re-delivery of an already-seen timestamp
    /// returns an unprocessed report without touching any state.
    pub fn process_frame(
        &mut self,
        frame: &VideoFrame,
        face_det: &mut dyn FaceDetector,
        hand_det: &mut dyn HandDetector,
        rig: &mut dyn AvatarRig,
    ) -> TickReport {
        if self.last_timestamp_ms == Some(frame.timestamp_ms) {
            self.stats.frames_skipped += 1;
            return TickReport::default();
        }

        let map = self.blend_map.get_or_insert_with(|| BlendMap::resolve(&*rig));

        let mut report = TickReport {
            processed: true,
            ..Default::default()
        };

        let signals = match face_det.detect_face(frame) {
            Some(face) => {
                report.face_tracked = true;
                geometry::extract_signals(&face, &self.tuning)
            }
            // No face: empty signals make every mapper hold its last value
            None => FaceSignals::default(),
        };
        self.expression.apply(&signals, map, rig);
        self.head.apply(&signals, rig);

        let mut fresh_hands = false;
        if self.gestures_enabled {
            if self.tick % self.hand_interval == 0 {
                self.last_hands = hand_det.detect_hands(frame);
                fresh_hands = true;
                report.events = self
                    .recognizer
                    .observe_hands(&self.last_hands, frame.timestamp_ms);
            }
            report.hands_tracked = self.last_hands.len();
        }

        if let Some(last) = self.last_timestamp_ms {
            let delta = frame.timestamp_ms.saturating_sub(last);
            self.interval.update(delta as f32);
        }
        self.stats.ticks += 1;
        if report.face_tracked {
            self.stats.face_frames += 1;
        }
        if fresh_hands {
            self.stats.hand_ticks += 1;
        }
        self.stats.gestures_emitted += report.events.len() as u64;
        self.stats.avg_frame_interval_ms = self.interval.value_or(0.0);

        self.tick += 1;
        self.last_timestamp_ms = Some(frame.timestamp_ms);

        report
    }

    pub fn stats(&self) -> &PerfStats {
        &self.stats
    }
}
