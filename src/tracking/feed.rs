//! Tracker feed receiver
//!
//! Receives JSON-over-UDP landmark packets from the
//! `scripts/kagami_tracker.py` Python helper. The latest packet is held
//! in shared state; [`PacketSource`] exposes it to the pipeline through
//! the detector traits, so a lost or malformed packet simply leaves the
//! previous detection in place.

use serde::Deserialize;
use std::net::UdpSocket;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::TrackerConfig;
use crate::error::{KagamiError, TrackingError};
use crate::tracking::detector::{FaceDetector, HandDetector, VideoFrame};
use crate::tracking::landmarks::{FaceLandmarks, HandLandmarks};

/// Most hands accepted from one packet; extras are dropped
const MAX_HANDS: usize = 2;

/// A single JSON packet from the tracker helper
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerPacket {
    /// Monotonic frame counter from the capture loop
    #[serde(default)]
    pub seq: u64,
    /// Capture timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Whether a face was detected this frame
    pub face_detected: bool,
    /// Face landmarks as normalized [x, y, z] triples
    #[serde(default)]
    pub face: Vec<[f32; 3]>,
    /// Zero or more hands, each 21 normalized [x, y, z] triples
    #[serde(default)]
    pub hands: Vec<Vec<[f32; 3]>>,
}

/// Most recently received packet, if any
#[derive(Debug, Clone, Default)]
pub struct FeedData {
    pub packet: Option<TrackerPacket>,
}

/// JSON-over-UDP receiver for the tracker helper
pub struct TrackerReceiver {
    config: TrackerConfig,
    socket: Option<UdpSocket>,
    data: Arc<Mutex<FeedData>>,
}

impl TrackerReceiver {
    /// Create a new receiver (does not bind yet)
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            config: config.clone(),
            socket: None,
            data: Arc::new(Mutex::new(FeedData::default())),
        }
    }

    /// Bind the UDP socket and start receiving
    pub fn start(&mut self) -> Result<(), KagamiError> {
        let addr = format!("{}:{}", self.config.listen_address, self.config.port);

        let socket = UdpSocket::bind(&addr).map_err(|e| {
            TrackingError::Receiver(format!("Failed to bind to {}: {}", addr, e))
        })?;

        socket.set_nonblocking(true).map_err(|e| {
            TrackingError::Receiver(format!("Failed to set non-blocking: {}", e))
        })?;

        tracing::info!("Tracker receiver listening on {}", addr);
        self.socket = Some(socket);

        Ok(())
    }

    /// Drain pending packets (non-blocking).
    ///
    /// Returns `true` when at least one fresh packet arrived. Stale
    /// packets in the same batch are superseded by the newest one.
    pub fn process(&self) -> Result<bool, KagamiError> {
        let socket = match &self.socket {
            Some(s) => s,
            None => return Ok(false),
        };

        let mut buf = [0u8; 65536];
        let mut fresh = false;

        loop {
            match socket.recv(&mut buf) {
                Ok(size) if size > 0 => {
                    let packet: TrackerPacket =
                        serde_json::from_slice(&buf[..size]).map_err(|e| {
                            TrackingError::Parse(format!("JSON parse error: {}", e))
                        })?;
                    lock_feed(&self.data).packet = Some(packet);
                    fresh = true;
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    return Err(TrackingError::Receiver(format!("Receive error: {}", e)).into());
                }
            }
        }

        Ok(fresh)
    }

    /// Handle for reading detections out of the feed
    pub fn source(&self) -> PacketSource {
        PacketSource {
            data: Arc::clone(&self.data),
        }
    }

    /// Stop the receiver
    pub fn stop(&mut self) {
        self.socket = None;
        tracing::info!("Tracker receiver stopped");
    }
}

/// Read-side view of the feed, cloneable across pipeline inputs.
#[derive(Clone)]
pub struct PacketSource {
    data: Arc<Mutex<FeedData>>,
}

impl PacketSource {
    /// Frame identity of the latest packet, if any has arrived
    pub fn current_frame(&self) -> Option<VideoFrame> {
        lock_feed(&self.data).packet.as_ref().map(|p| VideoFrame {
            seq: p.seq,
            timestamp_ms: p.timestamp_ms,
        })
    }

    /// Whether any packet has been received yet
    pub fn has_data(&self) -> bool {
        lock_feed(&self.data).packet.is_some()
    }
}

impl FaceDetector for PacketSource {
    fn detect_face(&mut self, _frame: &VideoFrame) -> Option<FaceLandmarks> {
        let guard = lock_feed(&self.data);
        let packet = guard.packet.as_ref()?;
        if !packet.face_detected || packet.face.is_empty() {
            return None;
        }
        Some(FaceLandmarks::from_raw(&packet.face))
    }
}

impl HandDetector for PacketSource {
    fn detect_hands(&mut self, _frame: &VideoFrame) -> Vec<HandLandmarks> {
        let guard = lock_feed(&self.data);
        match guard.packet.as_ref() {
            Some(packet) => packet
                .hands
                .iter()
                .take(MAX_HANDS)
                .map(|h| HandLandmarks::from_raw(h))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// A poisoned lock still holds the last good packet
fn lock_feed(data: &Mutex<FeedData>) -> MutexGuard<'_, FeedData> {
    match data.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
