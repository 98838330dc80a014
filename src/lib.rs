//! Kagami - Headless face and hand tracking for 3D avatars
//!
//! A modular Rust service that:
//! - Receives landmark frames from a camera tracker over JSON/UDP
//! - Maps face geometry onto avatar blendshapes and head rotation
//! - Recognizes wave and thumbs-up hand gestures
//! - Fans out pose snapshots and gesture events over broadcast channels

pub mod avatar;
pub mod config;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod tracking;

pub use config::Config;
pub use error::{KagamiError, Result};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use avatar::AvatarPose;
use gesture::GestureEvent;

/// Application state shared across all components
#[derive(Debug)]
pub struct AppState {
    /// Current configuration
    pub config: RwLock<Config>,
    /// Latest published avatar pose
    pub pose: RwLock<AvatarPose>,
    /// Channel for pose updates
    pub pose_tx: broadcast::Sender<AvatarPose>,
    /// Channel for fired gestures
    pub gesture_tx: broadcast::Sender<GestureEvent>,
    /// Shutdown signal
    pub shutdown_tx: broadcast::Sender<()>,
    /// Whether the tracker feed has delivered data recently
    pub tracker_online: AtomicBool,
}

impl AppState {
    /// Create a new application state with the given configuration
    pub fn new(config: Config) -> Arc<Self> {
        let (pose_tx, _) = broadcast::channel(64);
        let (gesture_tx, _) = broadcast::channel(32);
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(Self {
            config: RwLock::new(config),
            pose: RwLock::new(AvatarPose::default()),
            pose_tx,
            gesture_tx,
            shutdown_tx,
            tracker_online: AtomicBool::new(false),
        })
    }

    /// Update the published pose and broadcast the change
    pub async fn update_pose(&self, pose: AvatarPose) {
        let mut current = self.pose.write().await;
        *current = pose.clone();
        let _ = self.pose_tx.send(pose);
    }

    /// Get the latest published pose
    pub async fn get_pose(&self) -> AvatarPose {
        self.pose.read().await.clone()
    }

    /// Subscribe to pose updates
    pub fn subscribe_pose(&self) -> broadcast::Receiver<AvatarPose> {
        self.pose_tx.subscribe()
    }

    /// Broadcast a fired gesture
    pub fn publish_gesture(&self, event: GestureEvent) {
        let _ = self.gesture_tx.send(event);
    }

    /// Subscribe to gesture events
    pub fn subscribe_gestures(&self) -> broadcast::Receiver<GestureEvent> {
        self.gesture_tx.subscribe()
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Set tracker feed liveness
    pub fn set_tracker_online(&self, online: bool) {
        self.tracker_online.store(online, Ordering::Relaxed);
    }

    /// Whether the tracker feed is delivering data
    pub fn is_tracker_online(&self) -> bool {
        self.tracker_online.load(Ordering::Relaxed)
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
