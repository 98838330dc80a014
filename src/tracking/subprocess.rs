//! Tracker subprocess manager
//!
//! Launches the Python landmark tracker (`scripts/kagami_tracker.py`)
//! as a child process with automatic cleanup on drop.

use tokio::process::{Child, Command};

use crate::config::TrackerConfig;
use crate::error::{KagamiError, TrackingError};

/// Manages the Python tracker subprocess
pub struct TrackerSubprocess {
    child: Option<Child>,
    config: TrackerConfig,
}

impl TrackerSubprocess {
    /// Create a new subprocess manager (does not start the process)
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            child: None,
            config: config.clone(),
        }
    }

    /// Launch the tracker subprocess.
    ///
    /// Runs: `python3 <tracker_script> --ip <listen_address> --port <port>
    ///        --capture <camera_device> --width <capture_width>
    ///        --height <capture_height> --fps <capture_fps>`
    pub fn start(&mut self) -> Result<(), KagamiError> {
        if self.is_running() {
            return Ok(());
        }

        let child = Command::new("python3")
            .arg(&self.config.tracker_script)
            .args(["--ip", &self.config.listen_address])
            .args(["--port", &self.config.port.to_string()])
            .args(["--capture", &self.config.camera_device.to_string()])
            .args(["--width", &self.config.capture_width.to_string()])
            .args(["--height", &self.config.capture_height.to_string()])
            .args(["--fps", &self.config.capture_fps.to_string()])
            .kill_on_drop(true)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| {
                TrackingError::Subprocess(format!(
                    "Failed to launch tracker at '{}': {}",
                    self.config.tracker_script, e
                ))
            })?;

        tracing::info!(
            "Tracker subprocess started (pid: {:?}, camera: {}, port: {})",
            child.id(),
            self.config.camera_device,
            self.config.port,
        );

        self.child = Some(child);
        Ok(())
    }

    /// Check if the subprocess is still running (non-blocking)
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    tracing::warn!("Tracker subprocess exited with: {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to check tracker subprocess status: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Stop the subprocess by killing it
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::info!("Stopping tracker subprocess (pid: {:?})", child.id());
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
    }
}

/// Check if the `mediapipe` Python package is available.
///
/// Runs `python3 -c "import mediapipe"` and returns true if it succeeds.
pub fn check_tracker_available() -> bool {
    match std::process::Command::new("python3")
        .args(["-c", "import mediapipe"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
    {
        Ok(status) => status.success(),
        Err(_) => false,
    }
}
