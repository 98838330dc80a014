//! Kagami - Headless face/hand tracking avatar service
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kagami::{
    avatar::PoseRig,
    config::Config,
    pipeline::TrackingPipeline,
    tracking::{
        feed::TrackerReceiver,
        subprocess::{check_tracker_available, TrackerSubprocess},
    },
    AppState,
};

/// Feed silence after which the tracker is reported offline
const FEED_STALE_AFTER: Duration = Duration::from_secs(3);

/// Kagami - Headless face/hand tracking avatar service
#[derive(Parser, Debug)]
#[command(name = "kagami", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable hand tracking and gesture recognition
    #[arg(long)]
    no_gestures: bool,

    /// Do not auto-launch the Python tracker subprocess
    #[arg(long)]
    no_launch: bool,

    /// Tracker UDP port (overrides config)
    #[arg(long)]
    tracker_port: Option<u16>,

    /// Check tracker prerequisites and exit
    #[arg(long)]
    check_tracker: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", kagami::NAME, kagami::VERSION);

    // Handle check-tracker mode
    if args.check_tracker {
        check_tracker();
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;

    // Do all async setup on the runtime
    let state = runtime.block_on(async { setup_and_spawn_services(&args).await })?;

    // Headless mode: wait for Ctrl+C / SIGTERM
    runtime.block_on(async {
        shutdown_signal().await;
        info!("Shutdown signal received");
        state.shutdown();

        // Give tasks a moment to clean up
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    info!("Kagami stopped");
    Ok(())
}

/// Setup config, create AppState, and spawn all background services.
async fn setup_and_spawn_services(args: &Args) -> anyhow::Result<Arc<AppState>> {
    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if args.no_gestures {
        config.gestures.enabled = false;
    }
    if args.no_launch {
        config.tracker.auto_launch = false;
    }
    if let Some(port) = args.tracker_port {
        config.tracker.port = port;
    }

    // Validate configuration
    config.validate()?;

    info!("Tracker port: {}", config.tracker.port);
    info!("Tracker auto-launch: {}", config.tracker.auto_launch);
    info!("Gesture recognition: {}", config.gestures.enabled);

    // Create shared application state
    let state = AppState::new(config);

    // Start the tracking pipeline
    let tracking_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = run_tracking(tracking_state).await {
            error!("Tracking error: {}", e);
        }
    });

    // Log fired gestures
    let gesture_state = Arc::clone(&state);
    tokio::spawn(async move {
        run_gesture_log(gesture_state).await;
    });

    // Trace published poses at debug level
    let pose_state = Arc::clone(&state);
    tokio::spawn(async move {
        run_pose_log(pose_state).await;
    });

    Ok(state)
}

fn check_tracker() {
    if check_tracker_available() {
        println!("mediapipe Python package: available");
    } else {
        println!("mediapipe Python package: NOT FOUND");
        println!("Install it with: pip install mediapipe");
    }
}

/// Receive tracker packets, run the pipeline, and publish results.
async fn run_tracking(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.read().await.clone();
    let tracker_config = config.tracker.clone();

    let mut shutdown_rx = state.subscribe_shutdown();

    // Optionally launch the subprocess
    let mut subprocess = if tracker_config.auto_launch {
        if !check_tracker_available() {
            warn!("Python mediapipe package not found, tracker launch may fail");
        }
        let mut sp = TrackerSubprocess::new(&tracker_config);
        if let Err(e) = sp.start() {
            error!("Failed to auto-launch tracker: {}", e);
            // Continue anyway, the tracker may be running externally
        }
        // Give the tracker a moment to start sending
        tokio::time::sleep(Duration::from_secs(2)).await;
        Some(sp)
    } else {
        None
    };

    // Start the receiver
    let mut receiver = TrackerReceiver::new(&tracker_config);
    receiver.start()?;

    let mut pipeline = TrackingPipeline::new(&config);
    let mut rig = PoseRig::new(&config.avatar.blend_names);
    pipeline.bind_rig(&rig);

    let mut face_source = receiver.source();
    let mut hand_source = receiver.source();

    info!(
        "Tracking started (port: {}, gestures: {})",
        tracker_config.port, config.gestures.enabled
    );

    let mut last_data = tokio::time::Instant::now();
    let mut last_stats = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Tracking shutting down");
                break;
            }
            // Poll cadence; also keeps the loop from busy-spinning
            _ = tokio::time::sleep(Duration::from_millis(5)) => {
                match receiver.process() {
                    Ok(true) => {
                        last_data = tokio::time::Instant::now();
                        if let Some(frame) = face_source.current_frame() {
                            let report = pipeline.process_frame(
                                &frame,
                                &mut face_source,
                                &mut hand_source,
                                &mut rig,
                            );
                            if report.processed {
                                state.set_tracker_online(true);
                                let pose = rig
                                    .pose()
                                    .clone()
                                    .with_tracked(report.face_tracked)
                                    .with_timestamp(frame.timestamp_ms);
                                state.update_pose(pose).await;
                                for event in report.events {
                                    state.publish_gesture(event);
                                }
                            }
                        }
                    }
                    Ok(false) => {
                        if state.is_tracker_online() && last_data.elapsed() >= FEED_STALE_AFTER {
                            warn!("Tracker feed went silent");
                            state.set_tracker_online(false);
                        }
                    }
                    Err(e) => {
                        error!("Tracker receive error: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }

                // Check subprocess health and auto-restart if needed
                if let Some(ref mut sp) = subprocess {
                    if !sp.is_running() && tracker_config.auto_restart {
                        info!(
                            "Tracker subprocess crashed, restarting in {}s",
                            tracker_config.restart_delay_secs
                        );
                        tokio::time::sleep(Duration::from_secs(
                            tracker_config.restart_delay_secs,
                        ))
                        .await;
                        if let Err(e) = sp.start() {
                            error!("Failed to restart tracker: {}", e);
                        }
                    }
                }

                if last_stats.elapsed() >= Duration::from_secs(30) {
                    debug!("Pipeline stats: {:?}", pipeline.stats());
                    last_stats = tokio::time::Instant::now();
                }
            }
        }
    }

    // Cleanup
    receiver.stop();
    if let Some(ref mut sp) = subprocess {
        sp.stop().await;
    }

    Ok(())
}

/// Log fired gestures at info level.
async fn run_gesture_log(state: Arc<AppState>) {
    let mut gesture_rx = state.subscribe_gestures();
    let mut shutdown_rx = state.subscribe_shutdown();

    loop {
        tokio::select! {
            result = gesture_rx.recv() => {
                match result {
                    Ok(event) => {
                        info!(
                            "Gesture: {} at ({:.2}, {:.2})",
                            event.kind, event.position[0], event.position[1]
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Gesture log fell behind, dropped {} events", n);
                        continue;
                    }
                    Err(_) => break,
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
}

/// Trace published poses at debug level.
async fn run_pose_log(state: Arc<AppState>) {
    let mut pose_rx = state.subscribe_pose();
    let mut shutdown_rx = state.subscribe_shutdown();

    loop {
        tokio::select! {
            result = pose_rx.recv() => {
                match result {
                    Ok(pose) => {
                        let [pitch, yaw, roll] = pose.head_rotation();
                        debug!(
                            "Pose @{}ms tracked={} head=[{:.2}, {:.2}, {:.2}] weights={}",
                            pose.timestamp_ms(),
                            pose.is_tracked(),
                            pitch,
                            yaw,
                            roll,
                            pose.blend_weights().len()
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
