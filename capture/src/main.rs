mod camera;
mod sink;

use framesnap_common::config::Config;
use framesnap_common::sampler::FrameSampler;
use sink::SnapshotSink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Sampled frames in flight between the capture callback and the sink.
/// At one snapshot per second the sink only falls behind if the disk does.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to enumerate cameras: {0}")]
    Query(nokhwa::NokhwaError),
    #[error("no cameras attached")]
    NoDevices,
    #[error("camera index {index} out of range ({available} device(s) attached)")]
    DeviceIndex { index: u32, available: usize },
    #[error("unknown stream format {0:?}, expected \"yuyv\" or \"mjpeg\"")]
    UnknownFormat(String),
    #[error("failed to open camera: {0}")]
    Open(nokhwa::NokhwaError),
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    if !config_path.exists() {
        info!(path = %config_path.display(), "no config file, using built-in defaults");
    }

    info!(
        width = config.stream.width,
        height = config.stream.height,
        fps = config.stream.fps,
        format = config.stream.format,
        sample_every = config.output.sample_every,
        duration_secs = config.output.duration_secs,
        save_raw = config.output.save_raw,
        save_jpeg = config.output.save_jpeg,
        "starting framesnap"
    );

    let sink = match SnapshotSink::new(&config.output) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to prepare output directory");
            std::process::exit(1);
        }
    };

    let sampler = Arc::new(FrameSampler::new(config.output.sample_every));
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    let mut camera = match camera::open_camera(
        &config.camera,
        &config.stream,
        Arc::clone(&sampler),
        tx,
    ) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to open camera");
            std::process::exit(1);
        }
    };
    camera::log_negotiated_format(&camera);

    let writer = tokio::spawn(sink.run(rx));

    if let Err(e) = camera.open_stream() {
        error!(error = %e, "failed to start streaming");
        // The camera owns the only sender; dropping it lets the sink drain
        // and exit before we do.
        drop(camera);
        let _ = writer.await;
        std::process::exit(1);
    }

    info!(secs = config.output.duration_secs, "streaming");
    tokio::time::sleep(Duration::from_secs(config.output.duration_secs)).await;

    if let Err(e) = camera.stop_stream() {
        warn!(error = %e, "failed to stop stream cleanly");
    }
    info!("done streaming");
    drop(camera);

    let stats = match writer.await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "snapshot sink task failed, file totals lost");
            sink::SinkStats::default()
        }
    };
    info!(
        frames_seen = sampler.frames_seen(),
        frames_sampled = sampler.frames_sampled(),
        files_written = stats.written,
        failures = stats.failed,
        "capture session complete"
    );
}
