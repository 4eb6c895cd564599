use framesnap_common::config::OutputConfig;
use framesnap_common::frame::Snapshot;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use nokhwa::pixel_format::RgbFormat;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::camera::{self, CapturedFrame};

/// Drains sampled frames off the capture channel, converts them to RGB,
/// and writes raw and/or JPEG files into the output directory.
///
/// Per-frame failures (decode errors, unwritable files) are logged and
/// skipped; the sink never retries and never stops the stream.
pub struct SnapshotSink {
    output_dir: PathBuf,
    save_raw: bool,
    save_jpeg: bool,
    jpeg_quality: u8,
}

#[derive(Debug, Default)]
pub struct SinkStats {
    /// Output files successfully written.
    pub written: u64,
    /// Frames or files skipped due to decode/write failures.
    pub failed: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to create output directory {0}: {1}")]
    CreateDir(String, std::io::Error),
}

impl SnapshotSink {
    pub fn new(config: &OutputConfig) -> Result<Self, SinkError> {
        std::fs::create_dir_all(&config.dir)
            .map_err(|e| SinkError::CreateDir(config.dir.clone(), e))?;
        Ok(Self {
            output_dir: PathBuf::from(&config.dir),
            save_raw: config.save_raw,
            save_jpeg: config.save_jpeg,
            jpeg_quality: config.jpeg_quality,
        })
    }

    /// Consume frames until the channel closes, then report totals.
    pub async fn run(self, mut rx: mpsc::Receiver<CapturedFrame>) -> SinkStats {
        let mut stats = SinkStats::default();
        while let Some(frame) = rx.recv().await {
            self.persist(frame, &mut stats).await;
        }
        debug!(written = stats.written, failed = stats.failed, "sink channel closed");
        stats
    }

    async fn persist(&self, frame: CapturedFrame, stats: &mut SinkStats) {
        let format = camera::frame_format_name(frame.buffer.source_frame_format());

        let decoded = match frame.buffer.decode_image::<RgbFormat>() {
            Ok(d) => d,
            Err(e) => {
                warn!(seq = frame.seq, error = %e, "failed to decode frame, skipping");
                stats.failed += 1;
                return;
            }
        };
        let (width, height) = (decoded.width(), decoded.height());
        let snapshot = Snapshot::new(frame.seq, frame.captured_at_ms, width, height, decoded.into_raw());

        info!(
            format,
            seq = snapshot.seq,
            width = snapshot.width,
            height = snapshot.height,
            kib = snapshot.size_kib(),
            "snapshot"
        );

        if self.save_raw {
            let path = self.output_dir.join(snapshot.raw_filename());
            match tokio::fs::write(&path, &snapshot.rgb).await {
                Ok(()) => {
                    debug!(path = %path.display(), bytes = snapshot.rgb.len(), "wrote raw snapshot");
                    stats.written += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to write raw snapshot, skipping");
                    stats.failed += 1;
                }
            }
        }

        if self.save_jpeg {
            match encode_jpeg(&snapshot, self.jpeg_quality) {
                Ok(jpeg) => {
                    let path = self.output_dir.join(snapshot.jpeg_filename());
                    match tokio::fs::write(&path, &jpeg).await {
                        Ok(()) => {
                            debug!(path = %path.display(), bytes = jpeg.len(), "wrote jpeg snapshot");
                            stats.written += 1;
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "failed to write jpeg snapshot, skipping");
                            stats.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(seq = snapshot.seq, error = %e, "jpeg encode failed, skipping");
                    stats.failed += 1;
                }
            }
        }
    }
}

/// Encode a snapshot's packed RGB payload as JPEG at the given quality.
fn encode_jpeg(snapshot: &Snapshot, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode(
        &snapshot.rgb,
        snapshot.width,
        snapshot.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}
