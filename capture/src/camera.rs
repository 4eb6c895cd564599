use chrono::Utc;
use framesnap_common::config::{CameraConfig, StreamConfig};
use framesnap_common::sampler::FrameSampler;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraInfo, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::{query, Buffer, CallbackCamera};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::CaptureError;

/// A sampled frame handed from the capture callback to the snapshot sink,
/// still in the camera's wire format.
pub struct CapturedFrame {
    pub seq: u64,
    pub captured_at_ms: i64,
    pub buffer: Buffer,
}

/// Enumerate attached cameras, logging one diagnostic line per device.
pub fn list_devices() -> Result<Vec<CameraInfo>, CaptureError> {
    let devices = query(ApiBackend::Auto).map_err(CaptureError::Query)?;
    for device in &devices {
        info!(
            index = %device.index(),
            name = %device.human_name(),
            description = %device.description(),
            "found camera"
        );
    }
    Ok(devices)
}

/// Open the configured camera with a stream profile negotiated as close as
/// the device allows to the configured width/height/fps/format.
///
/// The callback runs on the capture library's own thread and must stay
/// fast, so it only counts frames and hands sampled ones to the sink. A
/// full channel sheds the snapshot rather than blocking the stream.
pub fn open_camera(
    camera_config: &CameraConfig,
    stream_config: &StreamConfig,
    sampler: Arc<FrameSampler>,
    tx: mpsc::Sender<CapturedFrame>,
) -> Result<CallbackCamera, CaptureError> {
    let devices = list_devices()?;
    let device = select_device(&devices, camera_config.index)?;
    let device_index = device.index().clone();

    let wire_format = parse_frame_format(&stream_config.format)?;
    let profile = CameraFormat::new(
        Resolution::new(stream_config.width, stream_config.height),
        wire_format,
        stream_config.fps,
    );
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(profile));
    info!(requested = %profile, "requesting stream profile");

    let callback = move |buffer: Buffer| {
        if let Some(seq) = sampler.note_frame() {
            let frame = CapturedFrame {
                seq,
                captured_at_ms: Utc::now().timestamp_millis(),
                buffer,
            };
            if tx.try_send(frame).is_err() {
                warn!(seq, "snapshot sink is behind, dropping sampled frame");
            }
        }
    };

    CallbackCamera::new(device_index, requested, callback).map_err(CaptureError::Open)
}

/// Pick the configured camera out of the enumerated list. `index` is the
/// position in that list; the device's own backend index (which can be
/// sparse, e.g. a lone /dev/video2) is what gets opened.
fn select_device(devices: &[CameraInfo], index: u32) -> Result<&CameraInfo, CaptureError> {
    if devices.is_empty() {
        return Err(CaptureError::NoDevices);
    }
    devices.get(index as usize).ok_or(CaptureError::DeviceIndex {
        index,
        available: devices.len(),
    })
}

/// Log the stream profile the device actually agreed to, which may differ
/// from the requested one.
pub fn log_negotiated_format(camera: &CallbackCamera) {
    match camera.camera_format() {
        Ok(format) => info!(negotiated = %format, "stream profile negotiated"),
        Err(e) => warn!(error = %e, "could not read negotiated stream profile"),
    }
}

/// Parse a configured wire-format name.
pub fn parse_frame_format(name: &str) -> Result<FrameFormat, CaptureError> {
    match name {
        "yuyv" => Ok(FrameFormat::YUYV),
        "mjpeg" => Ok(FrameFormat::MJPEG),
        other => Err(CaptureError::UnknownFormat(other.to_string())),
    }
}

/// Human-readable name for a wire format, used in per-snapshot log lines.
pub fn frame_format_name(format: FrameFormat) -> &'static str {
    match format {
        FrameFormat::MJPEG => "MJPEG",
        FrameFormat::YUYV => "YUYV",
        FrameFormat::NV12 => "NV12",
        FrameFormat::GRAY => "GRAY",
        FrameFormat::RAWRGB => "RGB",
        FrameFormat::RAWBGR => "BGR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nokhwa::utils::CameraIndex;

    fn device(name: &str, backend_index: u32) -> CameraInfo {
        CameraInfo::new(name, "uvc", "", CameraIndex::Index(backend_index))
    }

    #[test]
    fn selects_positionally_with_sparse_backend_indices() {
        // a single attached device exposed by the backend as node 2
        let devices = vec![device("cam", 2)];
        let picked = select_device(&devices, 0).unwrap();
        assert_eq!(picked.index(), &CameraIndex::Index(2));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let devices = vec![device("a", 0), device("b", 1)];
        let err = select_device(&devices, 2).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::DeviceIndex {
                index: 2,
                available: 2
            }
        ));
    }

    #[test]
    fn empty_device_list_is_no_devices() {
        assert!(matches!(select_device(&[], 0), Err(CaptureError::NoDevices)));
    }

    #[test]
    fn parses_known_formats() {
        assert_eq!(parse_frame_format("yuyv").unwrap(), FrameFormat::YUYV);
        assert_eq!(parse_frame_format("mjpeg").unwrap(), FrameFormat::MJPEG);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = parse_frame_format("h264").unwrap_err();
        assert!(matches!(err, CaptureError::UnknownFormat(ref s) if s == "h264"));
    }

    #[test]
    fn format_names_cover_stream_formats() {
        assert_eq!(frame_format_name(FrameFormat::YUYV), "YUYV");
        assert_eq!(frame_format_name(FrameFormat::MJPEG), "MJPEG");
        assert_eq!(frame_format_name(FrameFormat::GRAY), "GRAY");
    }
}
