use chrono::{DateTime, TimeZone, Utc};

/// A sampled camera frame after colour conversion: packed RGB24, one
/// byte per channel, row-major.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// 1-based position of this frame in the stream at the moment it was
    /// sampled. Monotonically non-decreasing across a session.
    pub seq: u64,
    /// Wall-clock capture time, Unix millis.
    pub captured_at_ms: i64,
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Snapshot {
    pub fn new(seq: u64, captured_at_ms: i64, width: u32, height: u32, rgb: Vec<u8>) -> Self {
        Self {
            seq,
            captured_at_ms,
            width,
            height,
            rgb,
        }
    }

    /// Expected RGB24 payload length for the snapshot's dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Payload size in whole KiB, rounded up.
    pub fn size_kib(&self) -> usize {
        (self.rgb.len() + 1023) / 1024
    }

    /// Output name for the packed RGB dump, e.g. `frame_0008.raw`.
    pub fn raw_filename(&self) -> String {
        format!("frame_{:04}.raw", self.seq)
    }

    /// Output name for the JPEG encoding, e.g. `frame_0008.jpg`.
    pub fn jpeg_filename(&self) -> String {
        format!("frame_{:04}.jpg", self.seq)
    }

    /// Capture time as a UTC datetime for logging.
    pub fn captured_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.captured_at_ms)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(seq: u64, len: usize) -> Snapshot {
        Snapshot::new(seq, 1708300000000, 4, 2, vec![0u8; len])
    }

    #[test]
    fn filenames_are_zero_padded() {
        let s = snapshot(8, 24);
        assert_eq!(s.raw_filename(), "frame_0008.raw");
        assert_eq!(s.jpeg_filename(), "frame_0008.jpg");
    }

    #[test]
    fn filenames_grow_past_four_digits() {
        let s = snapshot(123456, 24);
        assert_eq!(s.raw_filename(), "frame_123456.raw");
    }

    #[test]
    fn expected_len_is_three_bytes_per_pixel() {
        let s = snapshot(1, 24);
        assert_eq!(s.expected_len(), 4 * 2 * 3);
        assert_eq!(s.rgb.len(), s.expected_len());
    }

    #[test]
    fn size_kib_rounds_up() {
        assert_eq!(snapshot(1, 0).size_kib(), 0);
        assert_eq!(snapshot(1, 1).size_kib(), 1);
        assert_eq!(snapshot(1, 1024).size_kib(), 1);
        assert_eq!(snapshot(1, 1025).size_kib(), 2);
    }

    #[test]
    fn captured_at_matches_millis() {
        let s = snapshot(1, 24);
        assert_eq!(s.captured_at().timestamp_millis(), 1708300000000);
    }
}
