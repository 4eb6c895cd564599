use std::sync::atomic::{AtomicU64, Ordering};

/// Counter-based frame sampler shared between the capture callback and the
/// main task.
///
/// The callback runs on the capture library's own thread and must stay
/// fast, so the sampler is just two atomic counters: every frame bumps the
/// total, and every `every`th frame is selected for persistence.
#[derive(Debug)]
pub struct FrameSampler {
    every: u64,
    seen: AtomicU64,
    sampled: AtomicU64,
}

impl FrameSampler {
    /// `every` is clamped to at least 1 (sample every frame).
    pub fn new(every: u32) -> Self {
        Self {
            every: u64::from(every.max(1)),
            seen: AtomicU64::new(0),
            sampled: AtomicU64::new(0),
        }
    }

    /// Record one incoming frame. Returns `Some(count)` with the 1-based
    /// frame count when this frame should be persisted, `None` otherwise.
    pub fn note_frame(&self) -> Option<u64> {
        let count = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.every == 0 {
            self.sampled.fetch_add(1, Ordering::Relaxed);
            Some(count)
        } else {
            None
        }
    }

    /// Total frames observed so far.
    pub fn frames_seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }

    /// Frames selected for persistence so far.
    pub fn frames_sampled(&self) -> u64 {
        self.sampled.load(Ordering::Relaxed)
    }
}
