//! Analysis taps: fixed-size windows of the most recent samples of a signal.

use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug)]
struct TapRing {
    samples: Vec<f32>,
    write: usize,
}

/// Read-only observation point into a live signal.
///
/// The audio thread appends, the render thread copies out the latest window.
/// Cloning yields another handle to the same ring.
#[derive(Debug, Clone)]
pub struct AnalysisTap {
    ring: Arc<Mutex<TapRing>>,
    window: usize,
}

impl AnalysisTap {
    pub fn new(window: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(TapRing {
                samples: vec![0.0; window],
                write: 0,
            })),
            window,
        }
    }

    /// Samples per snapshot
    pub fn window(&self) -> usize {
        self.window
    }

    /// Append a block of samples, overwriting the oldest
    pub fn push_block(&self, block: &[f32]) {
        if self.window == 0 {
            return;
        }
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);

        // Only the tail of an oversized block survives
        let block = &block[block.len().saturating_sub(self.window)..];
        for &sample in block {
            let write = ring.write;
            ring.samples[write] = sample;
            ring.write = (write + 1) % self.window;
        }
    }

    /// Copy the current window, oldest sample first
    pub fn snapshot_into(&self, out: &mut [f32]) {
        let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        let (newest_part, oldest_part) = ring.samples.split_at(ring.write);
        let n = out.len().min(self.window);
        for (dst, src) in out[..n].iter_mut().zip(oldest_part.iter().chain(newest_part)) {
            *dst = *src;
        }
    }

    /// Fresh copy of the current window
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.window];
        self.snapshot_into(&mut out);
        out
    }

    /// True when `other` observes the same ring
    pub fn same_tap(&self, other: &AnalysisTap) -> bool {
        Arc::ptr_eq(&self.ring, &other.ring)
    }

    /// Number of live handles to this ring (graph node included)
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.ring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_silent() {
        let tap = AnalysisTap::new(4);
        assert_eq!(tap.snapshot(), vec![0.0; 4]);
    }

    #[test]
    fn test_snapshot_is_chronological_after_wrap() {
        let tap = AnalysisTap::new(4);
        tap.push_block(&[1.0, 2.0, 3.0]);
        tap.push_block(&[4.0, 5.0]);
        assert_eq!(tap.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_oversized_block_keeps_tail() {
        let tap = AnalysisTap::new(3);
        tap.push_block(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(tap.snapshot(), vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_clones_share_ring() {
        let tap = AnalysisTap::new(2);
        let reader = tap.clone();
        tap.push_block(&[0.5, -0.5]);

        assert!(reader.same_tap(&tap));
        assert_eq!(reader.snapshot(), vec![0.5, -0.5]);
        assert_eq!(tap.handle_count(), 2);
    }
}
