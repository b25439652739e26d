//! Inspection-panel heuristic: a docked dev-tools panel shrinks the inner
//! viewport while the outer window stays the same size.

use serde::{Deserialize, Serialize};

use crate::events::{ProbeEvent, ProbeKind, ViolationCategory};
use crate::probes::{Probe, Signal};
use crate::session::SessionView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewportSample {
    pub outer_width: u32,
    pub outer_height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
}

impl ViewportSample {
    /// Whether either dimension lost more than `threshold` pixels.
    pub fn exceeds(&self, threshold: u32) -> bool {
        self.outer_width.saturating_sub(self.inner_width) > threshold
            || self.outer_height.saturating_sub(self.inner_height) > threshold
    }
}

/// Edge-triggered: one detection per crossing above the threshold, re-armed
/// once the gap drops back below it.
#[derive(Debug)]
pub struct ViewportProbe {
    threshold_px: u32,
    tripped: bool,
}

impl ViewportProbe {
    pub fn new(threshold_px: u32) -> Self {
        Self {
            threshold_px,
            tripped: false,
        }
    }
}

impl Probe for ViewportProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Viewport
    }

    fn observe(&mut self, signal: &Signal, _session: &SessionView) -> Option<ProbeEvent> {
        let Signal::ViewportSampled(sample) = signal else {
            return None;
        };
        let over = sample.exceeds(self.threshold_px);
        let rising = over && !self.tripped;
        self.tripped = over;
        rising.then(|| ProbeEvent::Violation {
            probe: self.kind(),
            category: ViolationCategory::FocusLoss,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(gap_w: u32, gap_h: u32) -> Signal {
        Signal::ViewportSampled(ViewportSample {
            outer_width: 1920,
            outer_height: 1080,
            inner_width: 1920 - gap_w,
            inner_height: 1080 - gap_h,
        })
    }

    #[test]
    fn fires_once_per_crossing() {
        let mut probe = ViewportProbe::new(160);
        let view = SessionView::default();
        let fired: Vec<bool> = [0, 300, 300, 300, 0, 0, 200, 200]
            .into_iter()
            .map(|gap| probe.observe(&sample(gap, 0), &view).is_some())
            .collect();
        assert_eq!(fired, vec![false, true, false, false, false, false, true, false]);
    }

    #[test]
    fn height_gap_counts_too() {
        let mut probe = ViewportProbe::new(160);
        assert!(probe.observe(&sample(0, 161), &SessionView::default()).is_some());
    }

    #[test]
    fn gap_at_threshold_is_not_over() {
        let mut probe = ViewportProbe::new(160);
        assert!(probe.observe(&sample(160, 160), &SessionView::default()).is_none());
    }

    #[test]
    fn inner_larger_than_outer_does_not_underflow() {
        let s = ViewportSample {
            outer_width: 100,
            outer_height: 100,
            inner_width: 400,
            inner_height: 400,
        };
        assert!(!s.exceeds(160));
    }
}
