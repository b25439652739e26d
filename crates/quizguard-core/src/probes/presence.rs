//! Probes on the page's presence: visibility, window focus, full-screen.

use crate::events::{ProbeEvent, ProbeKind, ViolationCategory};
use crate::probes::{Probe, Signal};
use crate::session::SessionView;

/// Page hidden (tab switch, minimise) after the session started.
#[derive(Debug, Default)]
pub struct VisibilityProbe;

impl Probe for VisibilityProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Visibility
    }

    fn observe(&mut self, signal: &Signal, session: &SessionView) -> Option<ProbeEvent> {
        match signal {
            Signal::VisibilityChanged { hidden: true } if session.started => {
                Some(ProbeEvent::Violation {
                    probe: self.kind(),
                    category: ViolationCategory::TabSwitch,
                })
            }
            _ => None,
        }
    }
}

/// Window lost input focus after the session started.
#[derive(Debug, Default)]
pub struct WindowFocusProbe;

impl Probe for WindowFocusProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::WindowFocus
    }

    fn observe(&mut self, signal: &Signal, session: &SessionView) -> Option<ProbeEvent> {
        match signal {
            Signal::WindowBlurred if session.started => Some(ProbeEvent::Violation {
                probe: self.kind(),
                category: ViolationCategory::TabSwitch,
            }),
            _ => None,
        }
    }
}

/// Forwards full-screen state changes.
///
/// Whether a change counts as a violation depends on the session phase, so
/// the machine decides that.
#[derive(Debug, Default)]
pub struct FullscreenProbe;

impl Probe for FullscreenProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Fullscreen
    }

    fn observe(&mut self, signal: &Signal, _session: &SessionView) -> Option<ProbeEvent> {
        match signal {
            Signal::FullscreenChanged { active } => {
                Some(ProbeEvent::FullscreenChanged { active: *active })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(started: bool) -> SessionView {
        SessionView {
            started,
            fullscreen_active: started,
            terminal: false,
        }
    }

    #[test]
    fn hidden_page_ignored_while_gating() {
        let hidden = Signal::VisibilityChanged { hidden: true };
        assert!(VisibilityProbe.observe(&hidden, &view(false)).is_none());
        assert!(VisibilityProbe.observe(&hidden, &view(true)).is_some());
    }

    #[test]
    fn page_becoming_visible_is_not_a_violation() {
        let shown = Signal::VisibilityChanged { hidden: false };
        assert!(VisibilityProbe.observe(&shown, &view(true)).is_none());
    }

    #[test]
    fn blur_is_tab_switch_once_started() {
        assert!(WindowFocusProbe.observe(&Signal::WindowBlurred, &view(false)).is_none());
        assert_eq!(
            WindowFocusProbe.observe(&Signal::WindowBlurred, &view(true)),
            Some(ProbeEvent::Violation {
                probe: ProbeKind::WindowFocus,
                category: ViolationCategory::TabSwitch,
            })
        );
    }

    #[test]
    fn fullscreen_changes_are_forwarded_in_any_phase() {
        let off = Signal::FullscreenChanged { active: false };
        assert_eq!(
            FullscreenProbe.observe(&off, &view(false)),
            Some(ProbeEvent::FullscreenChanged { active: false })
        );
    }
}
