//! Probes on blocked input gestures. These fire whether or not the session
//! has started.

use crate::events::{ProbeEvent, ProbeKind, ViolationCategory};
use crate::probes::{KeyChord, Probe, Signal};
use crate::session::SessionView;

fn focus_loss(probe: ProbeKind) -> ProbeEvent {
    ProbeEvent::Violation {
        probe,
        category: ViolationCategory::FocusLoss,
    }
}

/// Right-click / long-press menu.
#[derive(Debug, Default)]
pub struct ContextMenuProbe;

impl Probe for ContextMenuProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::ContextMenu
    }

    fn observe(&mut self, signal: &Signal, _session: &SessionView) -> Option<ProbeEvent> {
        matches!(signal, Signal::ContextMenu).then(|| focus_loss(self.kind()))
    }
}

/// Inspection, console and view-source shortcuts.
#[derive(Debug, Default)]
pub struct ShortcutProbe;

impl ShortcutProbe {
    pub fn is_blocked(chord: &KeyChord) -> bool {
        chord.is("F12")
            || (chord.ctrl && chord.shift && (chord.is("i") || chord.is("j")))
            || (chord.ctrl && chord.is("u"))
    }
}

impl Probe for ShortcutProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::BlockedShortcut
    }

    fn observe(&mut self, signal: &Signal, _session: &SessionView) -> Option<ProbeEvent> {
        match signal {
            Signal::KeyDown(chord) if Self::is_blocked(chord) => Some(focus_loss(self.kind())),
            _ => None,
        }
    }
}

/// Screenshot key released.
#[derive(Debug, Default)]
pub struct PrintCaptureProbe;

impl Probe for PrintCaptureProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::PrintCapture
    }

    fn observe(&mut self, signal: &Signal, _session: &SessionView) -> Option<ProbeEvent> {
        match signal {
            Signal::KeyUp(chord) if chord.is("PrintScreen") => Some(focus_loss(self.kind())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gating() -> SessionView {
        SessionView::default()
    }

    fn chord(s: &str) -> KeyChord {
        s.parse().unwrap()
    }

    #[test]
    fn context_menu_counts_before_start() {
        let event = ContextMenuProbe.observe(&Signal::ContextMenu, &gating());
        assert!(matches!(
            event,
            Some(ProbeEvent::Violation {
                category: ViolationCategory::FocusLoss,
                ..
            })
        ));
    }

    #[test]
    fn blocks_devtools_and_view_source() {
        for combo in ["F12", "ctrl+shift+i", "ctrl+shift+J", "ctrl+u", "ctrl+shift+u"] {
            assert!(ShortcutProbe::is_blocked(&chord(combo)), "{combo} should be blocked");
        }
    }

    #[test]
    fn ordinary_keys_pass() {
        for combo in ["i", "shift+i", "ctrl+i", "ctrl+c", "alt+u", "Tab"] {
            assert!(!ShortcutProbe::is_blocked(&chord(combo)), "{combo} should pass");
        }
    }

    #[test]
    fn shortcut_fires_on_key_down_only() {
        let mut probe = ShortcutProbe;
        assert!(probe.observe(&Signal::KeyUp(chord("F12")), &gating()).is_none());
        assert!(probe.observe(&Signal::KeyDown(chord("F12")), &gating()).is_some());
    }

    #[test]
    fn print_screen_fires_on_release() {
        let mut probe = PrintCaptureProbe;
        let key = KeyChord::plain("PrintScreen");
        assert!(probe.observe(&Signal::KeyDown(key.clone()), &gating()).is_none());
        assert!(probe.observe(&Signal::KeyUp(key), &gating()).is_some());
    }
}
