//! Violation probes.
//!
//! Raw environment [`Signal`]s go into the [`ProbeSet`]; every probe looks at
//! each signal independently and may publish a [`ProbeEvent`]. Probes see the
//! session only through a read-only [`SessionView`].

mod input;
mod presence;
mod viewport;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{ProbeEvent, ProbeKind};
use crate::session::SessionView;
use crate::storage::ProbeConfig;

pub use input::{ContextMenuProbe, PrintCaptureProbe, ShortcutProbe};
pub use presence::{FullscreenProbe, VisibilityProbe, WindowFocusProbe};
pub use viewport::{ViewportProbe, ViewportSample};

/// A key press with its modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyChord {
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive key comparison.
    pub fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid key chord '{0}'")]
pub struct ParseKeyChordError(String);

impl FromStr for KeyChord {
    type Err = ParseKeyChordError;

    /// Parses `ctrl+shift+i`, `F12`, `PrintScreen` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chord = KeyChord::default();
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty());
        let Some(key) = key else {
            return Err(ParseKeyChordError(s.to_string()));
        };
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                "meta" | "cmd" | "super" => chord.meta = true,
                _ => return Err(ParseKeyChordError(s.to_string())),
            }
        }
        chord.key = key.to_string();
        Ok(chord)
    }
}

/// Something the execution environment told us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Signal {
    ContextMenu,
    KeyDown(KeyChord),
    KeyUp(KeyChord),
    VisibilityChanged { hidden: bool },
    WindowBlurred,
    FullscreenChanged { active: bool },
    ViewportSampled(ViewportSample),
}

/// Detect one condition, report it.
pub trait Probe: Send {
    fn kind(&self) -> ProbeKind;

    /// Inspect `signal`; publish an event if it is one this probe watches for.
    fn observe(&mut self, signal: &Signal, session: &SessionView) -> Option<ProbeEvent>;
}

/// All active probes.
pub struct ProbeSet {
    probes: Vec<Box<dyn Probe>>,
}

impl ProbeSet {
    pub fn empty() -> Self {
        Self { probes: Vec::new() }
    }

    /// Every probe the session runs by default.
    pub fn standard(config: &ProbeConfig) -> Self {
        Self::empty()
            .with_probe(ContextMenuProbe)
            .with_probe(ShortcutProbe)
            .with_probe(VisibilityProbe)
            .with_probe(WindowFocusProbe)
            .with_probe(FullscreenProbe)
            .with_probe(ViewportProbe::new(config.viewport_gap_threshold_px))
            .with_probe(PrintCaptureProbe)
    }

    pub fn with_probe(mut self, probe: impl Probe + 'static) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    pub fn kinds(&self) -> Vec<ProbeKind> {
        self.probes.iter().map(|p| p.kind()).collect()
    }

    /// Offer `signal` to every probe. Nothing is published once the session
    /// is terminal.
    pub fn observe(&mut self, signal: &Signal, session: &SessionView) -> Vec<ProbeEvent> {
        if session.terminal {
            return Vec::new();
        }
        self.probes
            .iter_mut()
            .filter_map(|probe| probe.observe(signal, session))
            .collect()
    }
}
