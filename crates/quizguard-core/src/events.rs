use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::AdvanceOutcome;
use crate::question::{QuestionPayload, SelectionSet};
use crate::timer::Urgency;

/// Closed set of violation categories understood by the grading service.
///
/// On the wire each category is the name of the server-side counter it
/// bumps; the singular names are accepted when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationCategory {
    #[serde(rename = "focus_losses", alias = "focus_loss")]
    FocusLoss,
    #[serde(rename = "tab_switches", alias = "tab_switch")]
    TabSwitch,
    #[serde(rename = "fullscreen_exits", alias = "fullscreen_exit")]
    FullscreenExit,
}

impl ViolationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationCategory::FocusLoss => "focus_loss",
            ViolationCategory::TabSwitch => "tab_switch",
            ViolationCategory::FullscreenExit => "fullscreen_exit",
        }
    }
}

impl std::fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which monitor produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    ContextMenu,
    BlockedShortcut,
    Visibility,
    WindowFocus,
    Fullscreen,
    Viewport,
    PrintCapture,
}

impl ProbeKind {
    /// Probes whose detections mean the user left the page and must
    /// acknowledge a warning before carrying on.
    pub fn raises_tab_warning(self) -> bool {
        matches!(self, ProbeKind::Visibility | ProbeKind::WindowFocus)
    }
}

/// What a probe publishes onto the session bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEvent {
    /// A monitored condition was detected.
    Violation {
        probe: ProbeKind,
        category: ViolationCategory,
    },
    /// Exclusive full-screen state changed.
    FullscreenChanged { active: bool },
}

/// Who asked for the advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceTrigger {
    User,
    Timer,
}

/// Everything the session machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Probe(ProbeEvent),
    TimerTick,
    OptionSelected { option: usize },
    NextRequested,
    WarningAcknowledged,
    AdvanceCompleted(AdvanceOutcome),
}

/// Every observable consequence of a session transition.
///
/// The runtime executes the ones that need I/O (reports, advances) and
/// forwards all of them to the presenter.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    OverlayShown,
    OverlayHidden,
    FullscreenRequested,
    SessionStarted {
        at: DateTime<Utc>,
    },
    Violation {
        category: ViolationCategory,
        probe: ProbeKind,
        total: u32,
        at: DateTime<Utc>,
    },
    TabWarningShown {
        violations: u32,
    },
    TabWarningHidden,
    TimerArmed {
        limit_secs: u32,
    },
    TimerUpdated {
        remaining_secs: u32,
        urgency: Urgency,
    },
    TimerCancelled,
    TimerExpired,
    QuestionRendered {
        question: QuestionPayload,
        progress: String,
        progress_pct: f64,
        badge: &'static str,
    },
    NextAffordance {
        enabled: bool,
        label: &'static str,
    },
    StartAdvance {
        question_index: u32,
        selection: SelectionSet,
        trigger: AdvanceTrigger,
    },
    AdvanceAborted {
        reason: String,
    },
    Navigate {
        redirect: String,
    },
}
