//! Per-question countdown.
//!
//! Like the rest of the session core this timer has no thread of its own:
//! whoever owns it calls [`QuestionTimer::tick`] once per second. The runtime
//! does that from a tokio interval; tests call it directly.
//!
//! ```text
//! Stopped --arm--> Running --tick x limit--> Stopped (expiry fired once)
//!                     \--cancel--> Stopped (no expiry)
//! ```

use serde::{Deserialize, Serialize};

/// Presentation band for the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    Warning,
    Danger,
}

impl Urgency {
    pub const WARNING_AT_SECS: u32 = 20;
    pub const DANGER_AT_SECS: u32 = 10;

    pub fn for_remaining(remaining_secs: u32) -> Self {
        if remaining_secs <= Self::DANGER_AT_SECS {
            Urgency::Danger
        } else if remaining_secs <= Self::WARNING_AT_SECS {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

/// Result of one tick on a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Counting { remaining_secs: u32 },
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionTimer {
    limit_secs: u32,
    remaining_secs: u32,
    running: bool,
}

impl QuestionTimer {
    /// `limit_secs == 0` builds an untimed timer that never arms.
    pub fn new(limit_secs: u32) -> Self {
        Self {
            limit_secs,
            remaining_secs: limit_secs,
            running: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_untimed(&self) -> bool {
        self.limit_secs == 0
    }

    pub fn urgency(&self) -> Urgency {
        Urgency::for_remaining(self.remaining_secs)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Reset to the full limit and start counting.
    ///
    /// Returns `false` (and stays stopped) for an untimed session.
    pub fn arm(&mut self) -> bool {
        if self.is_untimed() {
            return false;
        }
        self.remaining_secs = self.limit_secs;
        self.running = true;
        true
    }

    /// Stop counting without firing expiry.
    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Advance by one second.
    ///
    /// Returns `None` when stopped. [`TimerTick::Expired`] is returned at most
    /// once per `arm`; the timer stops itself before reporting it.
    pub fn tick(&mut self) -> Option<TimerTick> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            return Some(TimerTick::Expired);
        }
        Some(TimerTick::Counting {
            remaining_secs: self.remaining_secs,
        })
    }
}
