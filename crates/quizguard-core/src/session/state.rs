use serde::{Deserialize, Serialize};

use crate::question::{QuestionKind, QuestionPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for the first full-screen engagement.
    Gating,
    /// Answering the current question.
    Active,
    /// Progression protocol in flight.
    Advancing,
    /// Assessment over; nothing else happens.
    Terminal,
}

/// Per-attempt context. Only the session machine mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub started: bool,
    pub fullscreen_active: bool,
    pub violation_count: u32,
    pub current_question_index: u32,
    pub total_questions: u32,
    pub is_last_question: bool,
    pub question_kind: Option<QuestionKind>,
}

impl Session {
    pub(crate) fn adopt(&mut self, payload: &QuestionPayload) {
        self.current_question_index = payload.index;
        self.total_questions = payload.total_count;
        self.is_last_question = payload.is_last;
        self.question_kind = Some(payload.kind);
    }
}

/// What probes are allowed to know about the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionView {
    pub started: bool,
    pub fullscreen_active: bool,
    pub terminal: bool,
}

/// Values injected once at bootstrap.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Seconds per question; `0` is untimed.
    pub time_limit_secs: u32,
    /// Question already on the page when the session loads.
    pub initial_question: Option<QuestionPayload>,
}
