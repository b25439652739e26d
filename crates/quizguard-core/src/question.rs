//! Question payloads, selection sets, and the renderer seam.
//!
//! The renderer is an external collaborator: it owns the payload currently
//! on screen and the user's selection for it. [`HeadlessRenderer`] keeps the
//! same state without drawing anything and is what the CLI and the tests use.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
}

impl QuestionKind {
    /// Badge text shown above the options.
    pub fn badge(self) -> &'static str {
        match self {
            QuestionKind::Single => "Select one answer",
            QuestionKind::Multiple => "Select all that apply",
        }
    }
}

/// One question as delivered by the grading service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPayload {
    /// 1-based position in the attempt.
    pub index: u32,
    pub total_count: u32,
    pub is_last: bool,
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
}

impl QuestionPayload {
    /// "Question N of M".
    pub fn progress_text(&self) -> String {
        format!("Question {} of {}", self.index, self.total_count)
    }

    /// 0.0 .. 100.0 progress through the attempt.
    pub fn progress_pct(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        (f64::from(self.index) / f64::from(self.total_count) * 100.0).min(100.0)
    }
}

/// The user's current choice(s) for the active question.
///
/// Backed by an ordered set so submission order never depends on click order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<usize>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Apply a click on `option` with the selection rules of `kind`.
    ///
    /// Single-choice replaces, multiple-choice toggles.
    pub fn toggle(&mut self, kind: QuestionKind, option: usize) {
        match kind {
            QuestionKind::Single => {
                self.0.clear();
                self.0.insert(option);
            }
            QuestionKind::Multiple => {
                if !self.0.remove(&option) {
                    self.0.insert(option);
                }
            }
        }
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<usize> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Materializes questions and tracks what the user picked.
pub trait QuestionRenderer: Send {
    /// Replace whatever is on screen with `payload` and clear the selection.
    fn render(&mut self, payload: &QuestionPayload);

    /// The user clicked option `option`. Out-of-range clicks are ignored.
    fn select(&mut self, option: usize);

    /// Snapshot of the current selection.
    fn selection(&self) -> SelectionSet;

    /// Payload currently on screen, if any.
    fn current(&self) -> Option<&QuestionPayload>;
}

/// Renderer with no visible output.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    current: Option<QuestionPayload>,
    selection: SelectionSet,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_question(payload: QuestionPayload) -> Self {
        let mut renderer = Self::new();
        renderer.render(&payload);
        renderer
    }
}

impl QuestionRenderer for HeadlessRenderer {
    fn render(&mut self, payload: &QuestionPayload) {
        self.current = Some(payload.clone());
        self.selection.clear();
    }

    fn select(&mut self, option: usize) {
        let Some(question) = self.current.as_ref() else {
            return;
        };
        if option >= question.options.len() {
            return;
        }
        self.selection.toggle(question.kind, option);
    }

    fn selection(&self) -> SelectionSet {
        self.selection.clone()
    }

    fn current(&self) -> Option<&QuestionPayload> {
        self.current.as_ref()
    }
}

#[cfg(test)]
pub(crate) fn sample_question(index: u32, total: u32, kind: QuestionKind) -> QuestionPayload {
    QuestionPayload {
        index,
        total_count: total,
        is_last: index == total,
        kind,
        prompt: format!("Prompt {index}"),
        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
    }
}
