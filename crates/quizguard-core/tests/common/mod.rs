//! Shared fixtures for session integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use quizguard_core::error::Result;
use quizguard_core::protocol::ViolationReport;
use quizguard_core::{
    CoreError, Effect, GradingService, NextResponse, QuestionKind, QuestionPayload, SelectionSet,
    TransportError, ViolationCategory,
};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Report(ViolationCategory),
    Submit(Vec<usize>),
    Next,
}

/// In-memory grading service with a scripted sequence of advance responses.
/// `None` entries (and an exhausted script) fail at the transport level.
#[derive(Default)]
pub struct FakeService {
    calls: Mutex<Vec<Call>>,
    script: Mutex<VecDeque<Option<NextResponse>>>,
    next_delay: Option<Duration>,
}

impl FakeService {
    pub fn new(script: Vec<Option<NextResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn with_next_delay(mut self, delay: Duration) -> Self {
        self.next_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl GradingService for FakeService {
    async fn report_violation(&self, report: &ViolationReport) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Report(report.category));
        Ok(())
    }

    async fn submit_answer(&self, selection: &SelectionSet) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Submit(selection.to_vec()));
        Ok(())
    }

    async fn next_question(&self) -> Result<NextResponse> {
        self.calls.lock().unwrap().push(Call::Next);
        if let Some(delay) = self.next_delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front().flatten();
        scripted.ok_or_else(|| {
            CoreError::from(TransportError::Status {
                endpoint: "/api/next".into(),
                status: 502,
            })
        })
    }
}

pub fn question(index: u32, total: u32, kind: QuestionKind) -> QuestionPayload {
    QuestionPayload {
        index,
        total_count: total,
        is_last: index == total,
        kind,
        prompt: format!("Question body {index}"),
        options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
    }
}

pub fn finished() -> Option<NextResponse> {
    Some(NextResponse::Finished {
        redirect: "/submit".into(),
    })
}

/// Presenter that forwards every effect to the test.
pub fn collector() -> (
    impl FnMut(&Effect) + Send + 'static,
    mpsc::UnboundedReceiver<Effect>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let presenter = move |effect: &Effect| {
        let _ = tx.send(effect.clone());
    };
    (presenter, rx)
}

/// Drain effects until one matches; returns everything seen up to and
/// including the match.
pub async fn wait_for(
    rx: &mut mpsc::UnboundedReceiver<Effect>,
    pred: impl Fn(&Effect) -> bool,
) -> Vec<Effect> {
    let mut seen = Vec::new();
    while let Some(effect) = rx.recv().await {
        let hit = pred(&effect);
        seen.push(effect);
        if hit {
            return seen;
        }
    }
    panic!("effect stream ended before expected effect; saw {seen:?}");
}

/// Let spawned fire-and-forget tasks run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
