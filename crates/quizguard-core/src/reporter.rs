//! Best-effort violation reporting.
//!
//! Delivery is at-most-once: each detection produces one request, failures
//! are logged and dropped, nothing is retried. A lost report under-counts on
//! the server; a retry could double count, and the local count is what the
//! user sees either way.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::ViolationCategory;
use crate::protocol::{GradingService, ViolationReport};

#[derive(Clone)]
pub struct ViolationReporter {
    service: Arc<dyn GradingService>,
}

impl ViolationReporter {
    pub fn new(service: Arc<dyn GradingService>) -> Self {
        Self { service }
    }

    /// Send the report and wait for it, swallowing any failure.
    pub async fn deliver(&self, category: ViolationCategory) {
        let report = ViolationReport {
            category,
            at: Utc::now(),
        };
        match self.service.report_violation(&report).await {
            Ok(()) => debug!(%category, "violation reported"),
            Err(e) => warn!(%category, error = %e, "failed to report violation"),
        }
    }

    /// Fire-and-forget: spawn delivery on the current runtime.
    pub fn report(&self, category: ViolationCategory) -> JoinHandle<()> {
        let reporter = self.clone();
        tokio::spawn(async move { reporter.deliver(category).await })
    }
}
