//! Notification health check.
//!
//! Produces a fresh list of human-readable issues on every call; an empty
//! list means the scheduler looks healthy. Never fails.

use anyhow::{Context, Result};
use log::debug;
use std::fmt;
use std::sync::Arc;

use crate::features::notifications::{
    NotificationContent, NotificationScheduler, NotificationRequest, Trigger,
};

/// Throwaway probe delay; long enough that it never actually fires
pub const HEALTH_PROBE_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthIssue(String);

impl HealthIssue {
    pub fn new(description: impl Into<String>) -> Self {
        HealthIssue(description.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct HealthCheck {
    scheduler: Arc<dyn NotificationScheduler>,
}

impl HealthCheck {
    pub fn new(scheduler: Arc<dyn NotificationScheduler>) -> Self {
        HealthCheck { scheduler }
    }

    pub async fn check_health(&self) -> Vec<HealthIssue> {
        match self.run_checks().await {
            Ok(issues) => issues,
            Err(e) => vec![HealthIssue::new(format!("Health check failed: {e:#}"))],
        }
    }

    async fn run_checks(&self) -> Result<Vec<HealthIssue>> {
        let mut issues = Vec::new();

        let status = self
            .scheduler
            .permission_status()
            .await
            .context("Could not read notification permission")?;
        if !status.is_granted() {
            issues.push(HealthIssue::new(format!(
                "Notification permission not granted (status: {status})"
            )));
        }

        if let Err(e) = self.probe_scheduler().await {
            issues.push(HealthIssue::new(format!(
                "Scheduler did not accept a test notification: {e:#}"
            )));
        }

        debug!("Health check finished with {} issue(s)", issues.len());
        Ok(issues)
    }

    /// Schedule a far-future notification and cancel it straight away
    async fn probe_scheduler(&self) -> Result<()> {
        let request = NotificationRequest::new(
            NotificationContent::new("Health check", "This notification should never appear")
                .with_data("probe", "health"),
            Trigger::delay(HEALTH_PROBE_SECONDS),
        );
        let id = self.scheduler.schedule(request).await?;
        self.scheduler
            .cancel(&id)
            .await
            .with_context(|| format!("Could not cancel health probe {id}"))
    }
}
