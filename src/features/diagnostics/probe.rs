//! # Scheduling Probe
//!
//! Fires a spread of throwaway notifications at the scheduler (immediate,
//! relative delay, calendar) and records every identifier or failure in the
//! debug log, so delivery can be verified end to end on a device.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.2.0: Relative delay lands just ahead of the calendar target
//! - 1.1.0: Comprehensive test with permission request and enumeration
//! - 1.0.0: Initial debug plan

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDateTime, Timelike};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::log_sink::LogSink;
use crate::core::Clock;
use crate::features::notifications::{
    Importance, NotificationChannel, NotificationContent, NotificationId, NotificationRequest,
    NotificationScheduler, PermissionStatus, Trigger,
};

pub const DEBUG_CHANNEL_ID: &str = "vitamin-debug";
pub const IMMEDIATE_SECONDS: u64 = 2;
pub const TARGET_OFFSET_MINUTES: i64 = 2;
/// The relative-delay probe fires this long before the calendar target
pub const DELAY_LEAD_SECONDS: i64 = 5;
pub const COMPREHENSIVE_TEST_SECONDS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Immediate,
    RelativeDelay,
    Calendar,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Immediate => f.write_str("immediate"),
            ProbeKind::RelativeDelay => f.write_str("relative-delay"),
            ProbeKind::Calendar => f.write_str("calendar"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeStep {
    pub kind: ProbeKind,
    pub trigger: Trigger,
    pub fire_at: NaiveDateTime,
    pub outcome: Result<NotificationId, String>,
}

/// Summary of one debug run. Only lives as long as the caller keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugPlan {
    pub plan_id: String,
    /// Calendar target as "HH:MM"
    pub scheduled_time: String,
    /// Identifiers the scheduler issued, in request order
    pub notification_ids: Vec<NotificationId>,
    pub steps: Vec<ProbeStep>,
}

impl DebugPlan {
    pub fn failures(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|s| s.outcome.as_ref().err().map(|e| format!("{}: {e}", s.kind)))
            .collect()
    }
}

impl fmt::Display for DebugPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Debug plan {} (target {})", self.plan_id, self.scheduled_time)?;
        for step in &self.steps {
            match &step.outcome {
                Ok(id) => writeln!(f, "  ✅ {:<14} {} -> {id}", step.kind.to_string(), step.fire_at.format("%H:%M:%S"))?,
                Err(e) => writeln!(f, "  ❌ {:<14} {} -> {e}", step.kind.to_string(), step.fire_at.format("%H:%M:%S"))?,
            }
        }
        write!(f, "  {} notification(s) scheduled", self.notification_ids.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensiveReport {
    pub permission: PermissionStatus,
    /// Result of the permission prompt, if one was needed
    pub requested: Option<PermissionStatus>,
    pub test_notification_id: NotificationId,
    pub pending_count: usize,
}

pub fn debug_channel() -> NotificationChannel {
    let mut channel = NotificationChannel::new(DEBUG_CHANNEL_ID, "Delivery debugging", Importance::Max);
    channel.vibration_pattern = vec![0, 500, 250, 500];
    channel
}

/// Hour and minute of the calendar target for a given "now"
pub fn calendar_target(now: NaiveDateTime) -> (u32, u32) {
    let target = now + Duration::minutes(TARGET_OFFSET_MINUTES);
    (target.hour(), target.minute())
}

/// Seconds for the relative-delay probe so it fires shortly before `calendar_fire`
pub fn relative_delay_seconds(now: NaiveDateTime, calendar_fire: NaiveDateTime) -> u64 {
    let until_target = (calendar_fire - now).num_seconds() - DELAY_LEAD_SECONDS;
    let floor = IMMEDIATE_SECONDS as i64 + 1;
    until_target.max(floor) as u64
}

pub struct SchedulingProbe {
    scheduler: Arc<dyn NotificationScheduler>,
    sink: LogSink,
    clock: Arc<dyn Clock>,
}

impl SchedulingProbe {
    pub fn new(scheduler: Arc<dyn NotificationScheduler>, sink: LogSink, clock: Arc<dyn Clock>) -> Self {
        SchedulingProbe {
            scheduler,
            sink,
            clock,
        }
    }

    /// Schedule the immediate, relative-delay and calendar probes.
    ///
    /// A calendar failure is recorded in the plan and does not fail the run.
    /// Anything else aborts, is logged, and comes back as `Err`.
    pub async fn create_debug_plan(&self) -> Result<DebugPlan> {
        match self.build_debug_plan().await {
            Ok(plan) => {
                self.sink.log(format!(
                    "✅ Debug plan {} ready: {} notification(s), target {}",
                    plan.plan_id,
                    plan.notification_ids.len(),
                    plan.scheduled_time
                ));
                Ok(plan)
            }
            Err(e) => {
                self.sink.log(format!("❌ Debug plan failed: {e:#}"));
                Err(e)
            }
        }
    }

    async fn build_debug_plan(&self) -> Result<DebugPlan> {
        let now = self.clock.now();
        let (hour, minute) = calendar_target(now);
        let scheduled_time = format!("{hour:02}:{minute:02}");
        let plan_id = format!("debug-{}", Uuid::new_v4());

        self.sink.log(format!(
            "🧪 Creating debug plan {plan_id}: now {}, calendar target {scheduled_time}",
            now.format("%H:%M:%S")
        ));

        self.scheduler
            .ensure_channel(&debug_channel())
            .await
            .context("Failed to create debug notification channel")?;

        let calendar = Trigger::at(hour, minute);
        let calendar_fire = calendar
            .next_fire_after(now)
            .ok_or_else(|| anyhow!("Calendar target {scheduled_time} never fires"))?;
        let delay = Trigger::delay(relative_delay_seconds(now, calendar_fire));
        let immediate = Trigger::delay(IMMEDIATE_SECONDS);

        let mut steps = Vec::with_capacity(3);

        let fire_at = immediate.next_fire_after(now).unwrap_or(now);
        let id = self
            .schedule_probe(&plan_id, ProbeKind::Immediate, immediate.clone())
            .await
            .context("Immediate probe failed")?;
        steps.push(ProbeStep {
            kind: ProbeKind::Immediate,
            trigger: immediate,
            fire_at,
            outcome: Ok(id),
        });

        let fire_at = delay.next_fire_after(now).unwrap_or(now);
        let id = self
            .schedule_probe(&plan_id, ProbeKind::RelativeDelay, delay.clone())
            .await
            .context("Relative-delay probe failed")?;
        steps.push(ProbeStep {
            kind: ProbeKind::RelativeDelay,
            trigger: delay,
            fire_at,
            outcome: Ok(id),
        });

        let outcome = self
            .schedule_probe(&plan_id, ProbeKind::Calendar, calendar.clone())
            .await
            .map_err(|e| format!("{e:#}"));
        steps.push(ProbeStep {
            kind: ProbeKind::Calendar,
            trigger: calendar,
            fire_at: calendar_fire,
            outcome,
        });

        let notification_ids = steps
            .iter()
            .filter_map(|s| s.outcome.as_ref().ok().cloned())
            .collect();

        Ok(DebugPlan {
            plan_id,
            scheduled_time,
            notification_ids,
            steps,
        })
    }

    /// Schedule one probe and log its id or failure
    async fn schedule_probe(
        &self,
        plan_id: &str,
        kind: ProbeKind,
        trigger: Trigger,
    ) -> Result<NotificationId> {
        let description = trigger.to_string();
        let content = NotificationContent::new(
            format!("🧪 Debug: {kind}"),
            format!("Test notification ({description})"),
        )
        .with_data("planId", plan_id)
        .with_data("probe", kind.to_string());
        let request = NotificationRequest::new(content, trigger).on_channel(DEBUG_CHANNEL_ID);

        match self.scheduler.schedule(request).await {
            Ok(id) => {
                self.sink.log(format!("📅 {kind} probe scheduled {description}: {id}"));
                Ok(id)
            }
            Err(e) => {
                self.sink.log(format!("⚠️ {kind} probe failed ({description}): {e:#}"));
                Err(e)
            }
        }
    }

    /// Permission check, optional prompt, one 3-second test and an enumeration.
    /// The first failure stops the run; it is logged and returned.
    pub async fn run_comprehensive_test(&self) -> Result<ComprehensiveReport> {
        self.sink.log("🔬 Comprehensive notification test started");
        match self.comprehensive_steps().await {
            Ok(report) => {
                self.sink.log("🔬 Comprehensive notification test finished");
                Ok(report)
            }
            Err(e) => {
                self.sink.log(format!("❌ Comprehensive test aborted: {e:#}"));
                Err(e)
            }
        }
    }

    async fn comprehensive_steps(&self) -> Result<ComprehensiveReport> {
        let permission = self
            .scheduler
            .permission_status()
            .await
            .context("Permission query failed")?;
        self.sink.log(format!("🔐 Permission status: {permission}"));

        let requested = if permission.is_granted() {
            None
        } else {
            let result = self
                .scheduler
                .request_permission()
                .await
                .context("Permission request failed")?;
            self.sink.log(format!("🔐 Permission request result: {result}"));
            if !result.is_granted() {
                self.sink
                    .log("⚠️ Notifications will not be delivered without permission");
            }
            Some(result)
        };

        self.scheduler
            .ensure_channel(&debug_channel())
            .await
            .context("Failed to create debug notification channel")?;

        let content = NotificationContent::new(
            "🔬 Comprehensive test",
            format!("Should arrive in {COMPREHENSIVE_TEST_SECONDS} seconds"),
        )
        .with_data("probe", "comprehensive");
        let request = NotificationRequest::new(content, Trigger::delay(COMPREHENSIVE_TEST_SECONDS))
            .on_channel(DEBUG_CHANNEL_ID);
        let test_notification_id = self
            .scheduler
            .schedule(request)
            .await
            .context("Test notification failed")?;
        self.sink.log(format!(
            "📅 Test notification scheduled in {COMPREHENSIVE_TEST_SECONDS}s: {test_notification_id}"
        ));

        let pending = self
            .scheduler
            .pending()
            .await
            .context("Enumerating scheduled notifications failed")?;
        self.sink.log(format!(
            "📋 {} notification(s) reported as scheduled (enumeration is unreliable on Android; the count may be incomplete)",
            pending.len()
        ));

        Ok(ComprehensiveReport {
            permission,
            requested,
            test_notification_id,
            pending_count: pending.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FixedClock, MemoryStore};
    use crate::features::notifications::testing::MockScheduler;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn probe(scheduler: Arc<MockScheduler>, now: NaiveDateTime) -> (SchedulingProbe, LogSink) {
        let sink = LogSink::new(Arc::new(MemoryStore::new()), 100);
        let probe = SchedulingProbe::new(scheduler, sink.clone(), Arc::new(FixedClock::new(now)));
        (probe, sink)
    }

    #[test]
    fn test_calendar_target_examples() {
        assert_eq!(calendar_target(at(10, 0, 0)), (10, 2));
        assert_eq!(calendar_target(at(10, 59, 0)), (11, 1));
        assert_eq!(calendar_target(at(23, 59, 30)), (0, 1));
    }

    #[test]
    fn test_relative_delay_lands_before_calendar() {
        let now = at(10, 0, 0);
        assert_eq!(relative_delay_seconds(now, at(10, 2, 0)), 115);

        let now = at(10, 0, 59);
        assert_eq!(relative_delay_seconds(now, at(10, 2, 0)), 56);
    }

    #[tokio::test]
    async fn test_debug_plan_schedules_three_in_order() {
        let scheduler = MockScheduler::granted();
        let (probe, sink) = probe(scheduler.clone(), at(10, 0, 0));

        let plan = probe.create_debug_plan().await.unwrap();
        assert_eq!(plan.scheduled_time, "10:02");
        assert_eq!(plan.notification_ids.len(), 3);
        assert!(plan.failures().is_empty());

        let fire: Vec<NaiveDateTime> = plan.steps.iter().map(|s| s.fire_at).collect();
        assert!(fire[0] < fire[1]);
        assert!(fire[1] < fire[2]);
        assert_eq!(fire[2], at(10, 2, 0));

        let requests = scheduler.scheduled_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].trigger, Trigger::delay(IMMEDIATE_SECONDS));
        assert_eq!(requests[2].trigger, Trigger::at(10, 2));
        assert!(requests
            .iter()
            .all(|r| r.channel_id.as_deref() == Some(DEBUG_CHANNEL_ID)));
        assert_eq!(scheduler.channels.lock().unwrap()[0].id, DEBUG_CHANNEL_ID);

        let logs = sink.entries();
        assert!(logs.iter().any(|l| l.contains(&plan.notification_ids[0])));
        assert!(logs.iter().any(|l| l.contains(&plan.notification_ids[2])));
    }

    #[tokio::test]
    async fn test_minute_rollover_into_next_hour() {
        let scheduler = MockScheduler::granted();
        let (probe, _sink) = probe(scheduler.clone(), at(10, 59, 0));

        let plan = probe.create_debug_plan().await.unwrap();
        assert_eq!(plan.scheduled_time, "11:01");
        assert_eq!(scheduler.scheduled_requests()[2].trigger, Trigger::at(11, 1));
    }

    #[tokio::test]
    async fn test_calendar_failure_is_partial_success() {
        let scheduler = MockScheduler::granted();
        MockScheduler::flag(&scheduler.fail_calendar);
        let (probe, sink) = probe(scheduler.clone(), at(10, 0, 0));

        let plan = probe.create_debug_plan().await.unwrap();
        assert_eq!(plan.notification_ids.len(), 2);
        assert_eq!(plan.failures().len(), 1);
        assert!(plan.failures()[0].starts_with("calendar"));
        assert!(sink
            .entries()
            .iter()
            .any(|l| l.contains("calendar probe failed")));
    }

    #[tokio::test]
    async fn test_early_failure_aborts_plan() {
        let scheduler = MockScheduler::granted();
        MockScheduler::flag(&scheduler.fail_delay);
        let (probe, sink) = probe(scheduler.clone(), at(10, 0, 0));

        assert!(probe.create_debug_plan().await.is_err());
        assert!(scheduler.scheduled_requests().is_empty());
        assert!(sink.entries().iter().any(|l| l.contains("Debug plan failed")));
    }

    #[tokio::test]
    async fn test_comprehensive_requests_permission_when_missing() {
        let scheduler = MockScheduler::with_permission(PermissionStatus::Undetermined);
        MockScheduler::flag(&scheduler.grant_on_request);
        let (probe, sink) = probe(scheduler.clone(), at(10, 0, 0));

        let report = probe.run_comprehensive_test().await.unwrap();
        assert_eq!(report.permission, PermissionStatus::Undetermined);
        assert_eq!(report.requested, Some(PermissionStatus::Granted));
        assert_eq!(report.pending_count, 1);

        let logs = sink.entries();
        assert!(logs.iter().any(|l| l.contains("Permission request result: granted")));
        assert!(logs.iter().any(|l| l.contains("unreliable on Android")));
    }

    #[tokio::test]
    async fn test_comprehensive_skips_prompt_when_granted() {
        let scheduler = MockScheduler::granted();
        let (probe, _sink) = probe(scheduler.clone(), at(10, 0, 0));

        let report = probe.run_comprehensive_test().await.unwrap();
        assert_eq!(report.requested, None);
        assert_eq!(
            scheduler.scheduled_requests()[0].trigger,
            Trigger::delay(COMPREHENSIVE_TEST_SECONDS)
        );
    }

    #[tokio::test]
    async fn test_comprehensive_failure_is_logged() {
        let scheduler = MockScheduler::granted();
        MockScheduler::flag(&scheduler.fail_pending);
        let (probe, sink) = probe(scheduler.clone(), at(10, 0, 0));

        assert!(probe.run_comprehensive_test().await.is_err());
        assert!(sink
            .entries()
            .iter()
            .any(|l| l.contains("Comprehensive test aborted")));
    }
}
