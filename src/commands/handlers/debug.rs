//! Notification diagnostics command handlers
//!
//! Handles: debug-plan, debug-test, health, pending, logs, clear-logs,
//! monitor, unmonitor, tap
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Add pending and tap
//! - 1.0.0: Initial implementation

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::input::CommandInput;
use crate::features::diagnostics::MonitoringOutcome;
use crate::features::notifications::DEFAULT_ACTION;

const DEFAULT_LOG_LINES: usize = 20;

/// Handler for the notification diagnostics commands
pub struct DebugHandler;

#[async_trait]
impl CommandHandler for DebugHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &[
            "debug-plan",
            "debug-test",
            "health",
            "pending",
            "logs",
            "clear-logs",
            "monitor",
            "unmonitor",
            "tap",
        ]
    }

    fn usage(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("debug-plan", "Schedule immediate, delayed and calendar test notifications"),
            ("debug-test", "Check permission and send one test notification"),
            ("health", "Check that notifications can be scheduled"),
            ("pending", "List notifications the scheduler still intends to fire"),
            ("logs [lines=20] [all=false]", "Show the notification debug log"),
            ("clear-logs", "Clear the notification debug log"),
            ("monitor", "Log every delivered and tapped notification"),
            ("unmonitor", "Stop logging notification events"),
            ("tap [id] [action=default]", "Simulate tapping a delivered notification"),
        ]
    }

    async fn handle(&self, ctx: Arc<CommandContext>, input: &CommandInput) -> Result<String> {
        match input.name.as_str() {
            "debug-plan" => self.handle_debug_plan(&ctx).await,
            "debug-test" => self.handle_debug_test(&ctx).await,
            "health" => Ok(self.handle_health(&ctx).await),
            "pending" => self.handle_pending(&ctx).await,
            "logs" => self.handle_logs(&ctx, input).await,
            "clear-logs" => {
                ctx.sink.clear_logs().await;
                Ok("🧹 Debug log cleared.".to_string())
            }
            "monitor" => Ok(self.handle_monitor(&ctx).await),
            "unmonitor" => {
                let mut listeners = ctx.listeners.lock().await;
                if listeners.is_monitoring() {
                    listeners.stop_monitoring();
                    Ok("🛑 Notification monitoring stopped.".to_string())
                } else {
                    Ok("Monitoring was not running.".to_string())
                }
            }
            "tap" => self.handle_tap(&ctx, input),
            _ => Ok(String::new()),
        }
    }
}

impl DebugHandler {
    async fn handle_debug_plan(&self, ctx: &CommandContext) -> Result<String> {
        let plan = ctx.probe.create_debug_plan().await?;
        let mut reply = format!("🧪 {plan}");
        let failures = plan.failures();
        if !failures.is_empty() {
            reply.push_str("\n\n⚠️ Partially scheduled:\n");
            for failure in failures {
                reply.push_str(&format!("- {failure}\n"));
            }
        }
        Ok(reply)
    }

    async fn handle_debug_test(&self, ctx: &CommandContext) -> Result<String> {
        let report = ctx.probe.run_comprehensive_test().await?;
        let mut reply = format!("🔬 **Comprehensive test**\nPermission: {}\n", report.permission);
        if let Some(requested) = report.requested {
            reply.push_str(&format!("Permission request: {requested}\n"));
        }
        reply.push_str(&format!(
            "Test notification: {}\nReported as scheduled: {}\n",
            report.test_notification_id, report.pending_count
        ));
        reply.push_str("*See `logs` for details.*");
        Ok(reply)
    }

    async fn handle_health(&self, ctx: &CommandContext) -> String {
        let issues = ctx.health.check_health().await;
        if issues.is_empty() {
            return "✅ Notifications look healthy.".to_string();
        }
        let mut reply = format!("⚠️ Found {} issue(s):\n", issues.len());
        for issue in issues {
            reply.push_str(&format!("- {issue}\n"));
        }
        reply
    }

    async fn handle_pending(&self, ctx: &CommandContext) -> Result<String> {
        let mut pending = ctx.scheduler.pending().await?;
        if pending.is_empty() {
            return Ok("📭 Nothing is scheduled.".to_string());
        }
        pending.sort_by_key(|p| p.next_fire);

        let mut reply = format!("📋 {} scheduled notification(s):\n", pending.len());
        for entry in pending {
            reply.push_str(&format!(
                "`{}` {} ({}, next {})\n",
                entry.id,
                entry.request.content.title,
                entry.request.trigger,
                entry.next_fire.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        Ok(reply)
    }

    async fn handle_logs(&self, ctx: &CommandContext, input: &CommandInput) -> Result<String> {
        let all = input.get_bool_option("all")?.unwrap_or(false);
        let lines = match input.get_integer_option("lines")? {
            Some(n) if n > 0 => n as usize,
            Some(_) => return Err(anyhow!("lines must be greater than zero")),
            None => DEFAULT_LOG_LINES,
        };

        let logs = ctx.sink.get_logs().await;
        if logs.is_empty() {
            return Ok("📭 The debug log is empty.".to_string());
        }
        let lines = if all { logs.len() } else { lines };
        let start = logs.len().saturating_sub(lines);
        Ok(format!(
            "📜 Debug log ({} of {} entries):\n{}",
            logs.len() - start,
            logs.len(),
            logs[start..].join("\n")
        ))
    }

    async fn handle_monitor(&self, ctx: &CommandContext) -> String {
        match ctx.listeners.lock().await.start_monitoring() {
            MonitoringOutcome::Started => {
                "👂 Monitoring notifications. Events are written to the debug log.".to_string()
            }
            MonitoringOutcome::Unsupported(platform) => {
                format!("⚠️ Notification monitoring is not supported on {platform}.")
            }
        }
    }

    fn handle_tap(&self, ctx: &CommandContext, input: &CommandInput) -> Result<String> {
        let local = ctx
            .local
            .as_ref()
            .ok_or_else(|| anyhow!("Tapping is only available with the built-in scheduler"))?;

        let id = match input.get_string_or_arg("id", 0) {
            Some(id) => id,
            None => local
                .delivered()
                .last()
                .map(|event| event.id.clone())
                .ok_or_else(|| anyhow!("No notification has been delivered yet"))?,
        };
        let action = input
            .get_string_option("action")
            .unwrap_or_else(|| DEFAULT_ACTION.to_string());

        local.respond(&id, &action)?;
        Ok(format!("👆 Tapped {id} ({action})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::{accepted_context, test_config};
    use crate::core::{Clock, Config, FixedClock, MemoryStore, Platform};
    use crate::features::notifications::testing::MockScheduler;
    use crate::features::notifications::{
        LocalScheduler, NotificationContent, NotificationRequest, NotificationScheduler, Trigger,
    };
    use crate::features::reminders::VitaminCatalog;
    use chrono::NaiveDate;
    use std::time::Duration;

    async fn run(ctx: &Arc<CommandContext>, line: &str) -> Result<String> {
        let input = CommandInput::parse(line)?.unwrap();
        DebugHandler.handle(ctx.clone(), &input).await
    }

    #[tokio::test]
    async fn test_debug_plan_reports_steps() {
        let f = accepted_context().await;
        let reply = run(&f.ctx, "debug-plan").await.unwrap();
        assert!(reply.contains("target 10:02"));
        assert!(reply.contains("3 notification(s) scheduled"));
        assert!(!reply.contains("Partially"));
    }

    #[tokio::test]
    async fn test_debug_plan_partial_calendar_failure() {
        let f = accepted_context().await;
        MockScheduler::flag(&f.mock.fail_calendar);
        let reply = run(&f.ctx, "debug-plan").await.unwrap();
        assert!(reply.contains("2 notification(s) scheduled"));
        assert!(reply.contains("Partially scheduled"));
    }

    #[tokio::test]
    async fn test_health_and_logs() {
        let f = accepted_context().await;
        assert!(run(&f.ctx, "health").await.unwrap().contains("healthy"));

        run(&f.ctx, "debug-test").await.unwrap();
        let logs = run(&f.ctx, "logs lines=2").await.unwrap();
        assert!(logs.contains("(2 of"));
        assert!(logs.contains("Comprehensive notification test finished"));
        assert!(run(&f.ctx, "logs lines=0").await.is_err());
        assert!(run(&f.ctx, "logs all=maybe").await.is_err());

        let total = f.ctx.sink.get_logs().await.len();
        assert!(total > 2);
        let everything = run(&f.ctx, "logs lines=2 all=true").await.unwrap();
        assert!(everything.contains(&format!("({total} of {total} entries)")));

        run(&f.ctx, "clear-logs").await.unwrap();
        assert!(run(&f.ctx, "logs").await.unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_monitor_toggle() {
        let f = accepted_context().await;
        assert!(run(&f.ctx, "monitor").await.unwrap().contains("Monitoring"));
        assert_eq!(f.mock.received_count(), 1);
        assert!(run(&f.ctx, "unmonitor").await.unwrap().contains("stopped"));
        assert_eq!(f.mock.received_count(), 0);
        assert!(run(&f.ctx, "unmonitor").await.unwrap().contains("not running"));
    }

    #[tokio::test]
    async fn test_tap_requires_local_scheduler() {
        let f = accepted_context().await;
        assert!(run(&f.ctx, "tap").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_delivered_notification_is_logged() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        ));
        let local = LocalScheduler::new(clock.clone(), true);
        let ctx = CommandContext::build(
            Config {
                platform: Platform::Android,
                ..test_config()
            },
            Arc::new(MemoryStore::new()),
            Arc::new(local.clone()),
            clock,
            VitaminCatalog::builtin(),
        )
        .await
        .with_local(local.clone());
        let ctx = Arc::new(ctx);

        run(&ctx, "monitor").await.unwrap();
        local.request_permission().await.unwrap();
        let id = local
            .schedule(NotificationRequest::new(
                NotificationContent::new("Zinc", "15 mg"),
                Trigger::delay(2),
            ))
            .await
            .unwrap();
        assert!(run(&ctx, "pending").await.unwrap().contains(&id));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let reply = run(&ctx, "tap action=taken").await.unwrap();
        assert_eq!(reply, format!("👆 Tapped {id} (taken)"));

        let logs = ctx.sink.get_logs().await.join("\n");
        assert!(logs.contains("📬 RECEIVED"));
        assert!(logs.contains("👆 RESPONSE"));
        assert!(logs.contains("action=taken"));
        assert!(run(&ctx, "pending").await.unwrap().contains("Nothing"));
    }
}
