//! Utility command handlers
//!
//! Handles: ping, status
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Status reports notification permission and reminder counts
//! - 1.0.0: Extracted from the monolithic command handler

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::input::CommandInput;

/// Handler for utility commands: ping, status
pub struct UtilityHandler;

#[async_trait]
impl CommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["ping", "status"]
    }

    fn usage(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("ping", "Check that the app responds"),
            ("status", "Show version, platform, permission and reminder count"),
        ]
    }

    async fn handle(&self, ctx: Arc<CommandContext>, input: &CommandInput) -> Result<String> {
        match input.name.as_str() {
            "ping" => Ok("Pong!".to_string()),
            "status" => self.handle_status(&ctx).await,
            _ => Ok(String::new()),
        }
    }
}

impl UtilityHandler {
    async fn handle_status(&self, ctx: &CommandContext) -> Result<String> {
        let permission = match ctx.scheduler.permission_status().await {
            Ok(status) => status.to_string(),
            Err(e) => format!("unknown ({e})"),
        };
        let reminders = ctx.reminders.list().await?.len();
        let monitoring = ctx.listeners.lock().await.is_monitoring();
        let uptime = ctx.start_time.elapsed().as_secs();

        Ok(format!(
            "**Status**\nVersion: {}\nPlatform: {}\nPermission: {permission}\nReminders: {reminders}\nMonitoring: {}\nTheme: {}\nDebug log: {}/{} entries\nUptime: {}h {}m {}s",
            env!("CARGO_PKG_VERSION"),
            ctx.config.platform,
            if monitoring { "on" } else { "off" },
            ctx.theme.mode().await,
            ctx.sink.len(),
            ctx.sink.capacity(),
            uptime / 3600,
            (uptime % 3600) / 60,
            uptime % 60
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::accepted_context;

    #[tokio::test]
    async fn test_status() {
        let f = accepted_context().await;
        let input = CommandInput::parse("status").unwrap().unwrap();
        let reply = UtilityHandler.handle(f.ctx.clone(), &input).await.unwrap();
        assert!(reply.contains("Platform: android"));
        assert!(reply.contains("Permission: granted"));
        assert!(reply.contains("Reminders: 0"));
        assert!(reply.contains("Monitoring: off"));
    }
}
