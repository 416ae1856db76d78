//! Reminder command handlers
//!
//! Handles: vitamins, remind, reminders, cancel, snooze
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Vitamin plans built through the reminder wizard
//! - 1.0.0: Extracted from the monolithic command handler

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::input::CommandInput;
use crate::features::reminders::wizard::{parse_date, render_summary};
use crate::features::reminders::{short_id, Consistency, ReminderWizard};

/// Handler for reminder-related commands
pub struct RemindHandler;

#[async_trait]
impl CommandHandler for RemindHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["vitamins", "remind", "reminders", "cancel", "snooze"]
    }

    fn usage(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("vitamins", "List the vitamins you can be reminded about"),
            (
                "remind vitamin=<id> times=08:00,20:00 [dosage=\"500 mg\"] [days=daily|weekdays|weekends|mon,wed] [until=YYYY-MM-DD]",
                "Create a reminder",
            ),
            ("reminders", "List your reminders and the next dose"),
            ("cancel <id>", "Cancel a reminder"),
            ("snooze <id> for=10m", "Remind again after a delay"),
        ]
    }

    async fn handle(&self, ctx: Arc<CommandContext>, input: &CommandInput) -> Result<String> {
        match input.name.as_str() {
            "vitamins" => Ok(self.handle_vitamins(&ctx)),
            "remind" => self.handle_remind(&ctx, input).await,
            "reminders" => self.handle_reminders(&ctx).await,
            "cancel" => self.handle_cancel(&ctx, input).await,
            "snooze" => self.handle_snooze(&ctx, input).await,
            _ => Ok(String::new()),
        }
    }
}

impl RemindHandler {
    fn handle_vitamins(&self, ctx: &CommandContext) -> String {
        let mut list = String::from("💊 **Available vitamins:**\n");
        for vitamin in &ctx.catalog.vitamins {
            list.push_str(&format!(
                "`{}` {} (default {})\n",
                vitamin.id, vitamin.name, vitamin.default_dosage
            ));
        }
        list.push_str("\n*Use `remind vitamin=<id> times=HH:MM` to create a reminder.*");
        list
    }

    /// Handle remind command - walk the wizard with the given options
    async fn handle_remind(&self, ctx: &CommandContext, input: &CommandInput) -> Result<String> {
        let vitamin = input
            .get_string_or_arg("vitamin", 0)
            .ok_or_else(|| anyhow!("Which vitamin? Use `vitamins` to see the ids"))?;

        let today = ctx.clock.now().date();
        let mut wizard = ReminderWizard::new(ctx.catalog.clone(), today);
        wizard.choose_vitamin(&vitamin)?;

        match input.get_string_option("dosage") {
            Some(dosage) => wizard.set_dosage(&dosage)?,
            None => wizard.use_default_dosage()?,
        };

        let times = input.get_list_option("times");
        wizard.set_times(&times)?;

        let consistency = match input.get_string_option("days") {
            Some(days) => Consistency::parse(&days)?,
            None => Consistency::Daily,
        };
        wizard.set_consistency(consistency)?;

        let end_date = input
            .get_string_option("until")
            .map(|text| parse_date(&text))
            .transpose()?;
        wizard.set_end_date(end_date)?;

        let draft = wizard.finish()?;
        let plan = ctx.reminders.create(draft.clone()).await?;
        ctx.sink.log(format!(
            "📅 Reminder {} created for {} ({} notification(s))",
            short_id(&plan.id),
            plan.vitamin_name,
            plan.notification_ids.len()
        ));

        Ok(format!(
            "✅ Reminder created!\n\n{}\n*Reminder ID: `{}`*",
            render_summary(&draft),
            short_id(&plan.id)
        ))
    }

    async fn handle_reminders(&self, ctx: &CommandContext) -> Result<String> {
        let plans = ctx.reminders.list().await?;
        if plans.is_empty() {
            return Ok(
                "📋 You don't have any reminders.\n\nUse `remind vitamin=<id> times=HH:MM` to create one!"
                    .to_string(),
            );
        }

        let mut list = String::from("📋 **Your Reminders:**\n\n");
        for plan in &plans {
            list.push_str(&format!("{}\n", plan.describe()));
        }

        if let Some((plan, fire_at)) = ctx.reminders.next_dose().await? {
            let seconds = (fire_at - ctx.clock.now()).num_seconds();
            list.push_str(&format!(
                "\n⏭️ Next: {} at {} (in {})\n",
                plan.vitamin_name,
                fire_at.format("%a %H:%M"),
                Self::format_duration(seconds)
            ));
        }

        list.push_str("\n*Use `cancel <id>` to cancel a reminder.*");
        Ok(list)
    }

    async fn handle_cancel(&self, ctx: &CommandContext, input: &CommandInput) -> Result<String> {
        let Some(id) = input.get_string_or_arg("id", 0) else {
            return Ok(
                "❌ Please provide a reminder ID to cancel. Use `reminders` to see your reminder IDs."
                    .to_string(),
            );
        };

        if ctx.reminders.cancel(&id).await? {
            info!("Cancelled reminder {id}");
            ctx.sink.log(format!("🗑️ Reminder {id} cancelled"));
            Ok(format!("✅ Cancelled reminder `{id}`."))
        } else {
            Ok(format!("❌ Reminder `{id}` not found."))
        }
    }

    async fn handle_snooze(&self, ctx: &CommandContext, input: &CommandInput) -> Result<String> {
        let id = input
            .get_string_or_arg("id", 0)
            .ok_or_else(|| anyhow!("Missing reminder id"))?;
        let delay = input.get_string_option("for").unwrap_or_else(|| "10m".to_string());

        let Some(seconds) = Self::parse_duration(&delay) else {
            return Ok(
                "❌ Invalid time format. Use formats like `30m`, `2h`, or `1h30m`.".to_string(),
            );
        };

        ctx.reminders.snooze(&id, seconds as u64).await?;
        Ok(format!(
            "😴 Snoozed. I'll remind you again in **{}**.",
            Self::format_duration(seconds)
        ))
    }

    /// Parse a time duration string like "30m", "2h", "1d", "1h30m" into seconds
    fn parse_duration(time_str: &str) -> Option<i64> {
        let time_str = time_str.trim().to_lowercase();
        let mut total_seconds: i64 = 0;
        let mut current_number = String::new();

        for c in time_str.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let value: i64 = current_number.parse().ok()?;
                current_number.clear();

                let unit: i64 = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 60 * 60,
                    'd' => 60 * 60 * 24,
                    _ => return None,
                };
                total_seconds = total_seconds.checked_add(value.checked_mul(unit)?)?;
            }
        }

        // Trailing digits without a unit
        if !current_number.is_empty() {
            return None;
        }

        if total_seconds > 0 {
            Some(total_seconds)
        } else {
            None
        }
    }

    /// Format a duration in seconds into a human-readable string
    fn format_duration(seconds: i64) -> String {
        if seconds < 60 {
            format!("{} second{}", seconds, if seconds == 1 { "" } else { "s" })
        } else if seconds < 3600 {
            let mins = seconds / 60;
            format!("{} minute{}", mins, if mins == 1 { "" } else { "s" })
        } else if seconds < 86400 {
            let hours = seconds / 3600;
            let mins = (seconds % 3600) / 60;
            if mins > 0 {
                format!(
                    "{} hour{} {} minute{}",
                    hours,
                    if hours == 1 { "" } else { "s" },
                    mins,
                    if mins == 1 { "" } else { "s" }
                )
            } else {
                format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
            }
        } else {
            let days = seconds / 86400;
            let hours = (seconds % 86400) / 3600;
            if hours > 0 {
                format!(
                    "{} day{} {} hour{}",
                    days,
                    if days == 1 { "" } else { "s" },
                    hours,
                    if hours == 1 { "" } else { "s" }
                )
            } else {
                format!("{} day{}", days, if days == 1 { "" } else { "s" })
            }
        }
    }
}
