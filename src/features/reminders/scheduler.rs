//! Reminder scheduling and persistence
//!
//! A plan is stored with the ids of the notifications it created so it can
//! be cancelled later. Repeating triggers have no end date of their own, so
//! expired plans are pruned by [`ReminderScheduler::prune_expired`].

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::catalog::Dosage;
use super::wizard::{reminder_triggers, Consistency, ReminderDraft};
use crate::core::{get_json, set_json, Clock, KeyValueStore};
use crate::features::notifications::{
    Importance, NotificationChannel, NotificationContent, NotificationId, NotificationRequest,
    NotificationScheduler, Trigger,
};

pub const REMINDERS_KEY: &str = "reminder_plans";
pub const REMINDER_CHANNEL_ID: &str = "vitamin-reminders";
pub const MAX_SNOOZE_SECONDS: u64 = 12 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderPlan {
    pub id: String,
    pub vitamin_id: String,
    pub vitamin_name: String,
    pub dosage: Dosage,
    #[serde(default)]
    pub guidance: Option<String>,
    pub times: Vec<NaiveTime>,
    pub consistency: Consistency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notification_ids: Vec<NotificationId>,
    pub created_at: NaiveDateTime,
}

impl ReminderPlan {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| end < today)
    }

    fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }

    /// Next time this plan should fire strictly after `now`
    pub fn next_fire_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        reminder_triggers(&self.times, &self.consistency)
            .iter()
            .filter_map(|trigger| {
                let mut from = now;
                // Skip occurrences before the start date
                if from.date() < self.start_date {
                    from = self.start_date.and_hms_opt(0, 0, 0)? - chrono::Duration::seconds(1);
                }
                trigger.next_fire_after(from)
            })
            .filter(|fire| self.is_active_on(fire.date()))
            .min()
    }

    fn content(&self) -> NotificationContent {
        let mut body = format!("Take {}", self.dosage);
        if let Some(guidance) = &self.guidance {
            body.push_str(&format!(". {guidance}"));
        }
        NotificationContent::new(format!("💊 Time for your {}", self.vitamin_name), body)
            .with_data("plan_id", self.id.as_str())
            .with_data("vitamin_id", self.vitamin_id.as_str())
    }

    pub fn describe(&self) -> String {
        let times: Vec<String> = self
            .times
            .iter()
            .map(|t| t.format("%H:%M").to_string())
            .collect();
        let until = match self.end_date {
            Some(end) => format!("until {end}"),
            None => "no end date".to_string(),
        };
        format!(
            "`{}` {} {} at {} ({}, {})",
            short_id(&self.id),
            self.vitamin_name,
            self.dosage,
            times.join(", "),
            self.consistency,
            until
        )
    }
}

/// First eight characters of a plan id, enough to address it in commands
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn reminder_channel() -> NotificationChannel {
    NotificationChannel::new(REMINDER_CHANNEL_ID, "Vitamin reminders", Importance::High)
}

pub struct ReminderScheduler {
    scheduler: Arc<dyn NotificationScheduler>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    // Serializes read-modify-write of the stored plan list
    write_lock: Mutex<()>,
}

impl ReminderScheduler {
    pub fn new(
        scheduler: Arc<dyn NotificationScheduler>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ReminderScheduler {
            scheduler,
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<ReminderPlan>> {
        Ok(get_json(self.store.as_ref(), REMINDERS_KEY)
            .await
            .context("Failed to read reminder plans")?
            .unwrap_or_default())
    }

    async fn save(&self, plans: &[ReminderPlan]) -> Result<()> {
        set_json(self.store.as_ref(), REMINDERS_KEY, plans)
            .await
            .context("Failed to save reminder plans")
    }

    async fn ensure_permission(&self) -> Result<()> {
        let status = self.scheduler.permission_status().await?;
        if status.is_granted() {
            return Ok(());
        }
        let status = self.scheduler.request_permission().await?;
        if !status.is_granted() {
            bail!("Notification permission is {status}; reminders cannot be scheduled");
        }
        Ok(())
    }

    /// Cancel every id, returning how many could not be cancelled
    async fn cancel_all(&self, ids: &[NotificationId]) -> usize {
        let mut failures = 0;
        for id in ids {
            if let Err(e) = self.scheduler.cancel(id).await {
                warn!("Failed to cancel notification {id}: {e}");
                failures += 1;
            }
        }
        failures
    }

    /// Schedule one notification per trigger. If any fails, the ones already
    /// scheduled are cancelled.
    async fn schedule_triggers(
        &self,
        content: &NotificationContent,
        triggers: Vec<Trigger>,
    ) -> Result<Vec<NotificationId>> {
        let mut ids = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            let request =
                NotificationRequest::new(content.clone(), trigger.clone()).on_channel(REMINDER_CHANNEL_ID);
            match self.scheduler.schedule(request).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    self.cancel_all(&ids).await;
                    return Err(e.context(format!("Failed to schedule reminder ({trigger})")));
                }
            }
        }
        Ok(ids)
    }

    /// Schedule a reminder and store it
    pub async fn create(&self, draft: ReminderDraft) -> Result<ReminderPlan> {
        let now = self.clock.now();
        if draft.end_date.is_some_and(|end| end < now.date()) {
            bail!("The end date has already passed");
        }

        self.ensure_permission().await?;
        self.scheduler
            .ensure_channel(&reminder_channel())
            .await
            .context("Failed to set up the reminder channel")?;

        let mut plan = ReminderPlan {
            id: Uuid::new_v4().to_string(),
            vitamin_id: draft.vitamin.id.clone(),
            vitamin_name: draft.vitamin.name.clone(),
            dosage: draft.dosage.clone(),
            guidance: draft.vitamin.guidance.clone(),
            times: draft.times.clone(),
            consistency: draft.consistency.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            notification_ids: Vec::new(),
            created_at: now,
        };

        plan.notification_ids = self
            .schedule_triggers(&plan.content(), draft.triggers())
            .await?;

        let _guard = self.write_lock.lock().await;
        let saved = async {
            let mut plans = self.load().await?;
            plans.push(plan.clone());
            self.save(&plans).await
        }
        .await;
        if let Err(e) = saved {
            self.cancel_all(&plan.notification_ids).await;
            return Err(e);
        }

        info!(
            "💊 Scheduled {} ({}) with {} notification(s)",
            plan.vitamin_name,
            short_id(&plan.id),
            plan.notification_ids.len()
        );
        Ok(plan)
    }

    pub async fn list(&self) -> Result<Vec<ReminderPlan>> {
        self.load().await
    }

    /// Find a plan by full id or unique id prefix
    pub async fn get(&self, id: &str) -> Result<Option<ReminderPlan>> {
        let plans = self.load().await?;
        Ok(find_plan(&plans, id)?.map(|index| plans[index].clone()))
    }

    /// Cancel a plan and its notifications. Returns false for unknown ids.
    pub async fn cancel(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut plans = self.load().await?;
        let Some(index) = find_plan(&plans, id)? else {
            return Ok(false);
        };

        let plan = plans.remove(index);
        let failures = self.cancel_all(&plan.notification_ids).await;
        if failures > 0 {
            warn!(
                "{failures} notification(s) of plan {} could not be cancelled",
                short_id(&plan.id)
            );
        }
        self.save(&plans).await?;
        info!("🗑️ Cancelled reminder {} ({})", plan.vitamin_name, short_id(&plan.id));
        Ok(true)
    }

    /// Remove plans whose end date is before today
    pub async fn prune_expired(&self) -> Result<Vec<ReminderPlan>> {
        let today = self.clock.now().date();
        let _guard = self.write_lock.lock().await;
        let plans = self.load().await?;
        let (expired, active): (Vec<_>, Vec<_>) =
            plans.into_iter().partition(|plan| plan.is_expired(today));

        if expired.is_empty() {
            return Ok(expired);
        }
        for plan in &expired {
            self.cancel_all(&plan.notification_ids).await;
        }
        self.save(&active).await?;
        info!("Pruned {} expired reminder(s)", expired.len());
        Ok(expired)
    }

    /// Schedule every stored plan again and drop expired ones.
    ///
    /// Used at startup, when the notification engine has forgotten what was
    /// scheduled in a previous run. Returns how many plans are active.
    pub async fn restore(&self) -> Result<usize> {
        let today = self.clock.now().date();
        let _guard = self.write_lock.lock().await;
        let mut plans = self.load().await?;
        if plans.is_empty() {
            return Ok(0);
        }

        self.ensure_permission().await?;
        self.scheduler
            .ensure_channel(&reminder_channel())
            .await
            .context("Failed to set up the reminder channel")?;

        plans.retain(|plan| !plan.is_expired(today));
        let mut failure = None;
        for plan in plans.iter_mut() {
            // Unknown ids are not an error, so stale ones are safe to cancel
            self.cancel_all(&plan.notification_ids).await;
            plan.notification_ids.clear();

            let triggers = reminder_triggers(&plan.times, &plan.consistency);
            match self.schedule_triggers(&plan.content(), triggers).await {
                Ok(ids) => plan.notification_ids = ids,
                Err(e) => {
                    failure = Some(e.context(format!("Failed to restore reminder {}", short_id(&plan.id))));
                    break;
                }
            }
        }

        // Keep the ids scheduled so far reachable even when a later plan failed
        if let Err(e) = self.save(&plans).await {
            for plan in &plans {
                self.cancel_all(&plan.notification_ids).await;
            }
            return Err(e);
        }
        if let Some(e) = failure {
            return Err(e);
        }
        info!("Restored {} reminder plan(s)", plans.len());
        Ok(plans.len())
    }

    /// Periodically prune expired plans
    pub async fn run_expiry_loop(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        info!("Reminder expiry task started (interval: {}s)", period.as_secs());

        loop {
            interval.tick().await;
            debug!("Checking for expired reminders...");
            if let Err(e) = self.prune_expired().await {
                warn!("Failed to prune expired reminders: {e:#}");
            }
        }
    }

    /// The soonest upcoming dose across all plans
    pub async fn next_dose(&self) -> Result<Option<(ReminderPlan, NaiveDateTime)>> {
        let now = self.clock.now();
        let plans = self.load().await?;
        Ok(plans
            .into_iter()
            .filter_map(|plan| plan.next_fire_after(now).map(|fire| (plan, fire)))
            .min_by_key(|(_, fire)| *fire))
    }

    /// Schedule a one-off repeat of a plan's reminder
    pub async fn snooze(&self, id: &str, seconds: u64) -> Result<NotificationId> {
        if seconds == 0 || seconds > MAX_SNOOZE_SECONDS {
            bail!("Snooze must be between 1 second and 12 hours");
        }
        let plan = self
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("No reminder with id {id}"))?;

        let request = NotificationRequest::new(plan.content(), Trigger::delay(seconds))
            .on_channel(REMINDER_CHANNEL_ID);
        let notification_id = self.scheduler.schedule(request).await?;
        info!("😴 Snoozed {} for {seconds}s", plan.vitamin_name);
        Ok(notification_id)
    }
}

fn find_plan(plans: &[ReminderPlan], id: &str) -> Result<Option<usize>> {
    let id = id.trim();
    if id.is_empty() {
        bail!("Reminder id is empty");
    }
    if let Some(index) = plans.iter().position(|p| p.id == id) {
        return Ok(Some(index));
    }

    let matches: Vec<usize> = plans
        .iter()
        .enumerate()
        .filter(|(_, p)| p.id.starts_with(id))
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [] => Ok(None),
        [index] => Ok(Some(*index)),
        _ => bail!("Reminder id '{id}' is ambiguous"),
    }
}
