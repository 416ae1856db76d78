//! Notification payloads, triggers and channels.

use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier issued by the scheduler for each accepted request
pub type NotificationId = String;

/// Action identifier reported when the user taps the notification body
pub const DEFAULT_ACTION: &str = "default";

/// Minimum interval for a repeating delay trigger
pub const MIN_REPEAT_SECONDS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        NotificationContent {
            title: title.into(),
            body: body.into(),
            data: Map::new(),
        }
    }

    /// Attach a data field (builder style)
    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

/// When the scheduler should fire a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fire `seconds` after scheduling, optionally every `seconds` after that
    Delay { seconds: u64, repeats: bool },
    /// Fire at a wall-clock hour:minute, optionally only on `weekday`
    Calendar {
        hour: u32,
        minute: u32,
        weekday: Option<Weekday>,
        repeats: bool,
    },
}

impl Trigger {
    pub fn delay(seconds: u64) -> Self {
        Trigger::Delay {
            seconds,
            repeats: false,
        }
    }

    pub fn at(hour: u32, minute: u32) -> Self {
        Trigger::Calendar {
            hour,
            minute,
            weekday: None,
            repeats: false,
        }
    }

    pub fn daily(hour: u32, minute: u32) -> Self {
        Trigger::Calendar {
            hour,
            minute,
            weekday: None,
            repeats: true,
        }
    }

    pub fn weekly(weekday: Weekday, hour: u32, minute: u32) -> Self {
        Trigger::Calendar {
            hour,
            minute,
            weekday: Some(weekday),
            repeats: true,
        }
    }

    pub fn repeats(&self) -> bool {
        match self {
            Trigger::Delay { repeats, .. } | Trigger::Calendar { repeats, .. } => *repeats,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Trigger::Delay { seconds, repeats } => {
                if seconds == 0 {
                    bail!("Delay trigger must be at least one second");
                }
                if repeats && seconds < MIN_REPEAT_SECONDS {
                    bail!(
                        "Repeating delay trigger must be at least {MIN_REPEAT_SECONDS} seconds (got {seconds})"
                    );
                }
            }
            Trigger::Calendar { hour, minute, .. } => {
                if hour > 23 || minute > 59 {
                    bail!("Invalid calendar trigger time {hour}:{minute:02}");
                }
            }
        }
        Ok(())
    }

    /// Next wall-clock instant strictly after `now` at which this trigger fires
    pub fn next_fire_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            Trigger::Delay { seconds, .. } => {
                let seconds = i64::try_from(seconds).ok()?;
                now.checked_add_signed(Duration::seconds(seconds))
            }
            Trigger::Calendar {
                hour,
                minute,
                weekday,
                ..
            } => {
                let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
                (0..=7).find_map(|offset| {
                    let date = now.date().checked_add_signed(Duration::days(offset))?;
                    let candidate = date.and_time(time);
                    let weekday_matches = weekday.map_or(true, |w| date.weekday() == w);
                    (weekday_matches && candidate > now).then_some(candidate)
                })
            }
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Delay { seconds, repeats } => {
                if *repeats {
                    write!(f, "every {seconds}s")
                } else {
                    write!(f, "in {seconds}s")
                }
            }
            Trigger::Calendar {
                hour,
                minute,
                weekday,
                repeats,
            } => match (weekday, repeats) {
                (Some(day), true) => write!(f, "every {day} at {hour:02}:{minute:02}"),
                (Some(day), false) => write!(f, "next {day} at {hour:02}:{minute:02}"),
                (None, true) => write!(f, "daily at {hour:02}:{minute:02}"),
                (None, false) => write!(f, "at {hour:02}:{minute:02}"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub content: NotificationContent,
    pub trigger: Trigger,
    pub channel_id: Option<String>,
}

impl NotificationRequest {
    pub fn new(content: NotificationContent, trigger: Trigger) -> Self {
        NotificationRequest {
            content,
            trigger,
            channel_id: None,
        }
    }

    pub fn on_channel(mut self, channel_id: &str) -> Self {
        self.channel_id = Some(channel_id.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Min,
    Low,
    Default,
    High,
    Max,
}

/// OS-level grouping controlling importance, sound and vibration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub sound: bool,
    /// Vibration pattern in milliseconds (off, on, off, on...)
    pub vibration_pattern: Vec<u64>,
}

impl NotificationChannel {
    pub fn new(id: &str, name: &str, importance: Importance) -> Self {
        NotificationChannel {
            id: id.to_string(),
            name: name.to_string(),
            importance,
            sound: true,
            vibration_pattern: vec![0, 250, 250, 250],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request the scheduler still intends to fire
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledNotification {
    pub id: NotificationId,
    pub request: NotificationRequest,
    pub next_fire: NaiveDateTime,
}

/// A notification that has been presented to the user
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub id: NotificationId,
    pub content: NotificationContent,
    pub channel_id: Option<String>,
    pub delivered_at: NaiveDateTime,
}

/// The user interacted with a delivered notification
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationResponse {
    pub notification: NotificationEvent,
    pub action: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19) // a Monday
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_delay_next_fire() {
        let now = at(10, 0, 0);
        assert_eq!(Trigger::delay(120).next_fire_after(now), Some(at(10, 2, 0)));
    }

    #[test]
    fn test_calendar_later_today() {
        let now = at(10, 0, 0);
        assert_eq!(Trigger::at(10, 2).next_fire_after(now), Some(at(10, 2, 0)));
    }

    #[test]
    fn test_calendar_rolls_to_tomorrow() {
        let now = at(10, 0, 0);
        let next = Trigger::daily(8, 0).next_fire_after(now).unwrap();
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(next.time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        // Exactly now is not "after now"
        let next = Trigger::at(10, 0).next_fire_after(now).unwrap();
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
    }

    #[test]
    fn test_weekly_finds_next_weekday() {
        let now = at(10, 0, 0);
        let next = Trigger::weekly(Weekday::Wed, 9, 30)
            .next_fire_after(now)
            .unwrap();
        assert_eq!(next, NaiveDate::from_ymd_opt(2026, 10, 21).unwrap().and_hms_opt(9, 30, 0).unwrap());

        // Same weekday but time already passed -> one week later
        let next = Trigger::weekly(Weekday::Mon, 9, 0)
            .next_fire_after(now)
            .unwrap();
        assert_eq!(next, NaiveDate::from_ymd_opt(2026, 10, 26).unwrap().and_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn test_validate() {
        assert!(Trigger::delay(0).validate().is_err());
        assert!(Trigger::delay(2).validate().is_ok());
        assert!(Trigger::Delay { seconds: 30, repeats: true }.validate().is_err());
        assert!(Trigger::at(24, 0).validate().is_err());
        assert!(Trigger::at(23, 60).validate().is_err());
        assert!(Trigger::daily(23, 59).validate().is_ok());
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(Trigger::delay(2).to_string(), "in 2s");
        assert_eq!(Trigger::daily(8, 5).to_string(), "daily at 08:05");
        assert_eq!(Trigger::weekly(Weekday::Fri, 21, 0).to_string(), "every Fri at 21:00");
    }
}
