//! # Reminder Wizard
//!
//! Linear flow that collects a reminder one step at a time:
//! vitamin, dosage, timing, consistency, end date, summary. Every setter
//! validates its own input and moves the wizard to the next step. Going
//! back keeps what was already entered.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Custom weekday selection
//! - 1.0.0: Initial release

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::catalog::{Dosage, Vitamin, VitaminCatalog};
use crate::features::notifications::Trigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    ChooseVitamin,
    Dosage,
    Timing,
    Consistency,
    EndDate,
    Summary,
}

impl WizardStep {
    pub fn next(self) -> Self {
        match self {
            WizardStep::ChooseVitamin => WizardStep::Dosage,
            WizardStep::Dosage => WizardStep::Timing,
            WizardStep::Timing => WizardStep::Consistency,
            WizardStep::Consistency => WizardStep::EndDate,
            WizardStep::EndDate | WizardStep::Summary => WizardStep::Summary,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            WizardStep::ChooseVitamin | WizardStep::Dosage => WizardStep::ChooseVitamin,
            WizardStep::Timing => WizardStep::Dosage,
            WizardStep::Consistency => WizardStep::Timing,
            WizardStep::EndDate => WizardStep::Consistency,
            WizardStep::Summary => WizardStep::EndDate,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::ChooseVitamin => "choose vitamin",
            WizardStep::Dosage => "dosage",
            WizardStep::Timing => "timing",
            WizardStep::Consistency => "consistency",
            WizardStep::EndDate => "end date",
            WizardStep::Summary => "summary",
        };
        f.write_str(name)
    }
}

/// Which days a reminder fires on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum Consistency {
    Daily,
    Weekdays,
    Weekends,
    Custom(Vec<Weekday>),
}

impl Consistency {
    /// Specific weekdays, or `None` for every day
    pub fn weekdays(&self) -> Option<Vec<Weekday>> {
        match self {
            Consistency::Daily => None,
            Consistency::Weekdays => Some(vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]),
            Consistency::Weekends => Some(vec![Weekday::Sat, Weekday::Sun]),
            Consistency::Custom(days) => Some(days.clone()),
        }
    }

    /// Parse "daily", "weekdays", "weekends" or a day list like "mon,wed,fri"
    pub fn parse(text: &str) -> Result<Self, WizardError> {
        let text = text.trim().to_lowercase();
        match text.as_str() {
            "daily" | "every day" | "everyday" => return Ok(Consistency::Daily),
            "weekdays" => return Ok(Consistency::Weekdays),
            "weekends" => return Ok(Consistency::Weekends),
            _ => {}
        }

        let mut days: Vec<Weekday> = Vec::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let day: Weekday = part
                .parse()
                .map_err(|_| WizardError::InvalidWeekday(part.to_string()))?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
        if days.is_empty() {
            return Err(WizardError::NoWeekdays);
        }
        days.sort_by_key(|d| d.num_days_from_monday());
        Ok(Consistency::Custom(days))
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consistency::Daily => f.write_str("every day"),
            Consistency::Weekdays => f.write_str("weekdays"),
            Consistency::Weekends => f.write_str("weekends"),
            Consistency::Custom(days) => {
                let names: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardError {
    UnknownVitamin(String),
    InvalidDosage(String),
    NoTimes,
    InvalidTime(String),
    NoWeekdays,
    InvalidWeekday(String),
    InvalidDate(String),
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    /// A step was attempted before the steps leading to it were completed
    OutOfOrder { attempted: WizardStep, current: WizardStep },
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardError::UnknownVitamin(v) => write!(f, "Unknown vitamin: {v}"),
            WizardError::InvalidDosage(e) => write!(f, "Invalid dosage: {e}"),
            WizardError::NoTimes => f.write_str("Pick at least one reminder time"),
            WizardError::InvalidTime(t) => write!(f, "Invalid time '{t}' (use HH:MM)"),
            WizardError::NoWeekdays => f.write_str("Pick at least one day"),
            WizardError::InvalidWeekday(d) => write!(f, "Invalid day '{d}'"),
            WizardError::InvalidDate(d) => write!(f, "Invalid date '{d}' (use YYYY-MM-DD)"),
            WizardError::EndBeforeStart { start, end } => {
                write!(f, "End date {end} is before the start date {start}")
            }
            WizardError::OutOfOrder { attempted, current } => {
                write!(f, "Cannot set {attempted} yet; finish {current} first")
            }
        }
    }
}

impl std::error::Error for WizardError {}

/// Parse "HH:MM"
pub fn parse_time(text: &str) -> Result<NaiveTime, WizardError> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|_| WizardError::InvalidTime(text.trim().to_string()))
}

/// Parse "YYYY-MM-DD"
pub fn parse_date(text: &str) -> Result<NaiveDate, WizardError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| WizardError::InvalidDate(text.trim().to_string()))
}

/// Everything the wizard collected, ready to be scheduled
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderDraft {
    pub vitamin: Vitamin,
    pub dosage: Dosage,
    pub times: Vec<NaiveTime>,
    pub consistency: Consistency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl ReminderDraft {
    /// One repeating calendar trigger per time (and per weekday when not daily)
    pub fn triggers(&self) -> Vec<Trigger> {
        reminder_triggers(&self.times, &self.consistency)
    }
}

pub fn reminder_triggers(times: &[NaiveTime], consistency: &Consistency) -> Vec<Trigger> {
    use chrono::Timelike;

    let mut triggers = Vec::new();
    for time in times {
        match consistency.weekdays() {
            None => triggers.push(Trigger::daily(time.hour(), time.minute())),
            Some(days) => {
                for day in days {
                    triggers.push(Trigger::weekly(day, time.hour(), time.minute()));
                }
            }
        }
    }
    triggers
}

pub struct ReminderWizard {
    catalog: Arc<VitaminCatalog>,
    step: WizardStep,
    start_date: NaiveDate,
    vitamin: Option<Vitamin>,
    dosage: Option<Dosage>,
    times: Vec<NaiveTime>,
    consistency: Option<Consistency>,
    end_date: Option<NaiveDate>,
}

impl ReminderWizard {
    pub fn new(catalog: Arc<VitaminCatalog>, start_date: NaiveDate) -> Self {
        ReminderWizard {
            catalog,
            step: WizardStep::ChooseVitamin,
            start_date,
            vitamin: None,
            dosage: None,
            times: Vec::new(),
            consistency: None,
            end_date: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn vitamin(&self) -> Option<&Vitamin> {
        self.vitamin.as_ref()
    }

    pub fn back(&mut self) -> WizardStep {
        self.step = self.step.previous();
        self.step
    }

    fn enter(&self, attempted: WizardStep) -> Result<(), WizardError> {
        if attempted > self.step {
            return Err(WizardError::OutOfOrder {
                attempted,
                current: self.step,
            });
        }
        Ok(())
    }

    fn advance_from(&mut self, step: WizardStep) {
        self.step = step.next();
    }

    pub fn choose_vitamin(&mut self, key: &str) -> Result<&Vitamin, WizardError> {
        self.enter(WizardStep::ChooseVitamin)?;
        let vitamin = self
            .catalog
            .get(key)
            .cloned()
            .ok_or_else(|| WizardError::UnknownVitamin(key.trim().to_string()))?;

        // A different vitamin invalidates the dosage picked for the previous one
        if self.vitamin.as_ref().map(|v| &v.id) != Some(&vitamin.id) {
            self.dosage = None;
        }
        self.advance_from(WizardStep::ChooseVitamin);
        Ok(&*self.vitamin.insert(vitamin))
    }

    pub fn set_dosage(&mut self, text: &str) -> Result<&Dosage, WizardError> {
        self.enter(WizardStep::Dosage)?;
        let dosage = Dosage::parse(text).map_err(|e| WizardError::InvalidDosage(e.to_string()))?;
        self.advance_from(WizardStep::Dosage);
        Ok(&*self.dosage.insert(dosage))
    }

    /// Accept the chosen vitamin's default dosage
    pub fn use_default_dosage(&mut self) -> Result<&Dosage, WizardError> {
        self.enter(WizardStep::Dosage)?;
        let default = self
            .vitamin
            .as_ref()
            .map(|v| v.default_dosage.clone())
            .ok_or(WizardError::OutOfOrder {
                attempted: WizardStep::Dosage,
                current: WizardStep::ChooseVitamin,
            })?;
        self.set_dosage(&default)
    }

    pub fn set_times<S: AsRef<str>>(&mut self, times: &[S]) -> Result<&[NaiveTime], WizardError> {
        self.enter(WizardStep::Timing)?;
        let mut parsed = Vec::with_capacity(times.len());
        for text in times {
            let time = parse_time(text.as_ref())?;
            if !parsed.contains(&time) {
                parsed.push(time);
            }
        }
        if parsed.is_empty() {
            return Err(WizardError::NoTimes);
        }
        parsed.sort();
        self.times = parsed;
        self.advance_from(WizardStep::Timing);
        Ok(self.times.as_slice())
    }

    pub fn set_consistency(&mut self, consistency: Consistency) -> Result<(), WizardError> {
        self.enter(WizardStep::Consistency)?;
        if let Consistency::Custom(days) = &consistency {
            if days.is_empty() {
                return Err(WizardError::NoWeekdays);
            }
        }
        self.consistency = Some(consistency);
        self.advance_from(WizardStep::Consistency);
        Ok(())
    }

    /// `None` means the reminder runs until cancelled
    pub fn set_end_date(&mut self, end_date: Option<NaiveDate>) -> Result<(), WizardError> {
        self.enter(WizardStep::EndDate)?;
        if let Some(end) = end_date {
            if end < self.start_date {
                return Err(WizardError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        self.end_date = end_date;
        self.advance_from(WizardStep::EndDate);
        Ok(())
    }

    pub fn finish(&self) -> Result<ReminderDraft, WizardError> {
        self.enter(WizardStep::Summary)?;
        let incomplete = |step| WizardError::OutOfOrder {
            attempted: WizardStep::Summary,
            current: step,
        };
        Ok(ReminderDraft {
            vitamin: self
                .vitamin
                .clone()
                .ok_or_else(|| incomplete(WizardStep::ChooseVitamin))?,
            dosage: self
                .dosage
                .clone()
                .ok_or_else(|| incomplete(WizardStep::Dosage))?,
            times: self.times.clone(),
            consistency: self
                .consistency
                .clone()
                .ok_or_else(|| incomplete(WizardStep::Consistency))?,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }

    pub fn summary(&self) -> Result<String, WizardError> {
        Ok(render_summary(&self.finish()?))
    }
}

pub fn render_summary(draft: &ReminderDraft) -> String {
    let times: Vec<String> = draft
        .times
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();

    let mut summary = format!(
        "💊 {} ({})\n⏰ {}\n📅 {}\n",
        draft.vitamin.name,
        draft.dosage,
        times.join(", "),
        draft.consistency
    );
    match draft.end_date {
        Some(end) => summary.push_str(&format!("🏁 {} until {}\n", draft.start_date, end)),
        None => summary.push_str(&format!("🏁 From {}, no end date\n", draft.start_date)),
    }
    if let Some(guidance) = &draft.vitamin.guidance {
        summary.push_str(&format!("ℹ️ {guidance}\n"));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn wizard() -> ReminderWizard {
        ReminderWizard::new(Arc::new(VitaminCatalog::builtin()), today())
    }

    #[test]
    fn test_full_flow() {
        let mut w = wizard();
        assert_eq!(w.step(), WizardStep::ChooseVitamin);

        w.choose_vitamin("vitamin-d3").unwrap();
        assert_eq!(w.step(), WizardStep::Dosage);
        assert_eq!(w.use_default_dosage().unwrap().to_string(), "1000 IU");
        w.set_times(&["20:00", "08:00", "08:00"]).unwrap();
        w.set_consistency(Consistency::Weekdays).unwrap();
        w.set_end_date(NaiveDate::from_ymd_opt(2026, 12, 31)).unwrap();
        assert_eq!(w.step(), WizardStep::Summary);

        let draft = w.finish().unwrap();
        assert_eq!(draft.times.len(), 2);
        assert_eq!(draft.times[0], NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(draft.triggers().len(), 10);

        let summary = w.summary().unwrap();
        assert!(summary.contains("Vitamin D3 (1000 IU)"));
        assert!(summary.contains("08:00, 20:00"));
        assert!(summary.contains("until 2026-12-31"));
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut w = wizard();
        assert!(matches!(
            w.set_times(&["08:00"]),
            Err(WizardError::OutOfOrder { .. })
        ));
        assert!(w.summary().is_err());
    }

    #[test]
    fn test_back_keeps_values() {
        let mut w = wizard();
        w.choose_vitamin("zinc").unwrap();
        w.set_dosage("25 mg").unwrap();
        w.set_times(&["09:15"]).unwrap();
        assert_eq!(w.back(), WizardStep::Timing);
        assert_eq!(w.back(), WizardStep::Dosage);

        // Re-entering dosage moves forward again with timing intact
        w.set_dosage("30 mg").unwrap();
        assert_eq!(w.step(), WizardStep::Timing);
        w.set_times(&["09:15"]).unwrap();
        w.set_consistency(Consistency::Daily).unwrap();
        w.set_end_date(None).unwrap();
        assert_eq!(w.finish().unwrap().dosage.to_string(), "30 mg");
    }

    #[test]
    fn test_changing_vitamin_resets_dosage() {
        let mut w = wizard();
        w.choose_vitamin("zinc").unwrap();
        w.set_dosage("25 mg").unwrap();
        w.back();
        w.back();
        w.choose_vitamin("iron").unwrap();
        w.use_default_dosage().unwrap();
        w.set_times(&["07:00"]).unwrap();
        w.set_consistency(Consistency::Daily).unwrap();
        w.set_end_date(None).unwrap();
        assert_eq!(w.finish().unwrap().dosage.to_string(), "18 mg");
    }

    #[test]
    fn test_validation_errors() {
        let mut w = wizard();
        assert_eq!(
            w.choose_vitamin("kryptonite").unwrap_err(),
            WizardError::UnknownVitamin("kryptonite".to_string())
        );
        w.choose_vitamin("Vitamin C").unwrap();
        assert!(matches!(w.set_dosage("many"), Err(WizardError::InvalidDosage(_))));
        w.set_dosage("500 mg").unwrap();

        let empty: [&str; 0] = [];
        assert_eq!(w.set_times(&empty).unwrap_err(), WizardError::NoTimes);
        assert!(matches!(w.set_times(&["25:00"]), Err(WizardError::InvalidTime(_))));
        w.set_times(&["12:30"]).unwrap();

        assert_eq!(
            w.set_consistency(Consistency::Custom(vec![])).unwrap_err(),
            WizardError::NoWeekdays
        );
        w.set_consistency(Consistency::Weekends).unwrap();

        let yesterday = today().pred_opt().unwrap();
        assert!(matches!(
            w.set_end_date(Some(yesterday)),
            Err(WizardError::EndBeforeStart { .. })
        ));
        // End date equal to the start date is allowed
        w.set_end_date(Some(today())).unwrap();
    }

    #[test]
    fn test_consistency_parse() {
        assert_eq!(Consistency::parse("Daily").unwrap(), Consistency::Daily);
        assert_eq!(Consistency::parse("weekends").unwrap(), Consistency::Weekends);
        assert_eq!(
            Consistency::parse("fri, mon,wed,mon").unwrap(),
            Consistency::Custom(vec![Weekday::Mon, Weekday::Wed, Weekday::Fri])
        );
        assert!(matches!(
            Consistency::parse("mon,funday"),
            Err(WizardError::InvalidWeekday(_))
        ));
        assert_eq!(Consistency::parse(" , ").unwrap_err(), WizardError::NoWeekdays);
    }

    #[test]
    fn test_daily_triggers() {
        let times = vec![
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
        ];
        let triggers = reminder_triggers(&times, &Consistency::Daily);
        assert_eq!(triggers, vec![Trigger::daily(8, 0), Trigger::daily(21, 30)]);

        let triggers = reminder_triggers(&times[..1], &Consistency::Weekends);
        assert_eq!(
            triggers,
            vec![Trigger::weekly(Weekday::Sat, 8, 0), Trigger::weekly(Weekday::Sun, 8, 0)]
        );
    }
}
