//! # Feature: Vitamin Reminders
//!
//! Guided reminder creation and repeating vitamin notifications.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Plans are persisted with their notification ids; expiry pruning
//! - 1.1.0: Vitamin catalog can be loaded from YAML
//! - 1.0.0: Initial release

pub mod catalog;
pub mod scheduler;
pub mod wizard;

pub use catalog::{Dosage, Vitamin, VitaminCatalog};
pub use scheduler::{short_id, ReminderPlan, ReminderScheduler, REMINDERS_KEY, REMINDER_CHANNEL_ID};
pub use wizard::{Consistency, ReminderDraft, ReminderWizard, WizardError, WizardStep};
