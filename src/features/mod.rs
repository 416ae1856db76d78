//! # Features Layer
//!
//! Each feature lives in its own module with a versioned header. Features
//! depend on `core` and on `notifications`, never on the command layer.

pub mod diagnostics;
pub mod disclaimer;
pub mod notes;
pub mod notifications;
pub mod reminders;
pub mod theme;

// Diagnostics
pub use diagnostics::{
    ComprehensiveReport, DebugPlan, HealthCheck, HealthIssue, ListenerRegistry, LogSink,
    MonitoringOutcome, SchedulingProbe,
};
// Disclaimer
pub use disclaimer::DisclaimerGate;
// Notes
pub use notes::{Note, NoteBook};
// Notifications
pub use notifications::{LocalScheduler, NotificationScheduler};
// Reminders
pub use reminders::{ReminderPlan, ReminderScheduler, ReminderWizard, VitaminCatalog};
// Theme
pub use theme::{ThemeMode, ThemeStore};
