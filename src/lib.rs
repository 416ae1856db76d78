// Core layer - configuration, storage, clock
pub mod core;

// Features layer - notifications, diagnostics, reminders, theme, disclaimer, notes
pub mod features;

// Application layer
pub mod commands;

// Re-export core config for convenience
pub use core::Config;

// Re-export feature items
pub use features::{
    // Diagnostics
    HealthCheck, ListenerRegistry, LogSink, SchedulingProbe,
    // Notifications
    LocalScheduler, NotificationScheduler,
    // Reminders
    ReminderScheduler, ReminderWizard, VitaminCatalog,
    // Theme, disclaimer, notes
    DisclaimerGate, NoteBook, ThemeStore,
};

// Re-export command items
pub use commands::{CommandContext, CommandRegistry};
