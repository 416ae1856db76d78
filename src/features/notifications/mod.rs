//! # Feature: Local Notifications
//!
//! Contract for the host notification engine plus an in-process
//! implementation driven by tokio timers.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod local;
pub mod scheduler;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use local::LocalScheduler;
pub use scheduler::{
    ListenerHandle, ListenerKind, NotificationScheduler, ReceivedListener, ResponseListener,
};
pub use types::{
    Importance, NotificationChannel, NotificationContent, NotificationEvent, NotificationId,
    NotificationRequest, NotificationResponse, PermissionStatus, ScheduledNotification, Trigger,
    DEFAULT_ACTION,
};
