//! Notification scheduler trait
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::types::{
    NotificationChannel, NotificationEvent, NotificationId, NotificationRequest,
    NotificationResponse, PermissionStatus, ScheduledNotification,
};

pub type ReceivedListener = Arc<dyn Fn(&NotificationEvent) + Send + Sync>;
pub type ResponseListener = Arc<dyn Fn(&NotificationResponse) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Received,
    Response,
}

/// Opaque subscription token returned by the scheduler.
///
/// Deliberately not `Clone`: whoever holds the handle owns the subscription
/// and gives it back through [`NotificationScheduler::remove_listener`].
#[derive(Debug, PartialEq, Eq)]
pub struct ListenerHandle {
    id: u64,
    kind: ListenerKind,
}

impl ListenerHandle {
    pub fn new(id: u64, kind: ListenerKind) -> Self {
        ListenerHandle { id, kind }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

/// The host's local notification engine
///
/// Implementations accept content plus a trigger and eventually deliver it.
/// Enumeration through [`pending`](Self::pending) is best effort: some
/// platforms drop entries or report stale ones.
///
/// # Example
///
/// ```ignore
/// let id = scheduler
///     .schedule(NotificationRequest::new(
///         NotificationContent::new("Vitamin D3", "1000 IU with breakfast"),
///         Trigger::daily(8, 0),
///     ))
///     .await?;
/// scheduler.cancel(&id).await?;
/// ```
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    async fn permission_status(&self) -> Result<PermissionStatus>;

    /// Ask the user for permission; returns the resulting status
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Create or replace a notification channel
    async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<()>;

    async fn schedule(&self, request: NotificationRequest) -> Result<NotificationId>;

    /// Cancel a pending notification. Unknown ids are not an error.
    async fn cancel(&self, id: &str) -> Result<()>;

    async fn pending(&self) -> Result<Vec<ScheduledNotification>>;

    fn add_received_listener(&self, listener: ReceivedListener) -> ListenerHandle;

    fn add_response_listener(&self, listener: ResponseListener) -> ListenerHandle;

    fn remove_listener(&self, handle: ListenerHandle);
}
