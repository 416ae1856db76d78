//! # Local Scheduler
//!
//! In-process notification engine. Each accepted request gets a tokio task
//! that sleeps until the trigger's next fire time, delivers to the received
//! listeners and, for repeating triggers, re-arms itself.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: `respond` for simulating taps on delivered notifications
//! - 1.0.0: Initial release

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use dashmap::DashMap;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::scheduler::{
    ListenerHandle, ListenerKind, NotificationScheduler, ReceivedListener, ResponseListener,
};
use super::types::{
    NotificationChannel, NotificationEvent, NotificationId, NotificationRequest,
    NotificationResponse, PermissionStatus, ScheduledNotification,
};
use crate::core::Clock;

struct PendingNotification {
    request: NotificationRequest,
    fire_at: NaiveDateTime,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    clock: Arc<dyn Clock>,
    permission: Mutex<PermissionStatus>,
    grant_on_request: bool,
    channels: DashMap<String, NotificationChannel>,
    pending: DashMap<NotificationId, PendingNotification>,
    delivered: DashMap<NotificationId, NotificationEvent>,
    received_listeners: DashMap<u64, ReceivedListener>,
    response_listeners: DashMap<u64, ResponseListener>,
    next_listener_id: AtomicU64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            if let Some(task) = &entry.task {
                task.abort();
            }
        }
    }
}

#[derive(Clone)]
pub struct LocalScheduler {
    inner: Arc<Inner>,
}

impl LocalScheduler {
    /// Create a scheduler. Must be called inside a tokio runtime.
    ///
    /// `grant_on_request` decides what `request_permission` answers, which
    /// stands in for the user tapping "Allow" or "Don't allow".
    pub fn new(clock: Arc<dyn Clock>, grant_on_request: bool) -> Self {
        LocalScheduler {
            inner: Arc::new(Inner {
                clock,
                permission: Mutex::new(PermissionStatus::Undetermined),
                grant_on_request,
                channels: DashMap::new(),
                pending: DashMap::new(),
                delivered: DashMap::new(),
                received_listeners: DashMap::new(),
                response_listeners: DashMap::new(),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    /// Override the permission state (settings screen toggles, tests)
    pub fn set_permission(&self, status: PermissionStatus) {
        match self.inner.permission.lock() {
            Ok(mut guard) => *guard = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }

    /// Simulate the user tapping a delivered notification
    pub fn respond(&self, id: &str, action: &str) -> Result<()> {
        let notification = self
            .inner
            .delivered
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| anyhow!("No delivered notification with id {id}"))?;

        let response = NotificationResponse {
            notification,
            action: action.to_string(),
        };

        let listeners: Vec<ResponseListener> = self
            .inner
            .response_listeners
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect();
        debug!(
            "Dispatching response '{action}' for {id} to {} listener(s)",
            listeners.len()
        );
        for listener in listeners {
            listener(&response);
        }
        Ok(())
    }

    /// Delivered notifications, oldest first
    pub fn delivered(&self) -> Vec<NotificationEvent> {
        let mut events: Vec<NotificationEvent> = self
            .inner
            .delivered
            .iter()
            .map(|e| e.value().clone())
            .collect();
        events.sort_by_key(|e| e.delivered_at);
        events
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        match kind {
            ListenerKind::Received => self.inner.received_listeners.len(),
            ListenerKind::Response => self.inner.response_listeners.len(),
        }
    }

    fn current_permission(&self) -> PermissionStatus {
        match self.inner.permission.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn next_listener_id(&self) -> u64 {
        self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Sleep until the entry is due, deliver, re-arm if it repeats
    async fn run_pending(inner: Weak<Inner>, id: NotificationId) {
        loop {
            let delay = {
                let Some(inner) = inner.upgrade() else { return };
                let Some(fire_at) = inner.pending.get(&id).map(|entry| entry.fire_at) else {
                    return;
                };
                let remaining = fire_at - inner.clock.now();
                remaining.to_std().unwrap_or_default()
            };

            tokio::time::sleep(delay).await;

            let Some(inner) = inner.upgrade() else { return };
            let (request, fire_at) = match inner.pending.get(&id) {
                Some(entry) => (entry.request.clone(), entry.fire_at),
                // Cancelled while sleeping
                None => return,
            };

            Self::deliver(&inner, &id, &request, fire_at);

            if !request.trigger.repeats() {
                inner.pending.remove(&id);
                return;
            }

            let base = fire_at.max(inner.clock.now());
            match request.trigger.next_fire_after(base) {
                Some(next) => {
                    if let Some(mut entry) = inner.pending.get_mut(&id) {
                        entry.fire_at = next;
                    } else {
                        return;
                    }
                }
                None => {
                    warn!("Trigger {} for {id} has no next fire time", request.trigger);
                    inner.pending.remove(&id);
                    return;
                }
            }
        }
    }

    fn deliver(inner: &Inner, id: &str, request: &NotificationRequest, fire_at: NaiveDateTime) {
        let event = NotificationEvent {
            id: id.to_string(),
            content: request.content.clone(),
            channel_id: request.channel_id.clone(),
            delivered_at: fire_at,
        };
        inner.delivered.insert(id.to_string(), event.clone());

        info!("🔔 {}: {} ({id})", event.content.title, event.content.body);

        let listeners: Vec<ReceivedListener> = inner
            .received_listeners
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }
}

#[async_trait]
impl NotificationScheduler for LocalScheduler {
    async fn permission_status(&self) -> Result<PermissionStatus> {
        Ok(self.current_permission())
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        let current = self.current_permission();
        if current.is_granted() {
            return Ok(current);
        }
        let status = if self.inner.grant_on_request {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        self.set_permission(status);
        info!("Notification permission request answered: {status}");
        Ok(status)
    }

    async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<()> {
        if channel.id.trim().is_empty() {
            bail!("Notification channel id is required");
        }
        self.inner
            .channels
            .insert(channel.id.clone(), channel.clone());
        debug!("Channel '{}' ready ({:?})", channel.id, channel.importance);
        Ok(())
    }

    async fn schedule(&self, request: NotificationRequest) -> Result<NotificationId> {
        let permission = self.current_permission();
        if !permission.is_granted() {
            bail!("Notification permission not granted (status: {permission})");
        }
        if let Some(channel_id) = &request.channel_id {
            if !self.inner.channels.contains_key(channel_id) {
                bail!("Unknown notification channel: {channel_id}");
            }
        }
        request.trigger.validate()?;

        let fire_at = request
            .trigger
            .next_fire_after(self.inner.clock.now())
            .ok_or_else(|| anyhow!("Trigger {} never fires", request.trigger))?;

        let id = Uuid::new_v4().to_string();
        debug!("Scheduling {id} {} (fires {fire_at})", request.trigger);

        self.inner.pending.insert(
            id.clone(),
            PendingNotification {
                request,
                fire_at,
                task: None,
            },
        );

        let task = tokio::spawn(Self::run_pending(Arc::downgrade(&self.inner), id.clone()));
        match self.inner.pending.get_mut(&id) {
            Some(mut entry) => entry.task = Some(task),
            // Already fired and finished
            None => drop(task),
        }

        Ok(id)
    }

    async fn cancel(&self, id: &str) -> Result<()> {
        if let Some((_, entry)) = self.inner.pending.remove(id) {
            if let Some(task) = entry.task {
                task.abort();
            }
            debug!("Cancelled notification {id}");
        }
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<ScheduledNotification>> {
        let mut pending: Vec<ScheduledNotification> = self
            .inner
            .pending
            .iter()
            .map(|entry| ScheduledNotification {
                id: entry.key().clone(),
                request: entry.request.clone(),
                next_fire: entry.fire_at,
            })
            .collect();
        pending.sort_by_key(|p| p.next_fire);
        Ok(pending)
    }

    fn add_received_listener(&self, listener: ReceivedListener) -> ListenerHandle {
        let id = self.next_listener_id();
        self.inner.received_listeners.insert(id, listener);
        ListenerHandle::new(id, ListenerKind::Received)
    }

    fn add_response_listener(&self, listener: ResponseListener) -> ListenerHandle {
        let id = self.next_listener_id();
        self.inner.response_listeners.insert(id, listener);
        ListenerHandle::new(id, ListenerKind::Response)
    }

    fn remove_listener(&self, handle: ListenerHandle) {
        match handle.kind() {
            ListenerKind::Received => {
                self.inner.received_listeners.remove(&handle.id());
            }
            ListenerKind::Response => {
                self.inner.response_listeners.remove(&handle.id());
            }
        }
    }
}
