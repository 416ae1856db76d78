//! Scripted scheduler for unit tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::scheduler::{
    ListenerHandle, ListenerKind, NotificationScheduler, ReceivedListener, ResponseListener,
};
use super::types::{
    NotificationChannel, NotificationEvent, NotificationId, NotificationRequest,
    NotificationResponse, PermissionStatus, ScheduledNotification, Trigger,
};

#[derive(Default)]
pub struct MockScheduler {
    pub permission: Mutex<Option<PermissionStatus>>,
    pub grant_on_request: AtomicBool,
    pub fail_permission_query: AtomicBool,
    pub fail_channel: AtomicBool,
    pub fail_delay: AtomicBool,
    pub fail_calendar: AtomicBool,
    pub fail_cancel: AtomicBool,
    pub fail_pending: AtomicBool,
    /// Successful `schedule` calls left before every further call fails
    pub schedule_budget: Mutex<Option<usize>>,
    pub scheduled: Mutex<Vec<(NotificationId, NotificationRequest)>>,
    pub cancelled: Mutex<Vec<NotificationId>>,
    pub channels: Mutex<Vec<NotificationChannel>>,
    received: Mutex<Vec<(u64, ReceivedListener)>>,
    responses: Mutex<Vec<(u64, ResponseListener)>>,
    next_id: AtomicU64,
}

impl MockScheduler {
    pub fn granted() -> Arc<Self> {
        let mock = MockScheduler::default();
        *mock.permission.lock().unwrap() = Some(PermissionStatus::Granted);
        Arc::new(mock)
    }

    pub fn with_permission(status: PermissionStatus) -> Arc<Self> {
        let mock = MockScheduler::default();
        *mock.permission.lock().unwrap() = Some(status);
        Arc::new(mock)
    }

    pub fn flag(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn fail_after(&self, successes: usize) {
        *self.schedule_budget.lock().unwrap() = Some(successes);
    }

    pub fn scheduled_requests(&self) -> Vec<NotificationRequest> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn cancelled_ids(&self) -> Vec<NotificationId> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn received_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn response_count(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    pub fn fire_received(&self, event: &NotificationEvent) {
        let listeners: Vec<ReceivedListener> = self
            .received
            .lock()
            .unwrap()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn fire_response(&self, response: &NotificationResponse) {
        let listeners: Vec<ResponseListener> = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(response);
        }
    }
}

#[async_trait]
impl NotificationScheduler for MockScheduler {
    async fn permission_status(&self) -> Result<PermissionStatus> {
        if self.fail_permission_query.load(Ordering::SeqCst) {
            bail!("permission service unavailable");
        }
        Ok(self
            .permission
            .lock()
            .unwrap()
            .unwrap_or(PermissionStatus::Undetermined))
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        let status = if self.grant_on_request.load(Ordering::SeqCst) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        *self.permission.lock().unwrap() = Some(status);
        Ok(status)
    }

    async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<()> {
        if self.fail_channel.load(Ordering::SeqCst) {
            bail!("channel creation rejected");
        }
        self.channels.lock().unwrap().push(channel.clone());
        Ok(())
    }

    async fn schedule(&self, request: NotificationRequest) -> Result<NotificationId> {
        match request.trigger {
            Trigger::Delay { .. } if self.fail_delay.load(Ordering::SeqCst) => {
                bail!("delay trigger rejected")
            }
            Trigger::Calendar { .. } if self.fail_calendar.load(Ordering::SeqCst) => {
                bail!("calendar trigger not supported")
            }
            _ => {}
        }
        if let Some(budget) = self.schedule_budget.lock().unwrap().as_mut() {
            if *budget == 0 {
                bail!("scheduler is full");
            }
            *budget -= 1;
        }
        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.scheduled.lock().unwrap().push((id.clone(), request));
        Ok(id)
    }

    async fn cancel(&self, id: &str) -> Result<()> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            bail!("cancel failed for {id}");
        }
        self.cancelled.lock().unwrap().push(id.to_string());
        self.scheduled.lock().unwrap().retain(|(sid, _)| sid != id);
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<ScheduledNotification>> {
        if self.fail_pending.load(Ordering::SeqCst) {
            bail!("enumeration failed");
        }
        let fallback = NaiveDateTime::default();
        Ok(self
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|(id, request)| ScheduledNotification {
                id: id.clone(),
                request: request.clone(),
                next_fire: fallback,
            })
            .collect())
    }

    fn add_received_listener(&self, listener: ReceivedListener) -> ListenerHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push((id, listener));
        ListenerHandle::new(id, ListenerKind::Received)
    }

    fn add_response_listener(&self, listener: ResponseListener) -> ListenerHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.responses.lock().unwrap().push((id, listener));
        ListenerHandle::new(id, ListenerKind::Response)
    }

    fn remove_listener(&self, handle: ListenerHandle) {
        match handle.kind() {
            ListenerKind::Received => self
                .received
                .lock()
                .unwrap()
                .retain(|(id, _)| *id != handle.id()),
            ListenerKind::Response => self
                .responses
                .lock()
                .unwrap()
                .retain(|(id, _)| *id != handle.id()),
        }
    }
}
