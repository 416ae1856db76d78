//! # Notification Listener Registry
//!
//! Holds at most one "received" and one "response" subscription against the
//! scheduler and writes a structured line to the debug log for every event.
//! The registry is an ordinary value owned by whoever drives monitoring.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use log::{debug, warn};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::log_sink::LogSink;
use crate::core::Platform;
use crate::features::notifications::{
    ListenerHandle, NotificationEvent, NotificationResponse, NotificationScheduler,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoringOutcome {
    Started,
    /// Monitoring is not available on this platform; nothing was registered
    Unsupported(Platform),
}

pub struct ListenerRegistry {
    scheduler: Arc<dyn NotificationScheduler>,
    sink: LogSink,
    platform: Platform,
    received: Option<ListenerHandle>,
    response: Option<ListenerHandle>,
}

impl ListenerRegistry {
    pub fn new(scheduler: Arc<dyn NotificationScheduler>, sink: LogSink, platform: Platform) -> Self {
        ListenerRegistry {
            scheduler,
            sink,
            platform,
            received: None,
            response: None,
        }
    }

    /// Subscribe to received and response events.
    ///
    /// Any existing subscription is dropped first, so calling this twice
    /// still leaves exactly one handler of each kind.
    pub fn start_monitoring(&mut self) -> MonitoringOutcome {
        if !self.platform.supports_monitoring() {
            warn!(
                "Notification monitoring is only supported on Android (running on {})",
                self.platform
            );
            self.sink.log(format!(
                "⚠️ Monitoring not started: unsupported platform {}",
                self.platform
            ));
            return MonitoringOutcome::Unsupported(self.platform);
        }

        self.stop_monitoring();

        let sink = self.sink.clone();
        self.received = Some(self.scheduler.add_received_listener(Arc::new(
            move |event: &NotificationEvent| {
                sink.log(format_received(event));
            },
        )));

        let sink = self.sink.clone();
        self.response = Some(self.scheduler.add_response_listener(Arc::new(
            move |response: &NotificationResponse| {
                sink.log(format_response(response));
            },
        )));

        self.sink.log("👂 Notification monitoring started");
        MonitoringOutcome::Started
    }

    /// Remove both subscriptions if present. Safe to call repeatedly.
    pub fn stop_monitoring(&mut self) {
        let mut removed = false;
        if let Some(handle) = self.received.take() {
            self.scheduler.remove_listener(handle);
            removed = true;
        }
        if let Some(handle) = self.response.take() {
            self.scheduler.remove_listener(handle);
            removed = true;
        }
        if removed {
            debug!("Notification listeners removed");
            self.sink.log("🛑 Notification monitoring stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.received.is_some() || self.response.is_some()
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

fn format_data(data: &Map<String, Value>) -> String {
    Value::Object(data.clone()).to_string()
}

fn format_received(event: &NotificationEvent) -> String {
    format!(
        "📬 RECEIVED id={} title=\"{}\" body=\"{}\" data={}",
        event.id,
        event.content.title,
        event.content.body,
        format_data(&event.content.data)
    )
}

fn format_response(response: &NotificationResponse) -> String {
    let event = &response.notification;
    format!(
        "👆 RESPONSE id={} action={} title=\"{}\" body=\"{}\" data={}",
        event.id,
        response.action,
        event.content.title,
        event.content.body,
        format_data(&event.content.data)
    )
}
