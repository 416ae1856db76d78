//! # Notification Debug Log
//!
//! Bounded, timestamped log of notification diagnostics, mirrored to the
//! key-value store. Appends never block on storage: the full buffer is
//! handed to a background writer that applies snapshots in order. Nothing
//! in here reports an error to the caller.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Restore persisted entries on open
//! - 1.0.0: Initial release with background mirroring

use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};

use crate::core::storage::{get_json, set_json, KeyValueStore};

pub const LOG_STORAGE_KEY: &str = "notification_debug_logs";
pub const DEFAULT_CAPACITY: usize = 100;

enum WriterCommand {
    Persist(Vec<String>),
    Clear,
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct LogSink {
    entries: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
    store: Arc<dyn KeyValueStore>,
    sender: mpsc::UnboundedSender<WriterCommand>,
}

impl LogSink {
    /// Create an empty sink with a background writer.
    /// Must be called inside a tokio runtime.
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(Self::background_writer(Arc::clone(&store), receiver));

        LogSink {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            store,
            sender,
        }
    }

    /// Create a sink and load whatever a previous session persisted
    pub async fn open(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        let sink = Self::new(store, capacity);

        match get_json::<Vec<String>>(sink.store.as_ref(), LOG_STORAGE_KEY).await {
            Ok(Some(saved)) => {
                let mut entries = sink.lock_entries();
                let skip = saved.len().saturating_sub(sink.capacity);
                entries.extend(saved.into_iter().skip(skip));
                debug!("Restored {} debug log entries", entries.len());
            }
            Ok(None) => {}
            Err(e) => warn!("Could not restore debug logs: {e}"),
        }

        sink
    }

    /// Append a timestamped entry and queue persistence of the buffer
    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(target: "notification_debug", "{message}");

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let entry = format!("[{timestamp}] {message}");

        // Snapshot is sent under the lock so the writer sees buffers in append order
        let mut entries = self.lock_entries();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        let snapshot: Vec<String> = entries.iter().cloned().collect();
        if self.sender.send(WriterCommand::Persist(snapshot)).is_err() {
            warn!("Debug log writer is gone; entry kept in memory only");
        }
    }

    /// Persisted entries if they can be read, otherwise the in-memory buffer
    pub async fn get_logs(&self) -> Vec<String> {
        self.flush().await;

        match get_json::<Vec<String>>(self.store.as_ref(), LOG_STORAGE_KEY).await {
            Ok(Some(saved)) => saved,
            Ok(None) => self.entries(),
            Err(e) => {
                warn!("Reading persisted debug logs failed, using memory: {e}");
                self.entries()
            }
        }
    }

    /// Empty both the in-memory buffer and the persisted mirror
    pub async fn clear_logs(&self) {
        {
            let mut entries = self.lock_entries();
            entries.clear();
            if self.sender.send(WriterCommand::Clear).is_err() {
                warn!("Debug log writer is gone; persisted logs not cleared");
            }
        }
        self.flush().await;
    }

    /// In-memory entries, oldest first
    pub fn entries(&self) -> Vec<String> {
        self.lock_entries().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait until every queued write has been applied
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(WriterCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, VecDeque<String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn background_writer(
        store: Arc<dyn KeyValueStore>,
        mut receiver: mpsc::UnboundedReceiver<WriterCommand>,
    ) {
        while let Some(command) = receiver.recv().await {
            match command {
                WriterCommand::Persist(entries) => {
                    if let Err(e) = set_json(store.as_ref(), LOG_STORAGE_KEY, &entries).await {
                        warn!("Failed to persist debug logs: {e}");
                    }
                }
                WriterCommand::Clear => {
                    if let Err(e) = store.remove(LOG_STORAGE_KEY).await {
                        warn!("Failed to clear persisted debug logs: {e}");
                    }
                }
                WriterCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Debug log writer stopped");
    }
}
