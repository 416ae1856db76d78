//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Holds the reminder, diagnostics, theme, disclaimer and notes services
//! - 1.0.0: Initial implementation with core shared state

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::core::{Clock, Config, KeyValueStore};
use crate::features::diagnostics::{HealthCheck, ListenerRegistry, LogSink, SchedulingProbe};
use crate::features::disclaimer::DisclaimerGate;
use crate::features::notes::NoteBook;
use crate::features::notifications::{LocalScheduler, NotificationScheduler};
use crate::features::reminders::{ReminderScheduler, VitaminCatalog};
use crate::features::theme::ThemeStore;

/// Shared context for all command handlers
///
/// Every service is built over the same key-value store, scheduler and
/// clock, so the diagnostics commands observe exactly what the reminder
/// commands scheduled.
pub struct CommandContext {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn KeyValueStore>,
    pub scheduler: Arc<dyn NotificationScheduler>,
    /// Set when the scheduler is the in-process engine, which can simulate taps
    pub local: Option<LocalScheduler>,
    pub sink: LogSink,
    pub listeners: Mutex<ListenerRegistry>,
    pub probe: SchedulingProbe,
    pub health: HealthCheck,
    pub catalog: Arc<VitaminCatalog>,
    pub reminders: Arc<ReminderScheduler>,
    pub theme: ThemeStore,
    pub disclaimer: DisclaimerGate,
    pub notes: NoteBook,
    pub start_time: Instant,
}

impl CommandContext {
    /// Build every service and restore persisted state (debug log, theme)
    pub async fn build(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        scheduler: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
        catalog: VitaminCatalog,
    ) -> Self {
        let sink = LogSink::open(store.clone(), config.debug_log_capacity).await;
        let listeners = ListenerRegistry::new(scheduler.clone(), sink.clone(), config.platform);
        let probe = SchedulingProbe::new(scheduler.clone(), sink.clone(), clock.clone());
        let health = HealthCheck::new(scheduler.clone());
        let reminders = Arc::new(ReminderScheduler::new(
            scheduler.clone(),
            store.clone(),
            clock.clone(),
        ));
        let theme = ThemeStore::load(store.clone()).await;
        let disclaimer = DisclaimerGate::new(store.clone(), clock.clone());
        let notes = NoteBook::new(store.clone(), clock.clone());

        Self {
            config,
            clock,
            store,
            scheduler,
            local: None,
            sink,
            listeners: Mutex::new(listeners),
            probe,
            health,
            catalog: Arc::new(catalog),
            reminders,
            theme,
            disclaimer,
            notes,
            start_time: Instant::now(),
        }
    }

    pub fn with_local(mut self, local: LocalScheduler) -> Self {
        self.local = Some(local);
        self
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::core::{FixedClock, MemoryStore, Platform};
    use crate::features::notifications::testing::MockScheduler;
    use chrono::NaiveDate;

    pub struct TestContext {
        pub ctx: Arc<CommandContext>,
        pub mock: Arc<MockScheduler>,
        pub store: Arc<MemoryStore>,
        pub clock: Arc<FixedClock>,
    }

    pub fn test_config() -> Config {
        Config {
            platform: Platform::Android,
            ..Config::default()
        }
    }

    /// Context over a granted mock scheduler, Monday 2026-10-19 10:00
    pub async fn test_context() -> TestContext {
        let mock = MockScheduler::granted();
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        ));
        let ctx = CommandContext::build(
            test_config(),
            store.clone(),
            mock.clone(),
            clock.clone(),
            VitaminCatalog::builtin(),
        )
        .await;
        TestContext {
            ctx: Arc::new(ctx),
            mock,
            store,
            clock,
        }
    }

    /// Same as [`test_context`] with the disclaimer already accepted
    pub async fn accepted_context() -> TestContext {
        let fixture = test_context().await;
        fixture.ctx.disclaimer.accept().await.unwrap();
        fixture
    }
}
