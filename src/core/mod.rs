//! # Core Module
//!
//! Configuration, persistence and time primitives shared by every feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add clock module so scheduling math can be pinned in tests
//! - 1.0.0: Initial creation with config and storage modules

pub mod clock;
pub mod config;
pub mod storage;

// Re-export commonly used items
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, Platform};
pub use storage::{get_json, set_json, KeyValueStore, MemoryStore, SqliteStore};
