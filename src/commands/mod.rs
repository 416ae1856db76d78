//! # Command System
//!
//! Text command handling for the `vitamins` front end.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Line-oriented text commands replace chat interactions
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod handler;
pub mod handlers;
pub mod input;
pub mod registry;

// Re-export handler infrastructure
pub use context::CommandContext;
pub use handler::CommandHandler;
pub use handlers::{create_all_handlers, default_registry};
pub use input::CommandInput;
pub use registry::{CommandRegistry, UNGATED_COMMANDS};
