//! Command handler trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Handlers take parsed text input and return the reply text
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::context::CommandContext;
use super::input::CommandInput;

/// Trait for command handlers
///
/// Each command handler implements this trait to process one or more commands.
/// Handlers are registered with a CommandRegistry and dispatched based on command name.
///
/// # Example
///
/// ```ignore
/// pub struct PingHandler;
///
/// #[async_trait]
/// impl CommandHandler for PingHandler {
///     fn command_names(&self) -> &'static [&'static str] {
///         &["ping"]
///     }
///
///     async fn handle(&self, _ctx: Arc<CommandContext>, _input: &CommandInput) -> Result<String> {
///         Ok("Pong!".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    ///
    /// A handler can process multiple commands if they share logic.
    fn command_names(&self) -> &'static [&'static str];

    /// One `(usage, description)` line per command for `help`
    fn usage(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Handle the command and return the text to show the user
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared context with the store, scheduler and feature services
    /// * `input` - The parsed command line; `input.name` is one of `command_names()`
    async fn handle(&self, ctx: Arc<CommandContext>, input: &CommandInput) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn CommandHandler) {}
}
