//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Text dispatch with disclaimer gating and generated help
//! - 1.0.0: Initial implementation for handler dispatch

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::context::CommandContext;
use super::handler::CommandHandler;
use super::input::CommandInput;

/// Commands that work before the medical disclaimer is accepted
pub const UNGATED_COMMANDS: &[&str] = &["help", "disclaimer", "theme"];

/// Registry mapping command names to handlers
///
/// The registry allows handlers to be registered and looked up by command name.
/// Multiple command names can map to the same handler if they share logic.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(Arc::new(ThemeHandler));
///
/// if let Some(reply) = registry.dispatch(ctx, "theme mode=dark").await {
///     println!("{reply}");
/// }
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler>>,
    // Registration order, used for help output
    ordered: Vec<Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            ordered: Vec::new(),
        }
    }

    /// Register a handler for its declared command names
    ///
    /// The handler is registered for all names returned by `command_names()`.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        for name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
        self.ordered.push(handler);
    }

    /// Get handler for a command name
    ///
    /// Returns None if no handler is registered for the given name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a command is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered command names
    ///
    /// Note: This counts command names, not unique handlers.
    /// A handler registered for multiple names will be counted multiple times.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Get all registered command names
    pub fn command_names(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }

    pub fn help_text(&self) -> String {
        let mut text = String::from("**Available Commands:**\n");
        for handler in &self.ordered {
            for (usage, description) in handler.usage() {
                text.push_str(&format!("`{usage}` - {description}\n"));
            }
        }
        text.push_str("`help` - Show this help message\n");
        text.push_str("`quit` - Exit");
        text
    }

    /// Parse and run one command line. Blank lines produce no reply.
    pub async fn dispatch(&self, ctx: Arc<CommandContext>, line: &str) -> Option<String> {
        let input = match CommandInput::parse(line) {
            Ok(Some(input)) => input,
            Ok(None) => return None,
            Err(e) => return Some(format!("❌ {e}")),
        };

        if input.name == "help" {
            return Some(self.help_text());
        }

        let Some(handler) = self.get(&input.name) else {
            return Some(format!(
                "❓ Unknown command `{}`. Type `help` to see what is available.",
                input.name
            ));
        };

        if !UNGATED_COMMANDS.contains(&input.name.as_str()) && !ctx.disclaimer.has_accepted().await
        {
            return Some(
                "⚕️ Please read and accept the medical disclaimer first: `disclaimer` shows it, \
                 `disclaimer accept` accepts it."
                    .to_string(),
            );
        }

        let request_id = Uuid::new_v4();
        debug!("[{request_id}] Dispatching command: {}", input.name);
        match handler.handle(ctx, &input).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!("[{request_id}] Command {} failed: {e:#}", input.name);
                Some(format!("❌ {e:#}"))
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
