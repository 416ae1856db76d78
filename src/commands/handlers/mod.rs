//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 3.0.0: Vitamin reminder, diagnostics, theme, disclaimer and notes handlers
//! - 1.0.0: Initial extraction from the monolithic command handler

pub mod debug;
pub mod disclaimer;
pub mod notes;
pub mod remind;
pub mod theme;
pub mod utility;

use std::sync::Arc;

use super::handler::CommandHandler;
use super::registry::CommandRegistry;

/// Create all registered command handlers
///
/// Returns a vector of handlers ready to be registered with CommandRegistry.
/// The order here is the order `help` lists them in.
pub fn create_all_handlers() -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(remind::RemindHandler),
        Arc::new(notes::NotesHandler),
        Arc::new(debug::DebugHandler),
        Arc::new(theme::ThemeHandler),
        Arc::new(disclaimer::DisclaimerHandler),
        Arc::new(utility::UtilityHandler),
    ]
}

/// Registry with every handler registered
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for handler in create_all_handlers() {
        registry.register(handler);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_command_names_are_unique() {
        let mut seen = HashSet::new();
        for handler in create_all_handlers() {
            for name in handler.command_names() {
                assert!(seen.insert(*name), "duplicate command name: {name}");
            }
        }
        assert!(!seen.contains("help"));
        assert_eq!(default_registry().len(), seen.len());
    }
}
