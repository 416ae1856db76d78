//! Theme command handler
//!
//! Handles: theme
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::input::CommandInput;
use crate::features::theme::ThemeMode;

pub struct ThemeHandler;

#[async_trait]
impl CommandHandler for ThemeHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["theme"]
    }

    fn usage(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("theme", "Show the current theme and its palette"),
            ("theme toggle | theme mode=light|dark", "Change the theme"),
        ]
    }

    async fn handle(&self, ctx: Arc<CommandContext>, input: &CommandInput) -> Result<String> {
        let requested = input.get_string_or_arg("mode", 0);
        let mode = match requested.as_deref() {
            None => ctx.theme.mode().await,
            Some("toggle") => ctx.theme.toggle().await?,
            Some(other) => {
                let mode: ThemeMode = other.parse()?;
                ctx.theme.set_mode(mode).await?;
                mode
            }
        };

        let mut reply = format!("🎨 Theme: **{mode}**\n");
        for (name, color) in mode.palette().entries() {
            reply.push_str(&format!("{name:<11} {color}\n"));
        }
        Ok(reply)
    }
}
