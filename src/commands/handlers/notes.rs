//! Notes command handlers
//!
//! Handles: notes, note-add, note-edit, note-delete
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::input::CommandInput;
use crate::features::reminders::short_id;

pub struct NotesHandler;

#[async_trait]
impl CommandHandler for NotesHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["notes", "note-add", "note-edit", "note-delete"]
    }

    fn usage(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("notes", "List your notes, newest first"),
            ("note-add text=\"...\"", "Add a note"),
            ("note-edit <id> text=\"...\"", "Replace a note's text"),
            ("note-delete <id>", "Delete a note"),
        ]
    }

    async fn handle(&self, ctx: Arc<CommandContext>, input: &CommandInput) -> Result<String> {
        match input.name.as_str() {
            "notes" => {
                let notes = ctx.notes.list().await?;
                if notes.is_empty() {
                    return Ok("📝 No notes yet. Add one with `note-add text=\"...\"`.".to_string());
                }
                let mut reply = String::from("📝 **Your notes:**\n");
                for note in notes {
                    reply.push_str(&format!(
                        "`{}` {} - {}\n",
                        short_id(&note.id),
                        note.created_at.format("%Y-%m-%d %H:%M"),
                        note.text
                    ));
                }
                Ok(reply)
            }
            "note-add" => {
                let text = note_text(input)?;
                let note = ctx.notes.add(&text).await?;
                Ok(format!("📝 Saved note `{}`.", short_id(&note.id)))
            }
            "note-edit" => {
                let id = input
                    .get_string_or_arg("id", 0)
                    .ok_or_else(|| anyhow!("Missing note id"))?;
                let text = input.require_string("text")?;
                let note = ctx.notes.update(&id, &text).await?;
                Ok(format!("✏️ Updated note `{}`.", short_id(&note.id)))
            }
            "note-delete" => {
                let id = input
                    .get_string_or_arg("id", 0)
                    .ok_or_else(|| anyhow!("Missing note id"))?;
                if ctx.notes.delete(&id).await? {
                    Ok(format!("🗑️ Deleted note `{id}`."))
                } else {
                    Ok(format!("❌ Note `{id}` not found."))
                }
            }
            _ => Ok(String::new()),
        }
    }
}

/// `text=` option, or all bare arguments joined
fn note_text(input: &CommandInput) -> Result<String> {
    input
        .get_string_option("text")
        .or_else(|| (!input.args.is_empty()).then(|| input.args.join(" ")))
        .ok_or_else(|| anyhow!("Missing text=\"...\""))
}
