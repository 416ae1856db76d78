use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::{get_json, set_json, Clock, KeyValueStore};

pub const NOTES_KEY: &str = "notes";
pub const MAX_NOTE_LENGTH: usize = 2000;
const MIN_PREFIX_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn validate_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Note cannot be empty");
    }
    let length = text.chars().count();
    if length > MAX_NOTE_LENGTH {
        bail!("Note is too long ({length} characters, max {MAX_NOTE_LENGTH})");
    }
    Ok(text.to_string())
}

pub struct NoteBook {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl NoteBook {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        NoteBook {
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<Note>> {
        Ok(get_json(self.store.as_ref(), NOTES_KEY)
            .await
            .context("Failed to read notes")?
            .unwrap_or_default())
    }

    async fn save(&self, notes: &[Note]) -> Result<()> {
        set_json(self.store.as_ref(), NOTES_KEY, notes)
            .await
            .context("Failed to save notes")
    }

    pub async fn add(&self, text: &str) -> Result<Note> {
        let text = validate_text(text)?;
        let now = self.clock.now();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            text,
            created_at: now,
            updated_at: now,
        };

        let _guard = self.write_lock.lock().await;
        let mut notes = self.load().await?;
        notes.push(note.clone());
        self.save(&notes).await?;
        Ok(note)
    }

    /// All notes, newest first
    pub async fn list(&self) -> Result<Vec<Note>> {
        let mut notes = self.load().await?;
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    pub async fn update(&self, id: &str, text: &str) -> Result<Note> {
        let text = validate_text(text)?;
        let _guard = self.write_lock.lock().await;
        let mut notes = self.load().await?;
        let index = resolve(&notes, id)?.ok_or_else(|| anyhow!("No note with id {id}"))?;
        let note = &mut notes[index];
        note.text = text;
        note.updated_at = self.clock.now();
        let updated = note.clone();
        self.save(&notes).await?;
        Ok(updated)
    }

    /// Returns false when no note matched
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut notes = self.load().await?;
        let Some(index) = resolve(&notes, id)? else {
            return Ok(false);
        };
        notes.remove(index);
        self.save(&notes).await?;
        Ok(true)
    }
}

/// Index of the note with this id, or the only one whose id starts with it
fn resolve(notes: &[Note], id: &str) -> Result<Option<usize>> {
    if let Some(index) = notes.iter().position(|n| n.id == id) {
        return Ok(Some(index));
    }
    if id.len() < MIN_PREFIX_LENGTH {
        return Ok(None);
    }
    let mut matches = notes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.id.starts_with(id))
        .map(|(index, _)| index);
    match (matches.next(), matches.next()) {
        (Some(_), Some(_)) => bail!("Note id '{id}' is ambiguous"),
        (index, _) => Ok(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FixedClock, MemoryStore};
    use chrono::{Duration, NaiveDate};

    fn book() -> (NoteBook, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap(),
        ));
        (NoteBook::new(Arc::new(MemoryStore::new()), clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_add_and_list_newest_first() {
        let (notes, clock) = book();
        let first = notes.add("  Felt fine after D3  ").await.unwrap();
        assert_eq!(first.text, "Felt fine after D3");

        clock.advance(Duration::minutes(5));
        let second = notes.add("Iron upset my stomach").await.unwrap();

        let listed = notes.list().await.unwrap();
        assert_eq!(listed, vec![second, first]);
    }

    #[tokio::test]
    async fn test_rejects_empty_and_long_notes() {
        let (notes, _) = book();
        assert!(notes.add("   ").await.is_err());
        assert!(notes.add(&"x".repeat(MAX_NOTE_LENGTH + 1)).await.is_err());
        assert!(notes.add(&"é".repeat(MAX_NOTE_LENGTH)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (notes, clock) = book();
        let note = notes.add("Take zinc with lunch").await.unwrap();

        clock.advance(Duration::hours(1));
        let updated = notes.update(&note.id, "Take zinc with dinner").await.unwrap();
        assert_eq!(updated.text, "Take zinc with dinner");
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at > note.updated_at);

        assert!(notes.update("missing-id", "x").await.is_err());
        assert!(notes.update(&note.id, "").await.is_err());

        assert!(notes.delete(&note.id[..8]).await.unwrap());
        assert!(!notes.delete(&note.id).await.unwrap());
        assert!(notes.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ambiguous_prefix_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap(),
        ));
        let now = clock.now();
        let stored: Vec<Note> = ["abcd1111", "abcd2222"]
            .into_iter()
            .map(|id| Note {
                id: id.to_string(),
                text: format!("note {id}"),
                created_at: now,
                updated_at: now,
            })
            .collect();
        set_json(store.as_ref(), NOTES_KEY, &stored).await.unwrap();
        let notes = NoteBook::new(store, clock);

        assert!(notes.update("abcd", "overwritten").await.is_err());
        assert!(notes.delete("abcd").await.is_err());
        let listed = notes.list().await.unwrap();
        assert!(listed.iter().all(|n| n.text != "overwritten"));
        assert_eq!(listed.len(), 2);

        let updated = notes.update("abcd2", "second").await.unwrap();
        assert_eq!(updated.id, "abcd2222");
        assert!(notes.delete("abcd1111").await.unwrap());
        assert!(!notes.delete("abc").await.unwrap());
    }
}
