//! # Feature: Notes
//!
//! Free-text notes kept next to the reminders, e.g. how a supplement
//! agreed with you.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod book;

pub use book::{Note, NoteBook, MAX_NOTE_LENGTH, NOTES_KEY};
