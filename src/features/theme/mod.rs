//! # Feature: Theme
//!
//! Persisted light/dark preference and the matching color palette.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod store;

pub use store::{Palette, ThemeMode, ThemeStore, THEME_KEY};
