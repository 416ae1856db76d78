//! # Feature: Medical Disclaimer
//!
//! Remembers whether the user accepted the medical disclaimer.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod gate;

pub use gate::{DisclaimerGate, ACCEPTED_AT_KEY, ACCEPTED_KEY, DISCLAIMER_TEXT};
