//! # Configuration
//!
//! Environment-driven configuration. `.env` files are loaded by the binary
//! through `dotenvy` before `Config::from_env` is called.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Added EXPIRY_CHECK_SECONDS for the reminder expiry loop
//! - 1.1.0: Added VITAMIN_PLATFORM and AUTO_GRANT_PERMISSION
//! - 1.0.0: Initial release

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Host platform the notification layer believes it is running on.
///
/// Notification monitoring is only supported on Android; on other platforms
/// the listener registry refuses to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Desktop,
}

impl Platform {
    /// Platform the binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Desktop => "desktop",
        }
    }

    /// Whether notification monitoring is supported here
    pub fn supports_monitoring(&self) -> bool {
        matches!(self, Platform::Android)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "desktop" | "linux" | "macos" | "windows" => Ok(Platform::Desktop),
            other => Err(anyhow!("Unknown platform: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    pub platform: Platform,
    pub catalog_path: Option<String>,
    pub debug_log_capacity: usize,
    pub auto_grant_permission: bool,
    pub expiry_check_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: "vitamins.db".to_string(),
            log_level: "info".to_string(),
            platform: Platform::Android,
            catalog_path: None,
            debug_log_capacity: 100,
            auto_grant_permission: true,
            expiry_check_seconds: 3600,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let platform = match env::var("VITAMIN_PLATFORM") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.platform,
        };

        let debug_log_capacity = parse_var("DEBUG_LOG_CAPACITY", defaults.debug_log_capacity)?;
        if debug_log_capacity == 0 {
            return Err(anyhow!("DEBUG_LOG_CAPACITY must be greater than zero"));
        }

        Ok(Config {
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            platform,
            catalog_path: env::var("VITAMIN_CATALOG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            debug_log_capacity,
            auto_grant_permission: parse_bool_var(
                "AUTO_GRANT_PERMISSION",
                defaults.auto_grant_permission,
            )?,
            expiry_check_seconds: parse_var("EXPIRY_CHECK_SECONDS", defaults.expiry_check_seconds)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {name}: {value}")),
        Err(_) => Ok(default),
    }
}

fn parse_bool_var(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(anyhow!("Invalid boolean for {name}: {other}")),
        },
        Err(_) => Ok(default),
    }
}
