use anyhow::{anyhow, Result};
use log::warn;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::KeyValueStore;

pub const THEME_KEY: &str = "theme_preference";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            ThemeMode::Light => Palette {
                background: "#FFFFFF",
                surface: "#F4F6F8",
                text: "#1B1F23",
                muted_text: "#6A737D",
                primary: "#2E7D32",
                accent: "#FFB300",
                danger: "#C62828",
                border: "#D0D7DE",
            },
            ThemeMode::Dark => Palette {
                background: "#121212",
                surface: "#1E1E1E",
                text: "#ECEFF1",
                muted_text: "#9AA5B1",
                primary: "#66BB6A",
                accent: "#FFCA28",
                danger: "#EF5350",
                border: "#30363D",
            },
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(anyhow!("Unknown theme '{other}' (use light or dark)")),
        }
    }
}

/// Named colors for one theme mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub muted_text: &'static str,
    pub primary: &'static str,
    pub accent: &'static str,
    pub danger: &'static str,
    pub border: &'static str,
}

impl Palette {
    pub fn entries(&self) -> [(&'static str, &'static str); 8] {
        [
            ("background", self.background),
            ("surface", self.surface),
            ("text", self.text),
            ("muted_text", self.muted_text),
            ("primary", self.primary),
            ("accent", self.accent),
            ("danger", self.danger),
            ("border", self.border),
        ]
    }
}

/// Current theme mode, cached in memory and mirrored to the store
pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
    mode: RwLock<ThemeMode>,
}

impl ThemeStore {
    /// Load the persisted mode; missing, invalid or unreadable values fall back to light
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mode = match store.get(THEME_KEY).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring stored theme: {e}");
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(e) => {
                warn!("Failed to read theme preference: {e}");
                ThemeMode::default()
            }
        };
        ThemeStore {
            store,
            mode: RwLock::new(mode),
        }
    }

    pub async fn mode(&self) -> ThemeMode {
        *self.mode.read().await
    }

    pub async fn palette(&self) -> Palette {
        self.mode().await.palette()
    }

    /// Persist first so a failed write leaves the current mode unchanged
    pub async fn set_mode(&self, mode: ThemeMode) -> Result<()> {
        let mut current = self.mode.write().await;
        self.store.set(THEME_KEY, mode.as_str()).await?;
        *current = mode;
        Ok(())
    }

    pub async fn toggle(&self) -> Result<ThemeMode> {
        let mut current = self.mode.write().await;
        let next = current.toggled();
        self.store.set(THEME_KEY, next.as_str()).await?;
        *current = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::testing::FlakyStore;
    use crate::core::MemoryStore;

    #[tokio::test]
    async fn test_defaults_to_light() {
        let theme = ThemeStore::load(Arc::new(MemoryStore::new())).await;
        assert_eq!(theme.mode().await, ThemeMode::Light);
        assert_eq!(theme.palette().await.background, "#FFFFFF");
    }

    #[tokio::test]
    async fn test_invalid_stored_value_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_KEY, "sepia").await.unwrap();
        let theme = ThemeStore::load(store).await;
        assert_eq!(theme.mode().await, ThemeMode::Light);
    }

    #[tokio::test]
    async fn test_toggle_persists() {
        let store = Arc::new(MemoryStore::new());
        let theme = ThemeStore::load(store.clone()).await;
        assert_eq!(theme.toggle().await.unwrap(), ThemeMode::Dark);
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));

        let reloaded = ThemeStore::load(store.clone()).await;
        assert_eq!(reloaded.mode().await, ThemeMode::Dark);
        assert_eq!(reloaded.palette().await, ThemeMode::Dark.palette());

        reloaded.set_mode(ThemeMode::Light).await.unwrap();
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_mode() {
        let store = Arc::new(FlakyStore::new());
        let theme = ThemeStore::load(store.clone()).await;
        store.set_fail_writes(true);
        assert!(theme.toggle().await.is_err());
        assert_eq!(theme.mode().await, ThemeMode::Light);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Dark".parse::<ThemeMode>().unwrap(), ThemeMode::Dark);
        assert!("blue".parse::<ThemeMode>().is_err());
        assert_eq!(ThemeMode::Light.palette().entries().len(), 8);
    }
}
