//! Light/dark theme preference
//!
//! The preference lives in its own slot next to the list cache and survives
//! restarts; cache clears leave it alone.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use crate::cache::SlotStore;

/// Default slot key for the theme preference
pub const DEFAULT_THEME_KEY: &str = "af_theme";

/// A theme name other than "dark" or "light"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme '{0}'")]
pub struct ParseThemeError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl FromStr for Theme {
    type Err = ParseThemeError;

    /// Parses "dark" or "light" (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(ParseThemeError(s.to_string())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loads and saves the theme preference
pub struct ThemeStore {
    slot: Box<dyn SlotStore>,
    key: String,
}

impl ThemeStore {
    pub fn new(slot: Box<dyn SlotStore>) -> Self {
        Self {
            slot,
            key: DEFAULT_THEME_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Returns the saved theme, or the default if none is saved or it is unreadable
    pub fn load(&self) -> Theme {
        match self.slot.get(&self.key) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read theme preference");
                Theme::default()
            }
        }
    }

    /// Saves `theme`; failures are logged only
    pub fn save(&self, theme: Theme) {
        if let Err(e) = self.slot.set(&self.key, theme.as_str()) {
            warn!(key = %self.key, error = %e, "Failed to save theme preference");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemorySlotStore;

    #[test]
    fn test_toggle_flips_theme() {
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
    }

    #[test]
    fn test_parse_accepts_both_names() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(" LIGHT ".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!(
            "solarized".parse::<Theme>(),
            Err(ParseThemeError("solarized".to_string()))
        );
    }

    #[test]
    fn test_parse_round_trips_display() {
        for theme in [Theme::Dark, Theme::Light] {
            assert_eq!(theme.to_string().parse::<Theme>(), Ok(theme));
        }
    }

    #[test]
    fn test_load_defaults_to_dark() {
        let store = ThemeStore::new(Box::new(MemorySlotStore::new()));
        assert_eq!(store.load(), Theme::Dark);
    }

    #[test]
    fn test_save_then_load() {
        let slot = MemorySlotStore::new();
        let store = ThemeStore::new(Box::new(slot.clone()));

        store.save(Theme::Light);

        assert_eq!(store.load(), Theme::Light);
        assert_eq!(slot.get(DEFAULT_THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_unreadable_value_falls_back_to_default() {
        let slot = MemorySlotStore::new();
        slot.set(DEFAULT_THEME_KEY, "neon").unwrap();

        let store = ThemeStore::new(Box::new(slot));
        assert_eq!(store.load(), Theme::Dark);
    }
}
