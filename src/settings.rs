use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::StorageError;
use crate::storage::KeyValueStorage;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme {}. Expected light or dark", s)),
        }
    }
}

/// User preferences kept next to the posts
pub struct Settings<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> Settings<S> {
    pub fn new(storage: S) -> Self {
        Settings { storage }
    }

    /// Light unless dark was explicitly chosen
    pub fn theme(&self) -> Theme {
        self.storage.get(THEME_KEY)
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StorageError> {
        self.storage.set(THEME_KEY, theme.as_str())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, StorageError> {
        let theme = self.theme().toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }
}
