//! Persisted user settings.
//!
//! Settings are stored as pretty-printed JSON. Missing keys fall back to
//! their defaults so older files keep loading after new options appear.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::SettingsError;
use crate::types::{EngineConfig, SessionType};

/// Settings directory under the home directory
const SETTINGS_DIR: &str = ".pomodoro";

/// Settings file name
const SETTINGS_FILE: &str = "settings.json";

// ============================================================================
// Completion messages
// ============================================================================

/// Title and body shown when a session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText {
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
}

impl MessageText {
    fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

/// Per-session completion messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionMessages {
    /// Shown when a work session completes
    pub work: MessageText,
    /// Shown when a short break completes
    pub short_break: MessageText,
    /// Shown when a long break completes
    pub long_break: MessageText,
}

impl Default for CompletionMessages {
    fn default() -> Self {
        Self {
            work: MessageText::new("Work Session Complete", "Great job! Time for a break."),
            short_break: MessageText::new("Short Break Complete", "Break's over! Ready to focus?"),
            long_break: MessageText::new(
                "Long Break Complete",
                "Refreshed and ready! Let's get back to work.",
            ),
        }
    }
}

impl CompletionMessages {
    /// Returns the message for the session that just completed.
    pub fn for_session(&self, session: SessionType) -> &MessageText {
        match session {
            SessionType::Work => &self.work,
            SessionType::ShortBreak => &self.short_break,
            SessionType::LongBreak => &self.long_break,
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Everything the user can configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Durations, cadence and auto-start flags
    #[serde(flatten)]
    pub engine: EngineConfig,
    /// Start the first work session as soon as the daemon comes up
    pub auto_start_on_load: bool,
    /// Show a message when a session completes
    pub show_notifications: bool,
    /// Play a chime when a session completes
    pub play_sound: bool,
    /// Completion message texts
    pub messages: CompletionMessages,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            auto_start_on_load: false,
            show_notifications: true,
            play_sound: true,
            messages: CompletionMessages::default(),
        }
    }
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Loads and saves [`Settings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default location (`~/.pomodoro/settings.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn open_default() -> Result<Self, SettingsError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Returns the default settings path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let home = dirs::home_dir().ok_or(SettingsError::NoHomeDirectory)?;
        Ok(home.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Returns the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, returning defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// holds an invalid engine configuration.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "no settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let settings: Settings =
            serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })?;
        settings.engine.validate()?;

        Ok(settings)
    }

    /// Validates and writes settings, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be written.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        settings.engine.validate()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(settings).map_err(|source| {
            SettingsError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = ?self.path, "settings saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
