//! Session-completion notifications.
//!
//! The engine only reports which session finished; this module turns that
//! into a user-facing message and an optional chime. Delivery goes through
//! [`NotificationSink`] so the daemon can print to the terminal while tests
//! record what would have been shown.
//!
//! Failures are logged and swallowed: a broken notification channel must
//! never stop the timer.

mod error;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub use error::NotificationError;

use crate::config::{CompletionMessages, Settings};
use crate::daemon::timer::TimerEngine;
use crate::types::SessionType;

// ============================================================================
// NotificationContent
// ============================================================================

/// Message shown when a session completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    /// Session that just completed
    pub session: SessionType,
    /// Title line
    pub title: String,
    /// Body text
    pub body: String,
}

impl NotificationContent {
    /// Builds the message for `session` from the configured texts.
    pub fn for_session(session: SessionType, messages: &CompletionMessages) -> Self {
        let text = messages.for_session(session);
        Self {
            session,
            title: text.title.clone(),
            body: text.body.clone(),
        }
    }
}

// ============================================================================
// NotificationSink
// ============================================================================

/// Destination for completion notices.
pub trait NotificationSink: Send + Sync {
    /// Shows a completion message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be shown.
    fn deliver(&self, content: &NotificationContent) -> Result<(), NotificationError>;

    /// Plays the completion chime.
    ///
    /// # Errors
    ///
    /// Returns an error if the chime could not be played.
    fn chime(&self) -> Result<(), NotificationError>;
}

/// Prints notices to the daemon's stderr; the chime is the terminal bell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn deliver(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "🍅 {}: {}", content.title, content.body)?;
        Ok(())
    }

    fn chime(&self) -> Result<(), NotificationError> {
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| NotificationError::SoundFailed(e.to_string()))
    }
}

/// Which completion channels are enabled, plus the texts to show.
#[derive(Debug, Clone)]
pub struct NotificationPrefs {
    /// Show a message on completion
    pub show_notifications: bool,
    /// Play a chime on completion
    pub play_sound: bool,
    /// Message texts per session kind
    pub messages: CompletionMessages,
}

impl From<&Settings> for NotificationPrefs {
    fn from(settings: &Settings) -> Self {
        Self {
            show_notifications: settings.show_notifications,
            play_sound: settings.play_sound,
            messages: settings.messages.clone(),
        }
    }
}

/// Subscribes `sink` to the engine's session completions.
pub fn attach(engine: &mut TimerEngine, sink: Arc<dyn NotificationSink>, prefs: NotificationPrefs) {
    if !prefs.show_notifications && !prefs.play_sound {
        tracing::debug!("completion notifications disabled");
        return;
    }

    engine.subscribe_completion(move |session| {
        if prefs.show_notifications {
            let content = NotificationContent::for_session(session, &prefs.messages);
            if let Err(e) = sink.deliver(&content) {
                tracing::warn!("Failed to send notification: {}", e);
            }
        }
        if prefs.play_sound {
            if let Err(e) = sink.chime() {
                tracing::warn!("Failed to play sound: {}", e);
            }
        }
    });
}

// ============================================================================
// MockNotificationSink
// ============================================================================

/// Mock sink for testing.
#[derive(Debug, Default)]
pub struct MockNotificationSink {
    delivered: Mutex<Vec<NotificationContent>>,
    chimes: Mutex<usize>,
    should_fail: AtomicBool,
}

impl MockNotificationSink {
    /// Creates a new mock sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether deliveries should fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Gets all delivered notifications.
    pub fn delivered(&self) -> Vec<NotificationContent> {
        self.delivered
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Gets the number of chimes played.
    pub fn chime_count(&self) -> usize {
        *self
            .chimes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl NotificationSink for MockNotificationSink {
    fn deliver(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::DeliveryFailed("Mock failure".to_string()));
        }
        self.delivered
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(content.clone());
        Ok(())
    }

    fn chime(&self) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SoundFailed("Mock failure".to_string()));
        }
        *self
            .chimes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) += 1;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngineConfig;

    fn engine_with_sink(prefs: NotificationPrefs) -> (TimerEngine, Arc<MockNotificationSink>) {
        let mut engine = TimerEngine::new(EngineConfig::default()).unwrap();
        let sink = Arc::new(MockNotificationSink::new());
        attach(&mut engine, sink.clone(), prefs);
        (engine, sink)
    }

    fn default_prefs() -> NotificationPrefs {
        NotificationPrefs::from(&Settings::default())
    }

    #[test]
    fn test_content_for_session() {
        let content =
            NotificationContent::for_session(SessionType::Work, &CompletionMessages::default());
        assert_eq!(content.session, SessionType::Work);
        assert_eq!(content.title, "Work Session Complete");
        assert_eq!(content.body, "Great job! Time for a break.");
    }

    #[test]
    fn test_completion_delivers_message_and_chime() {
        let (mut engine, sink) = engine_with_sink(default_prefs());

        engine.skip();
        engine.skip();

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].session, SessionType::Work);
        assert_eq!(delivered[1].session, SessionType::ShortBreak);
        assert_eq!(delivered[1].title, "Short Break Complete");
        assert_eq!(sink.chime_count(), 2);
    }

    #[test]
    fn test_channels_follow_prefs() {
        let prefs = NotificationPrefs {
            play_sound: false,
            ..default_prefs()
        };
        let (mut engine, sink) = engine_with_sink(prefs);
        engine.skip();
        assert_eq!(sink.delivered().len(), 1);
        assert_eq!(sink.chime_count(), 0);

        let prefs = NotificationPrefs {
            show_notifications: false,
            ..default_prefs()
        };
        let (mut engine, sink) = engine_with_sink(prefs);
        engine.skip();
        assert!(sink.delivered().is_empty());
        assert_eq!(sink.chime_count(), 1);
    }

    #[test]
    fn test_custom_messages() {
        let mut settings = Settings::default();
        settings.messages.work.title = "Done".to_string();
        let (mut engine, sink) = engine_with_sink(NotificationPrefs::from(&settings));

        engine.skip();

        assert_eq!(sink.delivered()[0].title, "Done");
    }

    #[test]
    fn test_failures_do_not_stop_the_engine() {
        let (mut engine, sink) = engine_with_sink(default_prefs());
        sink.set_should_fail(true);

        engine.skip();

        assert!(sink.delivered().is_empty());
        assert_eq!(engine.snapshot().session_type, SessionType::ShortBreak);
        assert_eq!(engine.snapshot().completed_work_sessions, 1);
    }

    #[test]
    fn test_destroy_detaches_sink() {
        let (mut engine, sink) = engine_with_sink(default_prefs());
        engine.destroy();
        engine.skip();
        assert!(sink.delivered().is_empty());
    }
}
