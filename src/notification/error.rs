//! Notification error types.

use thiserror::Error;

/// Errors that can occur while delivering a completion notice.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Failed to show the message.
    #[error("failed to deliver notification: {0}")]
    DeliveryFailed(String),

    /// Failed to play the chime.
    #[error("failed to play sound: {0}")]
    SoundFailed(String),

    /// Writing to the output stream failed.
    #[error("notification output error: {0}")]
    Io(#[from] std::io::Error),
}

impl NotificationError {
    /// Returns true if the error came from the sound channel.
    #[must_use]
    pub fn is_sound_error(&self) -> bool {
        matches!(self, Self::SoundFailed(_))
    }
}
