//! Playback error kinds

use thiserror::Error;

/// Errors surfaced by the playback controller and its collaborators
///
/// None of these terminate the controller. `Decode` is recorded on the
/// session so the host can offer a retry; `OrientationRejected` is logged and
/// kept as a best-effort warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
    #[error("No episode at index {index} (have {len})")]
    NoSuchEpisode { index: usize, len: usize },
    #[error("Orientation lock rejected: {0}")]
    OrientationRejected(String),
}

impl PlaybackError {
    /// Whether the host should offer a retry affordance for this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlaybackError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            PlaybackError::Decode("404".into()).to_string(),
            "Decode failed: 404"
        );
        assert_eq!(
            PlaybackError::NoSuchEpisode { index: 5, len: 3 }.to_string(),
            "No episode at index 5 (have 3)"
        );
    }

    #[test]
    fn test_only_decode_is_retryable() {
        assert!(PlaybackError::Decode("x".into()).is_retryable());
        assert!(!PlaybackError::InvalidState("x").is_retryable());
        assert!(!PlaybackError::OrientationRejected("x".into()).is_retryable());
    }
}
