//! Per-locator playback session and overlay visibility state

use uuid::Uuid;

use super::PlaybackError;
use crate::models::StatusReport;

// =============================================================================
// Playback Session
// =============================================================================

/// State of one loaded locator
///
/// Created by `initialize`, dropped on teardown (episode change, close).
/// `position_millis` never exceeds `duration_millis`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub id: Uuid,
    pub media_uri: String,
    pub position_millis: u64,
    pub duration_millis: u64,
    pub is_playing: bool,
    pub is_loading: bool,
    pub is_seek_in_progress: bool,
    /// Target of the most recent seek still awaiting completion
    pub pending_seek: Option<u64>,
    pub error: Option<PlaybackError>,
    pub finished: bool,
}

impl PlaybackSession {
    /// New session in the loading state, carrying the autoplay intent
    pub fn new(media_uri: impl Into<String>, autoplay: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_uri: media_uri.into(),
            position_millis: 0,
            duration_millis: 0,
            is_playing: autoplay,
            is_loading: true,
            is_seek_in_progress: false,
            pending_seek: None,
            error: None,
            finished: false,
        }
    }

    /// Loaded and usable for transport requests
    pub fn is_ready(&self) -> bool {
        !self.is_loading && self.error.is_none()
    }

    pub fn clamp(&self, millis: u64) -> u64 {
        millis.min(self.duration_millis)
    }

    /// Fold a decoder status report into the session
    pub fn apply_report(&mut self, report: &StatusReport) {
        if report.loaded {
            self.is_loading = false;
            self.is_playing = report.is_playing;
            self.duration_millis = report.duration_millis;
            self.error = None;
            self.finished = report.did_just_finish;
            if self.is_seek_in_progress {
                self.position_millis = self.clamp(self.position_millis);
            } else {
                self.position_millis = self.clamp(report.position_millis);
            }
        } else if let Some(ref message) = report.error {
            self.fail(PlaybackError::Decode(message.clone()));
        }
    }

    /// Record a decode failure; last known position and duration stay put
    pub fn fail(&mut self, error: PlaybackError) {
        self.is_loading = false;
        self.is_playing = false;
        self.is_seek_in_progress = false;
        self.pending_seek = None;
        self.error = Some(error);
    }

    /// Start a scrub towards `target` (already clamped by the caller)
    pub fn begin_seek(&mut self, target: u64) {
        self.is_seek_in_progress = true;
        self.pending_seek = Some(target);
        self.position_millis = target;
        self.finished = false;
    }

    /// Finish the scrub if `target` is the latest one issued
    pub fn complete_seek(&mut self, target: u64) -> bool {
        if self.pending_seek == Some(target) {
            self.pending_seek = None;
            self.is_seek_in_progress = false;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Controls Visibility
// =============================================================================

/// On-screen controls state (not persisted)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlsVisibility {
    pub visible: bool,
    pub locked: bool,
}

impl Default for ControlsVisibility {
    fn default() -> Self {
        Self {
            visible: true,
            locked: false,
        }
    }
}

impl ControlsVisibility {
    /// Screen tap. While locked a tap can only reveal.
    pub fn tap(&mut self) -> bool {
        if self.locked {
            self.visible = true;
        } else {
            self.visible = !self.visible;
        }
        self.visible
    }

    /// Flip the lock. Unlocking always reveals the controls.
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        if !self.locked {
            self.visible = true;
        }
        self.locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_loading() {
        let session = PlaybackSession::new("uri1", true);
        assert!(session.is_loading);
        assert!(session.is_playing);
        assert!(!session.is_ready());
        assert_eq!(session.position_millis, 0);
        assert_eq!(session.duration_millis, 0);
    }

    #[test]
    fn test_apply_loaded_report() {
        let mut session = PlaybackSession::new("uri1", true);
        session.apply_report(&StatusReport::loaded(true, 0, 600_000));
        assert!(!session.is_loading);
        assert!(session.is_playing);
        assert_eq!(session.duration_millis, 600_000);
        assert!(session.is_ready());
    }

    #[test]
    fn test_report_position_is_clamped() {
        let mut session = PlaybackSession::new("uri1", true);
        session.apply_report(&StatusReport::loaded(true, 700_000, 600_000));
        assert_eq!(session.position_millis, 600_000);
    }

    #[test]
    fn test_seek_suppresses_position_updates() {
        let mut session = PlaybackSession::new("uri1", true);
        session.apply_report(&StatusReport::loaded(true, 1_000, 600_000));
        session.begin_seek(300_000);

        session.apply_report(&StatusReport::loaded(true, 2_000, 600_000));
        assert_eq!(session.position_millis, 300_000);

        assert!(session.complete_seek(300_000));
        session.apply_report(&StatusReport::loaded(true, 300_500, 600_000));
        assert_eq!(session.position_millis, 300_500);
    }

    #[test]
    fn test_stale_seek_completion_keeps_suppression() {
        let mut session = PlaybackSession::new("uri1", true);
        session.apply_report(&StatusReport::loaded(true, 0, 600_000));
        session.begin_seek(100_000);
        session.begin_seek(200_000);

        assert!(!session.complete_seek(100_000));
        assert!(session.is_seek_in_progress);
        assert!(session.complete_seek(200_000));
        assert!(!session.is_seek_in_progress);
    }

    #[test]
    fn test_error_keeps_last_position() {
        let mut session = PlaybackSession::new("uri1", true);
        session.apply_report(&StatusReport::loaded(true, 42_000, 600_000));
        session.apply_report(&StatusReport::failed("network"));

        assert!(!session.is_loading);
        assert!(!session.is_playing);
        assert_eq!(session.position_millis, 42_000);
        assert_eq!(session.duration_millis, 600_000);
        assert_eq!(
            session.error,
            Some(PlaybackError::Decode("network".into()))
        );
    }

    #[test]
    fn test_controls_tap_toggles() {
        let mut controls = ControlsVisibility::default();
        assert!(!controls.tap());
        assert!(controls.tap());
    }

    #[test]
    fn test_locked_tap_only_reveals() {
        let mut controls = ControlsVisibility::default();
        controls.toggle_lock();
        assert!(controls.tap());
        assert!(controls.tap());
    }

    #[test]
    fn test_unlock_reveals() {
        let mut controls = ControlsVisibility::default();
        controls.visible = false;
        assert!(controls.toggle_lock());
        assert!(!controls.visible);
        assert!(!controls.toggle_lock());
        assert!(controls.visible);
    }
}
