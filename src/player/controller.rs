//! Playback controller
//!
//! Mediates user intents (play, pause, seek, lock, fullscreen, episode
//! navigation) against a [`PlaybackSession`] and the decoder, and manages the
//! timed visibility of the on-screen controls.
//!
//! The controller is driven from a single task. Requests to collaborators
//! return immediately; their outcomes arrive later on the controller's event
//! queue and are applied with [`PlaybackController::apply`]. Nothing changes
//! optimistically except the fullscreen flag.

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{
    AutoHideTimer, ControlsVisibility, ControllerEvent, DecoderEvent, DecoderHandle,
    EpisodeNavigator, MediaDecoder, OrientationLock, PlaybackError, PlaybackSession,
    PlayerConfig, StatusSink,
};
use crate::models::{display_title, Episode, Orientation, PlayerPhase, PlayerSnapshot};

/// Inputs of the auto-hide rule; the timer is re-armed only when one changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AutoHideInputs {
    visible: bool,
    playing: bool,
    loading: bool,
    locked: bool,
}

/// Playback/visibility state machine for one player view
pub struct PlaybackController<D: MediaDecoder, O: OrientationLock> {
    decoder: D,
    orientation: O,
    config: PlayerConfig,

    session: Option<PlaybackSession>,
    handle: Option<DecoderHandle>,
    /// Bumped on every teardown; decoder events carry the value they were issued under
    generation: u64,

    controls: ControlsVisibility,
    timer: AutoHideTimer,

    fullscreen: bool,
    /// Set once we touched the process-wide orientation lock
    orientation_held: bool,
    orientation_error: Option<PlaybackError>,

    episodes: EpisodeNavigator,
    title: String,

    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl<D: MediaDecoder, O: OrientationLock> PlaybackController<D, O> {
    /// Create an idle controller; call [`initialize`](Self::initialize) to start playing
    pub fn new(decoder: D, orientation: O, config: PlayerConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let timer = AutoHideTimer::new(config.auto_hide_delay);
        Self {
            decoder,
            orientation,
            config,
            session: None,
            handle: None,
            generation: 0,
            controls: ControlsVisibility::default(),
            timer,
            fullscreen: false,
            orientation_held: false,
            orientation_error: None,
            episodes: EpisodeNavigator::default(),
            title: String::new(),
            events_tx,
            events_rx,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn orientation(&self) -> &O {
        &self.orientation
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn controls(&self) -> ControlsVisibility {
        self.controls
    }

    pub fn controls_visible(&self) -> bool {
        self.controls.visible
    }

    pub fn is_locked(&self) -> bool {
        self.controls.locked
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Last orientation rejection, cleared by the next accepted request
    pub fn orientation_error(&self) -> Option<&PlaybackError> {
        self.orientation_error.as_ref()
    }

    /// Decode error of the current session
    pub fn error(&self) -> Option<&PlaybackError> {
        self.session.as_ref().and_then(|s| s.error.as_ref())
    }

    pub fn episodes(&self) -> &EpisodeNavigator {
        &self.episodes
    }

    /// When the controls will auto-hide, if armed
    pub fn auto_hide_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    // -------------------------------------------------------------------------
    // Session Lifecycle
    // -------------------------------------------------------------------------

    /// Start a session for `uri`, tearing down any previous one
    ///
    /// The decoder is asked to load and, with autoplay on, to start playing.
    /// A synchronous load failure is recorded on the new session rather than
    /// returned, so the host can offer a retry.
    pub fn initialize(&mut self, uri: &str) -> Result<(), PlaybackError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(PlaybackError::InvalidState("media locator is empty"));
        }

        let before = self.auto_hide_inputs();
        self.teardown_session();

        let mut session = PlaybackSession::new(uri, self.config.autoplay);
        let sink = StatusSink::new(self.generation, self.events_tx.clone());
        match self.decoder.load(uri, sink) {
            Ok(handle) => {
                log::info!("session {} loading {}", session.id, uri);
                if self.config.autoplay {
                    self.decoder.play(handle);
                }
                self.handle = Some(handle);
            }
            Err(err) => {
                log::warn!("failed to load {}: {}", uri, err);
                session.fail(err);
            }
        }
        self.session = Some(session);

        self.controls.visible = true;
        self.refresh_auto_hide(before, true);
        Ok(())
    }

    /// Re-initialize with the current session's locator
    pub fn retry(&mut self) -> Result<(), PlaybackError> {
        let uri = self
            .session
            .as_ref()
            .map(|s| s.media_uri.clone())
            .ok_or(PlaybackError::InvalidState("no session to retry"))?;
        self.initialize(&uri)
    }

    /// Release everything the controller holds
    ///
    /// Cancels the auto-hide action, releases the decode resource and
    /// restores the orientation lock. Late callbacks from the old session are
    /// ignored. Safe to call more than once.
    pub fn close(&mut self) {
        self.teardown_session();
        if self.orientation_held {
            if let Err(err) = self.orientation.unlock() {
                log::warn!("could not restore orientation: {}", err);
            }
            self.orientation_held = false;
        }
        self.fullscreen = false;
        self.controls = ControlsVisibility::default();
    }

    fn teardown_session(&mut self) {
        self.timer.cancel();
        if let Some(handle) = self.handle.take() {
            self.decoder.release(handle);
        }
        if let Some(session) = self.session.take() {
            log::debug!("session {} torn down", session.id);
        }
        self.generation += 1;
    }

    // -------------------------------------------------------------------------
    // Event Handling
    // -------------------------------------------------------------------------

    /// Wait for the next queued event
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.events_rx.recv().await
    }

    /// Wait for the next queued event and apply it
    pub async fn process_next(&mut self) {
        if let Some(event) = self.next_event().await {
            self.apply(event);
        }
    }

    /// Apply every event already queued, returning how many were taken
    pub fn drain_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            count += 1;
        }
        count
    }

    pub fn apply(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Decoder { generation, event } => {
                self.on_decoder_event(generation, event);
            }
            ControllerEvent::AutoHideElapsed { ticket } => self.on_auto_hide(ticket),
        }
    }

    /// Apply decoder output. Returns false when the event was discarded.
    pub fn on_decoder_event(&mut self, generation: u64, event: DecoderEvent) -> bool {
        if generation != self.generation {
            log::debug!(
                "dropping decoder event from generation {} (current {})",
                generation,
                self.generation
            );
            return false;
        }

        let before = self.auto_hide_inputs();
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let mut reveal = false;
        match event {
            DecoderEvent::Status(report) => {
                let was_playing = session.is_playing && !session.is_loading;
                session.apply_report(&report);
                if let Some(ref message) = report.error {
                    log::warn!("session {} decode error: {}", session.id, message);
                }
                if report.did_just_finish {
                    log::info!("session {} reached end of media", session.id);
                }
                reveal = was_playing && !session.is_playing;
            }
            DecoderEvent::SeekCompleted { target_millis } => {
                if !session.complete_seek(target_millis) {
                    log::debug!("ignoring completion of superseded seek to {}", target_millis);
                }
            }
        }

        if reveal {
            self.controls.visible = true;
        }
        self.refresh_auto_hide(before, false);
        true
    }

    fn on_auto_hide(&mut self, ticket: u64) {
        if !self.timer.accept(ticket) {
            log::debug!("ignoring stale auto-hide ticket {}", ticket);
            return;
        }
        if self.controls.visible && self.hide_armed() {
            self.controls.visible = false;
        }
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    /// Ask the decoder to pause or resume; state follows its next report
    pub fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        let handle = self.ready_handle()?;
        let playing = self.session.as_ref().is_some_and(|s| s.is_playing);
        if playing {
            self.decoder.pause(handle);
        } else {
            self.decoder.play(handle);
        }
        Ok(())
    }

    /// Seek by `delta_millis` from the current position, clamped to the media
    pub fn seek_relative(&mut self, delta_millis: i64) -> Result<u64, PlaybackError> {
        self.ready_handle()?;
        let target = match self.session.as_ref() {
            Some(s) if delta_millis >= 0 => s.position_millis.saturating_add(delta_millis as u64),
            Some(s) => s.position_millis.saturating_sub(delta_millis.unsigned_abs()),
            None => return Err(PlaybackError::InvalidState("no active session")),
        };
        self.seek_absolute(target)
    }

    pub fn skip_forward(&mut self) -> Result<u64, PlaybackError> {
        self.seek_relative(self.skip_delta())
    }

    pub fn skip_backward(&mut self) -> Result<u64, PlaybackError> {
        self.seek_relative(-self.skip_delta())
    }

    /// Commit a scrub to `target_millis` (clamped to the duration)
    ///
    /// Until the decoder confirms, the reported position is the target and
    /// decoder position updates are suppressed. Returns the issued target.
    pub fn seek_absolute(&mut self, target_millis: u64) -> Result<u64, PlaybackError> {
        let handle = self.ready_handle()?;
        let before = self.auto_hide_inputs();

        let target = match self.session.as_mut() {
            Some(session) => {
                let target = session.clamp(target_millis);
                session.begin_seek(target);
                target
            }
            None => return Err(PlaybackError::InvalidState("no active session")),
        };
        self.decoder.seek_to(handle, target);

        self.controls.visible = true;
        self.refresh_auto_hide(before, true);
        Ok(target)
    }

    /// The user grabbed the progress control; decoder positions are suppressed
    pub fn begin_scrub(&mut self) -> Result<(), PlaybackError> {
        self.ready_handle()?;
        let before = self.auto_hide_inputs();
        if let Some(session) = self.session.as_mut() {
            session.is_seek_in_progress = true;
        }
        self.controls.visible = true;
        self.refresh_auto_hide(before, true);
        Ok(())
    }

    /// The drag ended without a seek
    pub fn cancel_scrub(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.pending_seek.is_none() {
                session.is_seek_in_progress = false;
            }
        }
    }

    fn skip_delta(&self) -> i64 {
        i64::try_from(self.config.skip_interval_ms).unwrap_or(i64::MAX)
    }

    fn ready_handle(&self) -> Result<DecoderHandle, PlaybackError> {
        match (&self.session, self.handle) {
            (None, _) => Err(PlaybackError::InvalidState("no active session")),
            (Some(s), _) if s.error.is_some() => {
                Err(PlaybackError::InvalidState("session failed to load"))
            }
            (Some(s), Some(handle)) if s.is_ready() => Ok(handle),
            _ => Err(PlaybackError::InvalidState("session is still loading")),
        }
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    /// Reveal the controls and restart the auto-hide delay
    pub fn show_controls(&mut self) {
        let before = self.auto_hide_inputs();
        self.controls.visible = true;
        self.refresh_auto_hide(before, true);
    }

    /// Screen tap. While locked this only reveals, so the unlock button stays reachable.
    pub fn toggle_controls_visibility(&mut self) -> bool {
        let before = self.auto_hide_inputs();
        let visible = self.controls.tap();
        self.refresh_auto_hide(before, true);
        visible
    }

    /// Flip the lock; unlocking reveals the controls and restarts the delay
    pub fn toggle_lock(&mut self) -> bool {
        let before = self.auto_hide_inputs();
        let locked = self.controls.toggle_lock();
        log::debug!("controls {}", if locked { "locked" } else { "unlocked" });
        self.refresh_auto_hide(before, true);
        locked
    }

    /// Flip fullscreen and request the matching orientation
    ///
    /// The flag flips regardless of what the platform does with the request.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        let target = if self.fullscreen {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };

        self.orientation_held = true;
        let result = self
            .orientation
            .unlock()
            .and_then(|()| self.orientation.lock(target));
        match result {
            Ok(()) => self.orientation_error = None,
            Err(err) => {
                log::warn!("{} (continuing with fullscreen={})", err, self.fullscreen);
                self.orientation_error = Some(err);
            }
        }
        self.fullscreen
    }

    fn auto_hide_inputs(&self) -> AutoHideInputs {
        let (playing, loading) = self
            .session
            .as_ref()
            .map(|s| (s.is_playing, s.is_loading))
            .unwrap_or((false, true));
        AutoHideInputs {
            visible: self.controls.visible,
            playing,
            loading,
            locked: self.controls.locked,
        }
    }

    /// Whether an elapsed delay may hide the controls right now
    fn hide_armed(&self) -> bool {
        let inputs = self.auto_hide_inputs();
        inputs.playing && !inputs.loading && !inputs.locked
    }

    fn refresh_auto_hide(&mut self, before: AutoHideInputs, force: bool) {
        if !force && before == self.auto_hide_inputs() {
            return;
        }
        self.timer.cancel();
        if self.controls.visible && self.hide_armed() {
            self.timer.schedule(&self.events_tx);
        }
    }

    // -------------------------------------------------------------------------
    // Episodes
    // -------------------------------------------------------------------------

    /// Replace the episode list (owned by the hosting screen)
    pub fn set_episodes(&mut self, episodes: Vec<Episode>, current_index: usize) {
        self.episodes = EpisodeNavigator::new(episodes, current_index);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn has_next_episode(&self) -> bool {
        self.episodes.has_next()
    }

    pub fn has_previous_episode(&self) -> bool {
        self.episodes.has_previous()
    }

    /// Advance to the next episode. `Ok(false)` when there is none.
    pub fn go_to_next_episode(&mut self) -> Result<bool, PlaybackError> {
        let Some(index) = self.episodes.next_index() else {
            log::debug!("no next episode");
            return Ok(false);
        };
        self.play_episode(index)?;
        Ok(true)
    }

    /// Go back to the previous episode. `Ok(false)` when there is none.
    pub fn go_to_previous_episode(&mut self) -> Result<bool, PlaybackError> {
        let Some(index) = self.episodes.previous_index() else {
            log::debug!("no previous episode");
            return Ok(false);
        };
        self.play_episode(index)?;
        Ok(true)
    }

    /// Jump to an episode picked from the list
    ///
    /// The cursor only moves once the new session has started; on error the
    /// current episode and its session are left as they were.
    pub fn play_episode(&mut self, index: usize) -> Result<(), PlaybackError> {
        let len = self.episodes.len();
        let locator = self
            .episodes
            .get(index)
            .map(|e| e.locator.clone())
            .ok_or(PlaybackError::NoSuchEpisode { index, len })?;
        self.initialize(&locator)?;
        self.episodes.select(index);
        Ok(())
    }

    /// "Movie - Episode" while an episode list is loaded, else the movie title
    pub fn display_title(&self) -> String {
        display_title(&self.title, self.episodes.current().map(|e| e.name.as_str()))
    }

    // -------------------------------------------------------------------------
    // State Views
    // -------------------------------------------------------------------------

    /// Current phase, `None` before the first `initialize` or after `close`
    pub fn phase(&self) -> Option<PlayerPhase> {
        let session = self.session.as_ref()?;
        let phase = if self.controls.locked {
            PlayerPhase::Locked
        } else if session.is_loading {
            PlayerPhase::Loading
        } else if !session.is_playing {
            PlayerPhase::Paused
        } else if self.controls.visible {
            PlayerPhase::PlayingVisible
        } else {
            PlayerPhase::PlayingHidden
        };
        Some(phase)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let session = self.session.as_ref();
        PlayerSnapshot {
            session_id: session.map(|s| s.id),
            locator: session.map(|s| s.media_uri.clone()),
            title: self.display_title(),
            phase: self.phase(),
            position_millis: session.map_or(0, |s| s.position_millis),
            duration_millis: session.map_or(0, |s| s.duration_millis),
            is_playing: session.is_some_and(|s| s.is_playing),
            is_loading: session.is_some_and(|s| s.is_loading),
            is_seek_in_progress: session.is_some_and(|s| s.is_seek_in_progress),
            finished: session.is_some_and(|s| s.finished),
            controls_visible: self.controls.visible,
            locked: self.controls.locked,
            fullscreen: self.fullscreen,
            episode_index: self.episodes.current_index(),
            episode_count: self.episodes.len(),
            has_next_episode: self.episodes.has_next(),
            has_previous_episode: self.episodes.has_previous(),
            error: self.error().map(|e| e.to_string()),
        }
    }
}

impl<D: MediaDecoder, O: OrientationLock> Drop for PlaybackController<D, O> {
    fn drop(&mut self) {
        self.close();
    }
}
