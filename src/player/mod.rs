//! Playback infrastructure
//!
//! - Controller: the playback/visibility state machine
//! - Collaborators: decoder and orientation-lock traits the controller drives
//! - Sim: a tokio-task decoder used by the CLI and integration tests

pub mod controller;
pub mod episodes;
pub mod error;
pub mod orientation;
pub mod session;
pub mod sim;
pub mod timer;

use std::time::Duration;
use tokio::sync::mpsc;

use crate::models::{Orientation, StatusReport};

pub use controller::PlaybackController;
pub use episodes::EpisodeNavigator;
pub use error::PlaybackError;
pub use orientation::HeadlessOrientation;
pub use session::{ControlsVisibility, PlaybackSession};
pub use sim::SimulatedDecoder;
pub use timer::AutoHideTimer;

// =============================================================================
// Configuration
// =============================================================================

/// Controller tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Idle time before visible controls hide while playing
    pub auto_hide_delay: Duration,
    /// Jump used by skip forward/backward
    pub skip_interval_ms: u64,
    /// Start playback as soon as a locator is loaded
    pub autoplay: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            auto_hide_delay: Duration::from_millis(4000),
            skip_interval_ms: 10_000,
            autoplay: true,
        }
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// Opaque handle to one loaded decode resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderHandle(pub u64);

/// Media decoding/rendering collaborator
///
/// Every request returns immediately. Outcomes come back asynchronously
/// through the [`StatusSink`] handed over at `load` time.
pub trait MediaDecoder {
    /// Open a locator and start reporting on `sink`
    fn load(&mut self, locator: &str, sink: StatusSink) -> Result<DecoderHandle, PlaybackError>;
    fn play(&mut self, handle: DecoderHandle);
    fn pause(&mut self, handle: DecoderHandle);
    /// Seek to an absolute offset; completion is reported as [`DecoderEvent::SeekCompleted`]
    fn seek_to(&mut self, handle: DecoderHandle, millis: u64);
    /// Stop and free the resource. No reports may follow.
    fn release(&mut self, handle: DecoderHandle);
}

/// Process-wide screen orientation lock
pub trait OrientationLock {
    fn lock(&mut self, orientation: Orientation) -> Result<(), PlaybackError>;
    fn unlock(&mut self) -> Result<(), PlaybackError>;
}

// =============================================================================
// Events
// =============================================================================

/// Something the decoder tells the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    Status(StatusReport),
    SeekCompleted { target_millis: u64 },
}

/// Message delivered to the controller's event queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Decoder output, stamped with the session generation it belongs to
    Decoder { generation: u64, event: DecoderEvent },
    /// The auto-hide delay elapsed for the given arming
    AutoHideElapsed { ticket: u64 },
}

/// Sending half given to the decoder for one session
///
/// The generation is captured at `initialize` time; the controller drops
/// anything stamped with an older generation.
#[derive(Debug, Clone)]
pub struct StatusSink {
    generation: u64,
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl StatusSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver a status report. Returns false once the controller is gone.
    pub fn report(&self, report: StatusReport) -> bool {
        self.send(DecoderEvent::Status(report))
    }

    /// Deliver a seek completion. Returns false once the controller is gone.
    pub fn seek_completed(&self, target_millis: u64) -> bool {
        self.send(DecoderEvent::SeekCompleted { target_millis })
    }

    fn send(&self, event: DecoderEvent) -> bool {
        self.tx
            .send(ControllerEvent::Decoder {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}
