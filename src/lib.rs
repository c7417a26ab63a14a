//! reelplay - playback controller for streamed movies and series
//!
//! Owns playback state, timed auto-hide of the on-screen controls, lock
//! mode, fullscreen/orientation and episode navigation, and drives a media
//! decoder and a screen-orientation lock supplied by the host.
//!
//! # Modules
//!
//! - `models` - Status reports, episodes, locator kinds, snapshots
//! - `player` - Controller, collaborator traits, simulated decoder
//! - `config` - Config file handling
//! - `cli` / `commands` - Command line host

pub mod models;
pub mod player;
pub mod config;
pub mod cli;
pub mod commands;

// Re-export commonly used types
pub use models::{
    Episode, EpisodeLink, EpisodeServer, LocatorKind,
    Orientation, PlayerPhase, PlayerSnapshot, StatusReport,
};

pub use player::{
    ControllerEvent, DecoderEvent, DecoderHandle, MediaDecoder, OrientationLock,
    PlaybackController, PlaybackError, PlayerConfig, StatusSink,
};
