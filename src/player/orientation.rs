//! Orientation lock without a real display
//!
//! Tracks what the controller asked for. Used by the CLI host, where there is
//! no screen to rotate, and handy for exercising rejection handling.

use super::{OrientationLock, PlaybackError};
use crate::models::Orientation;

/// Records the requested lock; optionally refuses every lock request
#[derive(Debug, Clone, Default)]
pub struct HeadlessOrientation {
    current: Option<Orientation>,
    reject_locks: bool,
}

impl HeadlessOrientation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform that ignores orientation locks
    pub fn rejecting() -> Self {
        Self {
            current: None,
            reject_locks: true,
        }
    }

    /// Currently held lock, `None` when unlocked
    pub fn current(&self) -> Option<Orientation> {
        self.current
    }
}

impl OrientationLock for HeadlessOrientation {
    fn lock(&mut self, orientation: Orientation) -> Result<(), PlaybackError> {
        if self.reject_locks {
            return Err(PlaybackError::OrientationRejected(format!(
                "platform ignores {} lock",
                orientation
            )));
        }
        log::debug!("orientation locked to {}", orientation);
        self.current = Some(orientation);
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), PlaybackError> {
        log::debug!("orientation unlocked");
        self.current = None;
        Ok(())
    }
}
