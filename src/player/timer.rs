//! Auto-hide timer for the controls overlay
//!
//! A single cancellable delayed action. Each arming spawns a sleep task that
//! posts [`ControllerEvent::AutoHideElapsed`] with a ticket; cancelling aborts
//! the task and retires the ticket, so a message that already made it into
//! the queue is recognised as stale.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::ControllerEvent;

/// Owned handle for the pending auto-hide action
#[derive(Debug)]
pub struct AutoHideTimer {
    delay: Duration,
    ticket: u64,
    pending: Option<JoinHandle<()>>,
    deadline: Option<Instant>,
}

impl AutoHideTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ticket: 0,
            pending: None,
            deadline: None,
        }
    }

    /// When the pending action will fire, if one is armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel any pending action and arm a new one. Must run inside a tokio runtime.
    pub fn schedule(&mut self, tx: &mpsc::UnboundedSender<ControllerEvent>) {
        self.cancel();
        self.ticket += 1;

        let ticket = self.ticket;
        let delay = self.delay;
        let tx = tx.clone();
        self.deadline = Some(Instant::now() + delay);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ControllerEvent::AutoHideElapsed { ticket });
        }));
    }

    /// Cancel the pending action, if any
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        self.deadline = None;
    }

    /// Consume a fire message. True only for the live arming; the timer is
    /// disarmed afterwards and is not rescheduled.
    pub fn accept(&mut self, ticket: u64) -> bool {
        if self.pending.is_some() && ticket == self.ticket {
            self.pending = None;
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

impl Drop for AutoHideTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
