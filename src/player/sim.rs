//! Simulated media decoder
//!
//! Stands in for a native decode pipeline. Each loaded locator gets its own
//! tokio task that owns the playback clock and talks back through the
//! session's [`StatusSink`], the same way a real decoder's callbacks would.
//!
//! - HLS manifests and media files load after `load_latency` and play for `duration`;
//!   a play request made while loading is honoured by the first report
//! - Embed pages report a decode error asynchronously
//! - Unrecognised locators are refused synchronously

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DecoderHandle, MediaDecoder, PlaybackError, StatusSink};
use crate::models::{LocatorKind, StatusReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimCommand {
    Play,
    Pause,
    Seek(u64),
}

struct SimSession {
    commands: mpsc::UnboundedSender<SimCommand>,
    task: JoinHandle<()>,
}

/// In-process decoder driven by tokio timers
pub struct SimulatedDecoder {
    duration: Duration,
    tick: Duration,
    load_latency: Duration,
    next_id: u64,
    sessions: HashMap<u64, SimSession>,
}

impl SimulatedDecoder {
    /// Decoder whose media all last `duration`
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            tick: Duration::from_millis(500),
            load_latency: Duration::from_millis(300),
            next_id: 0,
            sessions: HashMap::new(),
        }
    }

    /// Interval between position reports while playing
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Delay before the first status report
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Number of live decode resources
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn send(&self, handle: DecoderHandle, command: SimCommand) {
        match self.sessions.get(&handle.0) {
            Some(session) => {
                let _ = session.commands.send(command);
            }
            None => log::debug!("sim decoder: {:?} for released handle {}", command, handle.0),
        }
    }
}

impl Default for SimulatedDecoder {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

impl MediaDecoder for SimulatedDecoder {
    fn load(&mut self, locator: &str, sink: StatusSink) -> Result<DecoderHandle, PlaybackError> {
        let kind = LocatorKind::classify(locator);
        if kind == LocatorKind::Unknown {
            return Err(PlaybackError::Decode(format!(
                "unsupported locator: {}",
                locator
            )));
        }

        self.next_id += 1;
        let handle = DecoderHandle(self.next_id);
        let (commands, rx) = mpsc::unbounded_channel();
        let clock = SimClock {
            duration_millis: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            tick: self.tick,
            load_latency: self.load_latency,
        };
        let task = if kind.is_playable() {
            tokio::spawn(clock.run(sink, rx))
        } else {
            let latency = self.load_latency;
            let message = format!("{} page is not a playable stream", kind);
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                sink.report(StatusReport::failed(message));
            })
        };

        log::debug!("sim decoder: handle {} -> {} ({})", handle.0, locator, kind);
        self.sessions.insert(handle.0, SimSession { commands, task });
        Ok(handle)
    }

    fn play(&mut self, handle: DecoderHandle) {
        self.send(handle, SimCommand::Play);
    }

    fn pause(&mut self, handle: DecoderHandle) {
        self.send(handle, SimCommand::Pause);
    }

    fn seek_to(&mut self, handle: DecoderHandle, millis: u64) {
        self.send(handle, SimCommand::Seek(millis));
    }

    fn release(&mut self, handle: DecoderHandle) {
        if let Some(session) = self.sessions.remove(&handle.0) {
            session.task.abort();
            log::debug!("sim decoder: released handle {}", handle.0);
        }
    }
}

impl Drop for SimulatedDecoder {
    fn drop(&mut self) {
        for (_, session) in self.sessions.drain() {
            session.task.abort();
        }
    }
}

/// Playback clock owned by one session task
struct SimClock {
    duration_millis: u64,
    tick: Duration,
    load_latency: Duration,
}

impl SimClock {
    async fn run(self, sink: StatusSink, mut commands: mpsc::UnboundedReceiver<SimCommand>) {
        tokio::time::sleep(self.load_latency).await;

        let tick_millis = u64::try_from(self.tick.as_millis()).unwrap_or(u64::MAX);
        let mut position = 0u64;
        let mut playing = false;

        // Requests queued while loading (autoplay) shape the first report
        while let Ok(command) = commands.try_recv() {
            match command {
                SimCommand::Play => playing = true,
                SimCommand::Pause => playing = false,
                SimCommand::Seek(target) => {
                    position = target.min(self.duration_millis);
                    if !sink.seek_completed(target) {
                        return;
                    }
                }
            }
        }
        if !sink.report(StatusReport::loaded(playing, position, self.duration_millis)) {
            return;
        }

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.reset();

        loop {
            let report = tokio::select! {
                command = commands.recv() => match command {
                    None => break,
                    Some(SimCommand::Play) => {
                        if position >= self.duration_millis {
                            position = 0;
                        }
                        playing = true;
                        ticker.reset();
                        StatusReport::loaded(playing, position, self.duration_millis)
                    }
                    Some(SimCommand::Pause) => {
                        playing = false;
                        StatusReport::loaded(playing, position, self.duration_millis)
                    }
                    Some(SimCommand::Seek(target)) => {
                        position = target.min(self.duration_millis);
                        if !sink.seek_completed(target) {
                            break;
                        }
                        StatusReport::loaded(playing, position, self.duration_millis)
                    }
                },
                _ = ticker.tick(), if playing => {
                    position = position.saturating_add(tick_millis);
                    if position >= self.duration_millis {
                        position = self.duration_millis;
                        playing = false;
                        StatusReport::finished(self.duration_millis)
                    } else {
                        StatusReport::loaded(playing, position, self.duration_millis)
                    }
                }
            };

            if !sink.report(report) {
                break;
            }
        }
    }
}
