//! CLI Command Handlers
//!
//! Implements all CLI commands on top of the playback controller.
//! Each handler takes CLI args and Output, returns ExitCode.

use std::ops::ControlFlow;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{ConfigCmd, EpisodeRow, EpisodesCmd, ExitCode, Intent, Output, PlayCmd, SeekPosition};
use crate::config::Config;
use crate::models::{format_time, Episode, EpisodeCatalog, EpisodeServer, LocatorKind, PlayerPhase};
use crate::player::{
    HeadlessOrientation, MediaDecoder, OrientationLock, PlaybackController, SimulatedDecoder,
};

// =============================================================================
// Episode Files
// =============================================================================

/// Read a catalog episode export
pub fn load_catalog(path: &Path) -> Result<Vec<EpisodeServer>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let catalog: EpisodeCatalog = serde_json::from_str(&contents)
        .with_context(|| format!("Unrecognised episode file {}", path.display()))?;
    Ok(catalog.into_servers())
}

/// Playable episodes of one server in a catalog export
pub fn load_episodes(path: &Path, server: usize) -> Result<Vec<Episode>> {
    let servers = load_catalog(path)?;
    let count = servers.len();
    let server = servers
        .get(server)
        .with_context(|| format!("Server {} not found ({} available)", server, count))?;
    Ok(server.episodes())
}

// =============================================================================
// Play Command
// =============================================================================

pub async fn play_cmd(cmd: PlayCmd, config: &Config, output: &Output) -> ExitCode {
    let episodes = match cmd.episodes.as_deref() {
        Some(path) => {
            let server = cmd.server.unwrap_or(config.default_server());
            match load_episodes(path, server) {
                Ok(episodes) if episodes.is_empty() => {
                    return output.error("No playable episodes in file", ExitCode::InvalidArgs)
                }
                Ok(episodes) => episodes,
                Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
            }
        }
        None => Vec::new(),
    };

    let script = match cmd.script.as_deref().map(Intent::parse_script).transpose() {
        Ok(script) => script,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };

    let duration = Duration::from_secs(cmd.duration.unwrap_or(config.sim_duration_secs()));
    let mut player = PlaybackController::new(
        SimulatedDecoder::new(duration),
        HeadlessOrientation::new(),
        config.player_config(),
    );
    player.set_title(cmd.title.as_str());

    let started = if episodes.is_empty() {
        match cmd.locator.as_deref() {
            Some(locator) => player.initialize(locator),
            None => return output.error("Nothing to play", ExitCode::InvalidArgs),
        }
    } else {
        player.set_episodes(episodes, cmd.index);
        let index = player.episodes().current_index().unwrap_or(0);
        player.play_episode(index)
    };
    if let Err(e) = started {
        return output.error(e.to_string(), ExitCode::InvalidArgs);
    }

    let mut reporter = Reporter::default();
    reporter.observe(&player, output);

    let result = match script {
        Some(intents) => run_script(&mut player, intents, &mut reporter, output).await,
        None => run_interactive(&mut player, &mut reporter, output).await,
    };

    let failed = player.error().is_some();
    player.close();

    match result {
        Err(e) => output.error(format!("{:#}", e), ExitCode::Error),
        Ok(()) if failed => ExitCode::PlaybackFailed,
        Ok(()) => ExitCode::Success,
    }
}

/// Run intents in order; `wait` lets decoder and timer events play out
async fn run_script<D: MediaDecoder, O: OrientationLock>(
    player: &mut PlaybackController<D, O>,
    intents: Vec<Intent>,
    reporter: &mut Reporter,
    output: &Output,
) -> Result<()> {
    for intent in intents {
        if let Intent::Wait(ms) = intent {
            pump_for(player, Duration::from_millis(ms), reporter, output).await;
            continue;
        }
        // Let anything already delivered land before acting
        tokio::task::yield_now().await;
        player.drain_events();
        if apply_intent(player, intent, output)?.is_break() {
            break;
        }
        reporter.observe(player, output);
    }
    Ok(())
}

/// Read intents from stdin until EOF or `quit`
async fn run_interactive<D: MediaDecoder, O: OrientationLock>(
    player: &mut PlaybackController<D, O>,
    reporter: &mut Reporter,
    output: &Output,
) -> Result<()> {
    output.info("Type intents (toggle, ff, rw, seek 1:30, lock, tap, fs, next, prev, status, quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Intent::parse(&line) {
                    Ok(Intent::Wait(ms)) => pump_for(player, Duration::from_millis(ms), reporter, output).await,
                    Ok(intent) => {
                        if apply_intent(player, intent, output)?.is_break() {
                            break;
                        }
                    }
                    Err(e) => output.info(e),
                }
            }
            Some(event) = player.next_event() => player.apply(event),
        }
        reporter.observe(player, output);
    }
    Ok(())
}

/// Apply controller events for `period`
async fn pump_for<D: MediaDecoder, O: OrientationLock>(
    player: &mut PlaybackController<D, O>,
    period: Duration,
    reporter: &mut Reporter,
    output: &Output,
) {
    let deadline = tokio::time::sleep(period);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            Some(event) = player.next_event() => {
                player.apply(event);
                reporter.observe(player, output);
            }
        }
    }
}

fn apply_intent<D: MediaDecoder, O: OrientationLock>(
    player: &mut PlaybackController<D, O>,
    intent: Intent,
    output: &Output,
) -> Result<ControlFlow<()>> {
    let outcome = match intent {
        Intent::TogglePlayPause => player.toggle_play_pause(),
        Intent::SkipForward => player.skip_forward().map(|_| ()),
        Intent::SkipBackward => player.skip_backward().map(|_| ()),
        Intent::Seek(position) => {
            let issued = match position {
                SeekPosition::Absolute(secs) => player.seek_absolute(secs.saturating_mul(1000)),
                SeekPosition::Forward(secs) => player.seek_relative(seconds_to_delta(secs)),
                SeekPosition::Backward(secs) => player.seek_relative(-seconds_to_delta(secs)),
            };
            issued.map(|target| output.info(format!("Seeking to {}", format_time(target))))
        }
        Intent::BeginScrub => player.begin_scrub(),
        Intent::ToggleLock => {
            player.toggle_lock();
            Ok(())
        }
        Intent::Tap => {
            player.toggle_controls_visibility();
            Ok(())
        }
        Intent::ToggleFullscreen => {
            player.toggle_fullscreen();
            if let Some(err) = player.orientation_error() {
                output.info(err);
            }
            Ok(())
        }
        Intent::NextEpisode => player.go_to_next_episode().map(|moved| {
            if !moved {
                output.info("No next episode");
            }
        }),
        Intent::PreviousEpisode => player.go_to_previous_episode().map(|moved| {
            if !moved {
                output.info("No previous episode");
            }
        }),
        Intent::Retry => player.retry(),
        Intent::Status => {
            let snapshot = player.snapshot();
            output.line(&snapshot, &snapshot)?;
            Ok(())
        }
        Intent::Wait(_) => Ok(()),
        Intent::Quit => return Ok(ControlFlow::Break(())),
    };

    if let Err(e) = outcome {
        output.info(format!("Cannot {:?}: {}", intent, e));
    }
    Ok(ControlFlow::Continue(()))
}

fn seconds_to_delta(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

/// Prints the player state whenever something the user would notice changes
#[derive(Default)]
struct Reporter {
    last: Option<(Option<PlayerPhase>, bool, bool, Option<usize>, Option<String>)>,
}

impl Reporter {
    fn observe<D: MediaDecoder, O: OrientationLock>(
        &mut self,
        player: &PlaybackController<D, O>,
        output: &Output,
    ) {
        let snapshot = player.snapshot();
        let key = (
            snapshot.phase,
            snapshot.controls_visible,
            snapshot.fullscreen,
            snapshot.episode_index,
            snapshot.error.clone(),
        );
        if self.last.as_ref() == Some(&key) {
            return;
        }
        self.last = Some(key);
        if let Err(e) = output.line(&snapshot, &snapshot) {
            log::warn!("failed to print state: {}", e);
        }
    }
}

// =============================================================================
// Episodes Command
// =============================================================================

pub fn episodes_cmd(cmd: EpisodesCmd, output: &Output) -> ExitCode {
    let servers = match load_catalog(&cmd.file) {
        Ok(servers) => servers,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };
    if let Some(server) = cmd.server {
        if server >= servers.len() {
            return output.error(
                format!("Server {} not found ({} available)", server, servers.len()),
                ExitCode::InvalidArgs,
            );
        }
    }

    let rows: Vec<EpisodeRow> = servers
        .iter()
        .enumerate()
        .filter(|(idx, _)| cmd.server.map_or(true, |s| s == *idx))
        .flat_map(|(server_idx, server)| {
            server
                .episodes()
                .into_iter()
                .enumerate()
                .map(move |(index, episode)| EpisodeRow {
                    server: server_idx,
                    server_name: server.server_name.clone(),
                    index,
                    kind: LocatorKind::classify(&episode.locator).to_string(),
                    name: episode.name,
                    locator: episode.locator,
                })
        })
        .collect();

    if output.json {
        if let Err(e) = output.print(&rows) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else {
        for row in &rows {
            println!(
                "[{}] {:>3}  {:<20} {:<6} {}",
                row.server_name, row.index, row.name, row.kind, row.locator
            );
        }
        output.info(format!("{} episodes", rows.len()));
    }
    ExitCode::Success
}

// =============================================================================
// Config Command
// =============================================================================

pub fn config_cmd(cmd: ConfigCmd, config: &Config, path: Option<&Path>, output: &Output) -> ExitCode {
    let effective = config.with_defaults();
    let explicit = path.is_some();
    let path = path.map(Path::to_path_buf).or_else(Config::path);

    if cmd.init {
        let saved = match path {
            Some(ref path) if explicit => effective.save_to(path),
            _ => effective.save(),
        };
        if let Err(e) = saved {
            return output.error(format!("Failed to write config: {:#}", e), ExitCode::Error);
        }
        if let Some(ref path) = path {
            output.info(format!("Wrote {}", path.display()));
        }
    }

    if output.json {
        if let Err(e) = output.print(&effective) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else {
        if let Some(ref path) = path {
            println!("# {}", path.display());
        }
        match toml::to_string_pretty(&effective) {
            Ok(text) => print!("{}", text),
            Err(e) => return output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
        }
    }
    ExitCode::Success
}
