//! CLI - Command Line Interface for reelplay
//!
//! Hosts the playback controller against the simulated decoder, either
//! interactively (one intent per stdin line) or from a script.
//!
//! # Examples
//!
//! ```bash
//! # Play a single locator and type intents
//! reelplay play https://cdn.example/movie/index.m3u8
//!
//! # Play episode 3 of a catalog export, scripted
//! reelplay play --episodes show.json --index 2 --script "wait 1000; ff; next; status; quit"
//!
//! # List episodes
//! reelplay episodes show.json --json
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Playback ended with a decode error
    PlaybackFailed = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// reelplay - playback controller for streamed movies and series
#[derive(Parser, Debug)]
#[command(
    name = "reelplay",
    version,
    author = "Gorka & Hermes",
    about = "Playback controller for streamed movies and series",
    long_about = "Drives the reelplay playback controller against a simulated decoder.\n\n\
                  Intents are read from stdin one per line, or from --script.",
    after_help = "INTENTS:\n\
                  toggle | p         Play/pause\n\
                  ff | +             Skip forward\n\
                  rw | -             Skip backward\n\
                  seek POS           Seek (90, 1:30, +30, -10)\n\
                  scrub              Start dragging the progress bar\n\
                  lock               Toggle controls lock\n\
                  tap                Tap the screen\n\
                  fs                 Toggle fullscreen\n\
                  next | n, prev     Episode navigation\n\
                  retry              Reload the current locator\n\
                  status | s         Print state\n\
                  wait MS            Pause the script\n\
                  quit | q           Close the player"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the player on a locator or an episode list
    #[command(visible_alias = "pl")]
    Play(PlayCmd),

    /// List the episodes in a catalog export
    #[command(visible_alias = "ep")]
    Episodes(EpisodesCmd),

    /// Show or initialise the configuration
    Config(ConfigCmd),
}

/// Open the player
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Media locator (HLS manifest, file or embed URL)
    #[arg(required_unless_present = "episodes")]
    pub locator: Option<String>,

    /// Catalog episode export (JSON)
    #[arg(long, short = 'e')]
    pub episodes: Option<PathBuf>,

    /// Episode server to use from the export
    #[arg(long, short = 's')]
    pub server: Option<usize>,

    /// Episode to start from (0-based)
    #[arg(long, short = 'i', default_value = "0")]
    pub index: usize,

    /// Title shown above the player
    #[arg(long, short = 't', default_value = "")]
    pub title: String,

    /// Simulated media length in seconds
    #[arg(long)]
    pub duration: Option<u64>,

    /// Semicolon-separated intents to run instead of reading stdin
    #[arg(long)]
    pub script: Option<String>,
}

/// List episodes
#[derive(Args, Debug)]
pub struct EpisodesCmd {
    /// Catalog episode export (JSON)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Only list this server
    #[arg(long, short = 's')]
    pub server: Option<usize>,
}

/// Show configuration
#[derive(Args, Debug)]
pub struct ConfigCmd {
    /// Write the effective configuration to the config file
    #[arg(long)]
    pub init: bool,
}

// =============================================================================
// Player Intents
// =============================================================================

/// Seek target parsed from user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPosition {
    /// Absolute position in seconds
    Absolute(u64),
    /// Forward N seconds
    Forward(u64),
    /// Backward N seconds
    Backward(u64),
}

impl SeekPosition {
    /// Parse "90", "1:30", "1:30:00", "+30" or "-10"
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(rest) = input.strip_prefix('+') {
            return rest.parse().ok().map(SeekPosition::Forward);
        }
        if let Some(rest) = input.strip_prefix('-') {
            return rest.parse().ok().map(SeekPosition::Backward);
        }

        // HH:MM:SS or MM:SS
        let parts: Vec<&str> = input.split(':').collect();
        let fields = match parts.as_slice() {
            [s] => [None, None, Some(*s)],
            [m, s] => [None, Some(*m), Some(*s)],
            [h, m, s] => [Some(*h), Some(*m), Some(*s)],
            _ => return None,
        };
        let mut secs = 0u64;
        for (field, scale) in fields.into_iter().zip([3600u64, 60, 1]) {
            if let Some(field) = field {
                let value = field.parse::<u64>().ok()?;
                secs = value.checked_mul(scale)?.checked_add(secs)?;
            }
        }
        Some(SeekPosition::Absolute(secs))
    }
}

/// One user action against the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    TogglePlayPause,
    SkipForward,
    SkipBackward,
    Seek(SeekPosition),
    BeginScrub,
    ToggleLock,
    Tap,
    ToggleFullscreen,
    NextEpisode,
    PreviousEpisode,
    Retry,
    Status,
    Wait(u64),
    Quit,
}

impl Intent {
    /// Parse a single intent line
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };

        let intent = match word.to_lowercase().as_str() {
            "toggle" | "p" | "play" | "pause" => Intent::TogglePlayPause,
            "ff" | "+" => Intent::SkipForward,
            "rw" | "-" => Intent::SkipBackward,
            "seek" => SeekPosition::parse(arg)
                .map(Intent::Seek)
                .ok_or_else(|| format!("Invalid seek position: '{}'", arg))?,
            "scrub" => Intent::BeginScrub,
            "lock" => Intent::ToggleLock,
            "tap" => Intent::Tap,
            "fs" | "fullscreen" => Intent::ToggleFullscreen,
            "next" | "n" => Intent::NextEpisode,
            "prev" | "previous" => Intent::PreviousEpisode,
            "retry" => Intent::Retry,
            "status" | "s" => Intent::Status,
            "wait" => arg
                .parse()
                .map(Intent::Wait)
                .map_err(|_| format!("Invalid wait duration: '{}'", arg))?,
            "quit" | "q" | "exit" => Intent::Quit,
            "" => return Err("Empty intent".to_string()),
            other => return Err(format!("Unknown intent: '{}'", other)),
        };
        Ok(intent)
    }

    /// Parse a semicolon-separated script, skipping blank entries
    pub fn parse_script(script: &str) -> Result<Vec<Self>, String> {
        script
            .split(';')
            .filter(|s| !s.trim().is_empty())
            .map(Intent::parse)
            .collect()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON envelope for command output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl<T> JsonOutput<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error_msg(msg: &str, code: ExitCode) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.to_string()),
            code: Some(code.into()),
        }
    }
}

/// One row of `reelplay episodes`
#[derive(Debug, Serialize, Deserialize)]
pub struct EpisodeRow {
    pub server: usize,
    pub server_name: String,
    pub index: usize,
    pub name: String,
    pub locator: String,
    pub kind: String,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print one line: `human` on a terminal, compact JSON of `data` otherwise
    pub fn line<T: Serialize>(&self, human: impl std::fmt::Display, data: &T) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(data)?);
        } else {
            println!("{}", human);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
