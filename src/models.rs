//! Data structures and types for reelplay
//!
//! Contains all shared models used across the crate organized by domain:
//! - **Decoder**: status reports coming back from the media decoder
//! - **Display**: orientation, player phase and the serializable snapshot
//! - **Episodes**: catalog episode records, servers and locator kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

// =============================================================================
// Decoder Models
// =============================================================================

/// Status report emitted by the media decoder whenever playback changes
///
/// Reports arrive for load completion, position ticks, play/pause changes,
/// end of media and errors. `loaded == false` with an `error` set means the
/// current locator could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub loaded: bool,
    pub is_playing: bool,
    pub position_millis: u64,
    pub duration_millis: u64,
    #[serde(default)]
    pub did_just_finish: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    /// Report for a loaded resource
    pub fn loaded(is_playing: bool, position_millis: u64, duration_millis: u64) -> Self {
        Self {
            loaded: true,
            is_playing,
            position_millis,
            duration_millis,
            did_just_finish: false,
            error: None,
        }
    }

    /// Report for a resource that reached its end
    pub fn finished(duration_millis: u64) -> Self {
        Self {
            did_just_finish: true,
            ..Self::loaded(false, duration_millis, duration_millis)
        }
    }

    /// Report for a resource that failed to load or play
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Display Models
// =============================================================================

/// Screen orientation requested from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Landscape => write!(f, "landscape"),
        }
    }
}

/// Combined playback/visibility state of the player overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerPhase {
    /// Waiting for the first status report
    Loading,
    /// Playing with controls on screen
    PlayingVisible,
    /// Playing with controls auto-hidden
    PlayingHidden,
    /// Paused (controls stay on screen)
    Paused,
    /// Controls locked, only the unlock button responds
    Locked,
}

impl fmt::Display for PlayerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerPhase::Loading => write!(f, "Loading"),
            PlayerPhase::PlayingVisible => write!(f, "Playing"),
            PlayerPhase::PlayingHidden => write!(f, "Playing (controls hidden)"),
            PlayerPhase::Paused => write!(f, "Paused"),
            PlayerPhase::Locked => write!(f, "Locked"),
        }
    }
}

/// Serializable view of the whole controller, for hosts and CLI output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub session_id: Option<Uuid>,
    pub locator: Option<String>,
    pub title: String,
    pub phase: Option<PlayerPhase>,
    pub position_millis: u64,
    pub duration_millis: u64,
    pub is_playing: bool,
    pub is_loading: bool,
    pub is_seek_in_progress: bool,
    pub finished: bool,
    pub controls_visible: bool,
    pub locked: bool,
    pub fullscreen: bool,
    pub episode_index: Option<usize>,
    pub episode_count: usize,
    pub has_next_episode: bool,
    pub has_previous_episode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlayerSnapshot {
    /// Progress as a fraction (0.0-1.0)
    pub fn progress(&self) -> f32 {
        if self.duration_millis == 0 {
            0.0
        } else {
            (self.position_millis as f64 / self.duration_millis as f64) as f32
        }
    }
}

impl fmt::Display for PlayerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = self
            .phase
            .map(|p| p.to_string())
            .unwrap_or_else(|| "Idle".to_string());
        write!(
            f,
            "[{}] {} {}/{} ({:.0}%)",
            phase,
            self.title,
            format_time(self.position_millis),
            format_time(self.duration_millis),
            self.progress() * 100.0
        )?;
        if self.locked {
            write!(f, " 🔒")?;
        }
        if self.fullscreen {
            write!(f, " ⛶")?;
        }
        if let Some(ref err) = self.error {
            write!(f, " error: {}", err)?;
        }
        Ok(())
    }
}

// =============================================================================
// Episode Models
// =============================================================================

/// A playable episode as seen by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    pub locator: String,
}

impl Episode {
    pub fn new(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
        }
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, LocatorKind::classify(&self.locator))
    }
}

/// Per-episode record as the catalog returns it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeLink {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub link_embed: String,
    #[serde(default)]
    pub link_m3u8: String,
}

impl EpisodeLink {
    /// Playable locator, preferring the HLS manifest over the embed page
    pub fn locator(&self) -> Option<&str> {
        [self.link_m3u8.trim(), self.link_embed.trim()]
            .into_iter()
            .find(|link| !link.is_empty())
    }

    /// Convert into an [`Episode`], or `None` when there is nothing to play
    pub fn to_episode(&self) -> Option<Episode> {
        self.locator().map(|loc| Episode::new(&self.name, loc))
    }
}

/// One catalog mirror of a title's episode list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeServer {
    pub server_name: String,
    #[serde(default)]
    pub server_data: Vec<EpisodeLink>,
}

impl EpisodeServer {
    /// Playable episodes in server order (records without a locator are skipped)
    pub fn episodes(&self) -> Vec<Episode> {
        self.server_data
            .iter()
            .filter_map(EpisodeLink::to_episode)
            .collect()
    }
}

impl fmt::Display for EpisodeServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} episodes)",
            self.server_name,
            self.server_data.len()
        )
    }
}

/// Episode list file as exported from the catalog
///
/// Accepts the catalog's movie detail (`{"episodes": [servers]}`), a list of
/// servers, a single server, or a bare list of episode records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EpisodeCatalog {
    Detail { episodes: Vec<EpisodeServer> },
    Servers(Vec<EpisodeServer>),
    Server(EpisodeServer),
    Links(Vec<EpisodeLink>),
}

impl EpisodeCatalog {
    /// Normalise into a list of servers
    pub fn into_servers(self) -> Vec<EpisodeServer> {
        match self {
            EpisodeCatalog::Detail { episodes } => episodes,
            EpisodeCatalog::Servers(servers) => servers,
            EpisodeCatalog::Server(server) => vec![server],
            EpisodeCatalog::Links(links) => vec![EpisodeServer {
                server_name: "Default".to_string(),
                server_data: links,
            }],
        }
    }
}

/// What kind of resource a locator points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
    /// HLS streaming manifest (.m3u8)
    Hls,
    /// Direct media file
    File,
    /// Web page embedding a player (not directly decodable)
    Embed,
    /// Not a recognizable locator
    Unknown,
}

impl LocatorKind {
    /// Classify a locator string
    pub fn classify(locator: &str) -> Self {
        static HLS: OnceLock<Option<regex::Regex>> = OnceLock::new();
        static FILE: OnceLock<Option<regex::Regex>> = OnceLock::new();
        static URL: OnceLock<Option<regex::Regex>> = OnceLock::new();

        fn matches(cell: &OnceLock<Option<regex::Regex>>, pattern: &str, s: &str) -> bool {
            cell.get_or_init(|| regex::Regex::new(pattern).ok())
                .as_ref()
                .is_some_and(|re| re.is_match(s))
        }

        let locator = locator.trim();
        if matches(&HLS, r"(?i)\.m3u8(?:[?#].*)?$", locator) {
            LocatorKind::Hls
        } else if matches(
            &FILE,
            r"(?i)\.(?:mp4|m4v|mkv|webm|mov|avi|ts)(?:[?#].*)?$",
            locator,
        ) {
            LocatorKind::File
        } else if matches(&URL, r"(?i)^https?://[^\s/]+", locator) {
            LocatorKind::Embed
        } else {
            LocatorKind::Unknown
        }
    }

    /// Whether a decoder can open this kind directly
    pub fn is_playable(&self) -> bool {
        matches!(self, LocatorKind::Hls | LocatorKind::File)
    }
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorKind::Hls => write!(f, "HLS"),
            LocatorKind::File => write!(f, "file"),
            LocatorKind::Embed => write!(f, "embed"),
            LocatorKind::Unknown => write!(f, "???"),
        }
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Format milliseconds as M:SS (minutes are not wrapped into hours)
pub fn format_time(millis: u64) -> String {
    let total_seconds = millis / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Title shown above the player: "Movie - Episode" when an episode is known
pub fn display_title(movie_title: &str, episode_name: Option<&str>) -> String {
    match episode_name.filter(|name| !name.is_empty()) {
        Some(name) if movie_title.is_empty() => name.to_string(),
        Some(name) => format!("{} - {}", movie_title, name),
        None => movie_title.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // StatusReport Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_status_report_camel_case_serde() {
        let json = r#"{"loaded":true,"isPlaying":true,"positionMillis":0,"durationMillis":600000}"#;
        let report: StatusReport = serde_json::from_str(json).unwrap();
        assert_eq!(report, StatusReport::loaded(true, 0, 600_000));
        assert!(!report.did_just_finish);
    }

    #[test]
    fn test_status_report_failed() {
        let report = StatusReport::failed("boom");
        assert!(!report.loaded);
        assert_eq!(report.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_status_report_finished() {
        let report = StatusReport::finished(5_000);
        assert!(report.loaded);
        assert!(!report.is_playing);
        assert!(report.did_just_finish);
        assert_eq!(report.position_millis, 5_000);
    }

    // -------------------------------------------------------------------------
    // Episode Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_episode_link_prefers_m3u8() {
        let link = EpisodeLink {
            name: "Tập 1".into(),
            slug: "tap-1".into(),
            link_embed: "https://player.example/share/abc".into(),
            link_m3u8: "https://cdn.example/abc/index.m3u8".into(),
        };
        assert_eq!(link.locator(), Some("https://cdn.example/abc/index.m3u8"));
    }

    #[test]
    fn test_episode_link_falls_back_to_embed() {
        let link = EpisodeLink {
            name: "Tập 2".into(),
            link_embed: "https://player.example/share/def".into(),
            link_m3u8: "  ".into(),
            ..Default::default()
        };
        assert_eq!(link.locator(), Some("https://player.example/share/def"));
    }

    #[test]
    fn test_episode_server_skips_unplayable() {
        let server: EpisodeServer = serde_json::from_str(
            r#"{
                "server_name": "Vietsub #1",
                "server_data": [
                    {"name": "1", "slug": "1", "link_embed": "", "link_m3u8": "https://a/1.m3u8"},
                    {"name": "2", "slug": "2", "link_embed": "", "link_m3u8": ""},
                    {"name": "3", "slug": "3", "link_embed": "https://a/e/3", "link_m3u8": ""}
                ]
            }"#,
        )
        .unwrap();

        let episodes = server.episodes();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0], Episode::new("1", "https://a/1.m3u8"));
        assert_eq!(episodes[1], Episode::new("3", "https://a/e/3"));
        assert_eq!(server.to_string(), "Vietsub #1 (3 episodes)");
    }

    #[test]
    fn test_episode_catalog_shapes() {
        let detail: EpisodeCatalog = serde_json::from_str(
            r#"{"episodes": [{"server_name": "A", "server_data": []}, {"server_name": "B"}]}"#,
        )
        .unwrap();
        let servers = detail.into_servers();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].server_name, "B");

        let single: EpisodeCatalog =
            serde_json::from_str(r#"{"server_name": "Only", "server_data": []}"#).unwrap();
        assert_eq!(single.into_servers()[0].server_name, "Only");

        let links: EpisodeCatalog = serde_json::from_str(
            r#"[{"name": "1", "link_m3u8": "https://a/1.m3u8"}]"#,
        )
        .unwrap();
        let servers = links.into_servers();
        assert_eq!(servers[0].server_name, "Default");
        assert_eq!(servers[0].episodes()[0].locator, "https://a/1.m3u8");
    }

    // -------------------------------------------------------------------------
    // LocatorKind Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_locator_kind_classify() {
        assert_eq!(
            LocatorKind::classify("https://cdn.example/v/index.m3u8"),
            LocatorKind::Hls
        );
        assert_eq!(
            LocatorKind::classify("https://cdn.example/v/index.M3U8?token=1"),
            LocatorKind::Hls
        );
        assert_eq!(LocatorKind::classify("/tmp/movie.mp4"), LocatorKind::File);
        assert_eq!(
            LocatorKind::classify("https://player.example/share/abc"),
            LocatorKind::Embed
        );
        assert_eq!(LocatorKind::classify("not a locator"), LocatorKind::Unknown);
        assert_eq!(LocatorKind::classify(""), LocatorKind::Unknown);
    }

    #[test]
    fn test_locator_kind_playable() {
        assert!(LocatorKind::Hls.is_playable());
        assert!(LocatorKind::File.is_playable());
        assert!(!LocatorKind::Embed.is_playable());
        assert!(!LocatorKind::Unknown.is_playable());
    }

    // -------------------------------------------------------------------------
    // Utility Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(9_999), "0:09");
        assert_eq!(format_time(65_000), "1:05");
        assert_eq!(format_time(600_000), "10:00");
        assert_eq!(format_time(5_700_000), "95:00");
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("Movie", Some("Tập 3")), "Movie - Tập 3");
        assert_eq!(display_title("Movie", None), "Movie");
        assert_eq!(display_title("Movie", Some("")), "Movie");
        assert_eq!(display_title("", Some("Tập 3")), "Tập 3");
    }

    #[test]
    fn test_snapshot_progress() {
        let snapshot = PlayerSnapshot {
            session_id: None,
            locator: None,
            title: String::new(),
            phase: None,
            position_millis: 150_000,
            duration_millis: 600_000,
            is_playing: false,
            is_loading: false,
            is_seek_in_progress: false,
            finished: false,
            controls_visible: true,
            locked: false,
            fullscreen: false,
            episode_index: None,
            episode_count: 0,
            has_next_episode: false,
            has_previous_episode: false,
            error: None,
        };
        assert!((snapshot.progress() - 0.25).abs() < f32::EPSILON);
        assert_eq!(snapshot.to_string(), "[Idle]  2:30/10:00 (25%)");
    }
}
