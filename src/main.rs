//! reelplay - playback controller for streamed movies and series
//!
//! Hosts the controller against a simulated decoder so the playback,
//! auto-hide, lock, fullscreen and episode logic can be driven by hand or
//! by script.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session
//! reelplay play https://cdn.example/movie/index.m3u8 --title "Movie"
//!
//! # Scripted session over a catalog export
//! reelplay play -e show.json --script "wait 5000; ff; next; status; quit" --json
//!
//! # Verbose logging
//! RUST_LOG=reelplay=debug reelplay play movie.mp4
//! ```

use clap::Parser;

use reelplay::cli::{Cli, Command, ExitCode, Output};
use reelplay::commands;
use reelplay::config::Config;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let output = Output::new(&cli);

    let config = match cli.config.as_deref() {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                return output
                    .error(
                        format!("Failed to load config {}: {:#}", path.display(), e),
                        ExitCode::InvalidArgs,
                    )
                    .into()
            }
        },
        None => Config::load(),
    };

    let code = match cli.command {
        Command::Play(cmd) => commands::play_cmd(cmd, &config, &output).await,
        Command::Episodes(cmd) => commands::episodes_cmd(cmd, &output),
        Command::Config(cmd) => commands::config_cmd(cmd, &config, cli.config.as_deref(), &output),
    };
    code.into()
}
