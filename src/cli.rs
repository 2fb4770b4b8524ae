//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;

/// scrobbled: scrobbling and AutoDJ daemon for media players
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "scrobbled")]
#[command(about = "Scrobbles what your media player plays and keeps the playlist going")]
#[command(version)]
pub struct Cli {
    /// Run in daemon mode (JSON-RPC over stdio)
    #[arg(long)]
    pub daemon: bool,

    /// Replay cached scrobbles once and exit
    #[arg(long, conflicts_with = "daemon")]
    pub drain: bool,

    /// Settings file (flat JSON object); environment variables take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Local catalog file (JSON array of tracks)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Offline cache file
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if running in daemon mode.
    pub fn is_daemon_mode(&self) -> bool {
        self.daemon
    }

    /// Returns true if only the offline cache should be replayed.
    pub fn is_drain_mode(&self) -> bool {
        self.drain
    }

    /// Applies path flags on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(ref path) = self.catalog {
            settings.catalog_path = Some(path.clone());
        }
        if let Some(ref path) = self.cache {
            settings.cache_path = Some(path.clone());
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "scrobbled=debug"
        } else {
            "scrobbled=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_daemon_flags() {
        let cli = Cli::try_parse_from([
            "scrobbled",
            "--daemon",
            "--config",
            "/etc/scrobbled.json",
            "-v",
        ])
        .unwrap();
        assert!(cli.is_daemon_mode());
        assert!(!cli.is_drain_mode());
        assert_eq!(cli.config, Some(PathBuf::from("/etc/scrobbled.json")));
        assert_eq!(cli.log_filter(), "scrobbled=debug");
    }

    #[test]
    fn drain_conflicts_with_daemon() {
        assert!(Cli::try_parse_from(["scrobbled", "--daemon", "--drain"]).is_err());
        let cli = Cli::try_parse_from(["scrobbled", "--drain"]).unwrap();
        assert!(cli.is_drain_mode());
    }

    #[test]
    fn overrides_replace_paths() {
        let cli = Cli {
            catalog: Some(PathBuf::from("/music/catalog.json")),
            ..Default::default()
        };
        let mut settings = Settings {
            cache_path: Some(PathBuf::from("/var/cache.json")),
            ..Default::default()
        };
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.catalog_path, Some(PathBuf::from("/music/catalog.json")));
        assert_eq!(settings.cache_path, Some(PathBuf::from("/var/cache.json")));
        assert_eq!(cli.log_filter(), "scrobbled=info");
    }
}
