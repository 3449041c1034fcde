use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Matchmaking thresholds and timers, recognized by the Matchmaker state
/// machine and the Match Assembler. Defaults land inside the ranges the
/// original tuning notes suggest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub players_per_match: usize,
    pub match_length_seconds: u64,
    pub between_match_seconds: u64,
    pub play_again_percent: f64,

    pub ideal_time: u32,
    pub expand_time: u32,
    pub warm_body_time: u32,

    pub ideal_cost_threshold: f32,
    pub ideal_cost_spread: f32,
    pub expand_cost_threshold: f32,
    pub warm_body_cost_threshold: f32,

    pub sample_days: u32,
    pub speed_of_light_factor: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            players_per_match: 4,
            match_length_seconds: 600,
            between_match_seconds: 30,
            play_again_percent: 80.0,

            ideal_time: 10,
            expand_time: 20,
            warm_body_time: 30,

            ideal_cost_threshold: 50.0,
            ideal_cost_spread: 10.0,
            expand_cost_threshold: 100.0,
            warm_body_cost_threshold: 250.0,

            sample_days: 1,
            speed_of_light_factor: 2.0,
        }
    }
}

/// Process-wide configuration: matching thresholds plus the paths and
/// network settings the ambient I/O and HTTP layers need. Populated from
/// CLI flags (see [`Cli`]) with [`MatchingConfig::default`] filling in any
/// threshold the operator didn't override.
#[derive(Clone, Debug)]
pub struct Config {
    pub matching: MatchingConfig,

    pub datacenters_csv: PathBuf,
    pub players_csv: PathBuf,
    pub latency_dir: PathBuf,

    pub matches_csv: Option<PathBuf>,
    pub stats_csv: Option<PathBuf>,

    pub http_bind: String,
    pub static_dir: PathBuf,

    pub ticks: u64,
    pub rng_seed: u64,
}

/// Geographic matchmaking simulator.
#[derive(Parser, Debug)]
#[command(name = "geomatch_sim", version, about)]
pub struct Cli {
    /// Path to datacenters.csv (<id>,<city>,<lat>,<long>)
    #[arg(long, env = "GEOMATCH_DATACENTERS", default_value = "data/datacenters.csv")]
    pub datacenters_csv: PathBuf,

    /// Path to players.csv (HH:MM:SS,<lat>,<long>)
    #[arg(long, env = "GEOMATCH_PLAYERS", default_value = "data/players.csv")]
    pub players_csv: PathBuf,

    /// Directory containing latency_<city>.bin grids (optional per city)
    #[arg(long, env = "GEOMATCH_LATENCY_DIR", default_value = "data")]
    pub latency_dir: PathBuf,

    /// Output path for per-match rows; pass an empty string to disable
    #[arg(long, env = "GEOMATCH_MATCHES_CSV", default_value = "matches.csv")]
    pub matches_csv: String,

    /// Output path for per-tick datacenter stats; pass an empty string to disable
    #[arg(long, env = "GEOMATCH_STATS_CSV", default_value = "stats.csv")]
    pub stats_csv: String,

    /// HTTP bind address for the density endpoint and static assets
    #[arg(long, env = "GEOMATCH_HTTP_BIND", default_value = "0.0.0.0:8080")]
    pub http_bind: String,

    /// Directory of static visualization assets (index.html, map.js, styles.css)
    #[arg(long, env = "GEOMATCH_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Number of ticks to run; 0 means run until SIGINT/SIGTERM
    #[arg(long, default_value_t = 0)]
    pub ticks: u64,

    /// Seed for the simulation's deterministic RNG
    #[arg(long, default_value_t = 1)]
    pub rng_seed: u64,

    #[arg(long, default_value_t = 10)]
    pub ideal_time: u32,

    #[arg(long, default_value_t = 20)]
    pub expand_time: u32,

    #[arg(long, default_value_t = 30)]
    pub warm_body_time: u32,

    #[arg(long, default_value_t = 50.0)]
    pub ideal_cost_threshold: f32,

    #[arg(long, default_value_t = 10.0)]
    pub ideal_cost_spread: f32,

    #[arg(long, default_value_t = 100.0)]
    pub expand_cost_threshold: f32,

    #[arg(long, default_value_t = 250.0)]
    pub warm_body_cost_threshold: f32,

    #[arg(long, default_value_t = 4)]
    pub players_per_match: usize,

    #[arg(long, default_value_t = 600)]
    pub match_length_seconds: u64,

    #[arg(long, default_value_t = 30)]
    pub between_match_seconds: u64,

    #[arg(long, default_value_t = 80.0)]
    pub play_again_percent: f64,

    #[arg(long, default_value_t = 1)]
    pub sample_days: u32,

    #[arg(long, default_value_t = 2.0)]
    pub speed_of_light_factor: f64,

    /// Log level passed to tracing's env filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Optional JSON file of matching-threshold overrides, layered on top
    /// of the `--ideal-cost-threshold`-style flags above: any field the
    /// file sets wins over that flag's value (including its default).
    #[arg(long, env = "GEOMATCH_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

/// Partial overlay of [`MatchingConfig`] loaded from an optional JSON
/// config file; every field is optional so the file only needs to name
/// the thresholds it wants to change.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MatchingConfigFile {
    pub players_per_match: Option<usize>,
    pub match_length_seconds: Option<u64>,
    pub between_match_seconds: Option<u64>,
    pub play_again_percent: Option<f64>,
    pub ideal_time: Option<u32>,
    pub expand_time: Option<u32>,
    pub warm_body_time: Option<u32>,
    pub ideal_cost_threshold: Option<f32>,
    pub ideal_cost_spread: Option<f32>,
    pub expand_cost_threshold: Option<f32>,
    pub warm_body_cost_threshold: Option<f32>,
    pub sample_days: Option<u32>,
    pub speed_of_light_factor: Option<f64>,
}

impl MatchingConfigFile {
    pub fn load(path: &Path) -> Result<Self, crate::error::ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| crate::error::ConfigError::PathUnreadable { path: path.to_path_buf(), source })?;
        serde_json::from_str(&contents)
            .map_err(|source| crate::error::ConfigError::ConfigFileInvalid { path: path.to_path_buf(), source })
    }

    /// Layer this file's present fields over `base`.
    pub fn apply_over(&self, base: &mut MatchingConfig) {
        macro_rules! layer {
            ($field:ident) => {
                if let Some(v) = self.$field {
                    base.$field = v;
                }
            };
        }
        layer!(players_per_match);
        layer!(match_length_seconds);
        layer!(between_match_seconds);
        layer!(play_again_percent);
        layer!(ideal_time);
        layer!(expand_time);
        layer!(warm_body_time);
        layer!(ideal_cost_threshold);
        layer!(ideal_cost_spread);
        layer!(expand_cost_threshold);
        layer!(warm_body_cost_threshold);
        layer!(sample_days);
        layer!(speed_of_light_factor);
    }
}

impl Config {
    /// Build the process configuration from parsed CLI flags, layering an
    /// optional `--config-file` JSON overlay over the flag-derived
    /// matching thresholds. Fails only if `--config-file` was given and
    /// could not be read or parsed.
    pub fn try_from_cli(cli: Cli) -> Result<Self, crate::error::ConfigError> {
        let mut matching = MatchingConfig {
            players_per_match: cli.players_per_match,
            match_length_seconds: cli.match_length_seconds,
            between_match_seconds: cli.between_match_seconds,
            play_again_percent: cli.play_again_percent,
            ideal_time: cli.ideal_time,
            expand_time: cli.expand_time,
            warm_body_time: cli.warm_body_time,
            ideal_cost_threshold: cli.ideal_cost_threshold,
            ideal_cost_spread: cli.ideal_cost_spread,
            expand_cost_threshold: cli.expand_cost_threshold,
            warm_body_cost_threshold: cli.warm_body_cost_threshold,
            sample_days: cli.sample_days,
            speed_of_light_factor: cli.speed_of_light_factor,
            ..MatchingConfig::default()
        };

        if let Some(path) = &cli.config_file {
            let overlay = MatchingConfigFile::load(path)?;
            overlay.apply_over(&mut matching);
            tracing::info!(path = %path.display(), "applied matching-config overlay");
        }

        Ok(Config {
            matching,
            datacenters_csv: cli.datacenters_csv,
            players_csv: cli.players_csv,
            latency_dir: cli.latency_dir,
            matches_csv: non_empty_path(cli.matches_csv),
            stats_csv: non_empty_path(cli.stats_csv),
            http_bind: cli.http_bind,
            static_dir: cli.static_dir,
            ticks: cli.ticks,
            rng_seed: cli.rng_seed,
        })
    }
}

fn non_empty_path(s: String) -> Option<PathBuf> {
    if s.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_ranges() {
        let cfg = MatchingConfig::default();
        assert_eq!(cfg.players_per_match, 4);
        assert!(cfg.ideal_cost_threshold >= 25.0 && cfg.ideal_cost_threshold <= 50.0);
        assert!(cfg.expand_cost_threshold >= cfg.ideal_cost_threshold);
        assert!(cfg.warm_body_cost_threshold >= cfg.expand_cost_threshold);
    }

    #[test]
    fn cli_flags_for_every_matching_threshold_are_applied() {
        let cli = Cli::try_parse_from([
            "geomatch_sim",
            "--ideal-time",
            "5",
            "--expand-time",
            "6",
            "--warm-body-time",
            "7",
            "--speed-of-light-factor",
            "3.0",
        ])
        .unwrap();
        let config = Config::try_from_cli(cli).unwrap();
        assert_eq!(config.matching.ideal_time, 5);
        assert_eq!(config.matching.expand_time, 6);
        assert_eq!(config.matching.warm_body_time, 7);
        assert_eq!(config.matching.speed_of_light_factor, 3.0);
    }

    #[test]
    fn empty_output_path_disables_sink() {
        assert_eq!(non_empty_path(String::new()), None);
        assert_eq!(non_empty_path("  ".to_string()), None);
        assert_eq!(non_empty_path("matches.csv".to_string()), Some(PathBuf::from("matches.csv")));
    }

    #[test]
    fn config_file_overlay_wins_over_flag_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, r#"{"ideal_cost_threshold": 99.0, "players_per_match": 2}"#).unwrap();

        let cli = Cli::try_parse_from([
            "geomatch_sim",
            "--config-file",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let config = Config::try_from_cli(cli).unwrap();

        assert_eq!(config.matching.ideal_cost_threshold, 99.0);
        assert_eq!(config.matching.players_per_match, 2);
        // Untouched by the overlay file, still the flag default.
        assert_eq!(config.matching.expand_cost_threshold, 100.0);
    }

    #[test]
    fn unreadable_config_file_is_startup_fatal() {
        let cli = Cli::try_parse_from([
            "geomatch_sim",
            "--config-file",
            "/nonexistent/path/overrides.json",
        ])
        .unwrap();
        let err = Config::try_from_cli(cli).unwrap_err();
        assert!(matches!(err, crate::error::ConfigError::PathUnreadable { .. }));
    }

    #[test]
    fn malformed_config_file_is_startup_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();

        let cli = Cli::try_parse_from([
            "geomatch_sim",
            "--config-file",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let err = Config::try_from_cli(cli).unwrap_err();
        assert!(matches!(err, crate::error::ConfigError::ConfigFileInvalid { .. }));
    }
}
