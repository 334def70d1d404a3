//! Configuration module
//!
//! Loads benchmark configuration from environment variables, with CLI flags
//! taking precedence.

use std::env;
use std::path::PathBuf;

const DEFAULT_RESTORE_TARGETS: [i64; 6] = [0, 10, 100, 1000, 5000, 10000];

/// Benchmark configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Timed sessions per mode
    pub sessions: u64,

    /// Untimed sessions persisted before measuring
    pub warmup: u64,

    /// Snapshot every N-th event (0 disables snapshots)
    pub snapshot_every: u64,

    /// Directory receiving database files and reports
    pub out_dir: PathBuf,

    /// Workload seed
    pub seed: i64,

    /// Sequence numbers to restore after writing
    pub restore_targets: Vec<i64>,

    /// Maximum connections per database handle
    pub database_max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sessions: 10_000,
            warmup: 200,
            snapshot_every: 100,
            out_dir: PathBuf::from("out/profile_bench"),
            seed: 54321,
            restore_targets: DEFAULT_RESTORE_TARGETS.to_vec(),
            database_max_connections: 1,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            sessions: parse_env("BENCH_SESSIONS", defaults.sessions)?,
            warmup: parse_env("BENCH_WARMUP", defaults.warmup)?,
            snapshot_every: parse_env("BENCH_SNAPSHOT_EVERY", defaults.snapshot_every)?,
            out_dir: env::var("BENCH_OUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.out_dir),
            seed: parse_env("BENCH_SEED", defaults.seed)?,
            restore_targets: match env::var("BENCH_RESTORE_TARGETS") {
                Ok(raw) => parse_targets(&raw, "BENCH_RESTORE_TARGETS")?,
                Err(_) => defaults.restore_targets,
            },
            database_max_connections: parse_env(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
        })
    }

    /// Apply command line overrides (`--sessions 500 --outdir out ...`)
    pub fn with_args<I, S>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let mut iter = args.iter();

        while let Some(flag) = iter.next() {
            let name: &'static str = match flag.as_str() {
                "--sessions" => "--sessions",
                "--warmup" => "--warmup",
                "--snapshot-every" => "--snapshot-every",
                "--outdir" => "--outdir",
                "--seed" => "--seed",
                "--restore-targets" => "--restore-targets",
                other => {
                    tracing::warn!("Ignoring unknown argument: {}", other);
                    continue;
                }
            };
            let value = iter.next().ok_or(ConfigError::MissingValue(name))?;

            match name {
                "--sessions" => self.sessions = parse_value(value, name)?,
                "--warmup" => self.warmup = parse_value(value, name)?,
                "--snapshot-every" => self.snapshot_every = parse_value(value, name)?,
                "--outdir" => self.out_dir = PathBuf::from(value),
                "--seed" => self.seed = parse_value(value, name)?,
                _ => self.restore_targets = parse_targets(value, name)?,
            }
        }

        Ok(self)
    }

    /// Total events written per mode
    pub fn total_events(&self) -> u64 {
        self.warmup + self.sessions
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(&raw, name),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(raw: &str, name: &'static str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name))
}

fn parse_targets(raw: &str, name: &'static str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_value(part, name))
        .collect()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),

    #[error("Missing value for argument: {0}")]
    MissingValue(&'static str),
}
