//! Configuration for the feeder binary.
//!
//! Settings come from an optional `fakefeeder.yaml` (path overridable with
//! `FAKEFEEDER_CONFIG`), then environment variables override individual
//! fields. Every field has a default, so the feeder runs with no
//! configuration at all against a local Redis.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "FAKEFEEDER_CONFIG";

/// Configuration file read when present and no override is given.
pub const DEFAULT_CONFIG_PATH: &str = "fakefeeder.yaml";

/// Hosted production targets the feeder refuses to write to.
const PRODUCTION_MARKER: &str = "rediscloud";

/// URL schemes accepted for the store target.
const TARGET_SCHEMES: &[&str] = &[
    "redis://",
    "rediss://",
    "redis-cluster://",
    "redis-sentinel://",
];

/// Feeder process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeederConfig {
    /// Redis URL to write to, credentials included.
    #[serde(default = "default_target")]
    pub target: String,

    /// Updates per second.
    #[serde(default = "default_rate")]
    pub rate: u32,

    /// Choose glyphs in proportion to their snapshot score.
    #[serde(default = "default_weighted")]
    pub weighted: bool,

    /// Log every update at `info` instead of `debug`.
    #[serde(default)]
    pub verbose: bool,

    /// Number of pooled Redis clients.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Ranking snapshot file. The embedded snapshot is used when unset.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Avatar URL stamped on every record. The built-in default when unset.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            rate: default_rate(),
            weighted: default_weighted(),
            verbose: false,
            pool_size: default_pool_size(),
            snapshot_path: None,
            avatar_url: None,
        }
    }
}

impl FeederConfig {
    /// Load configuration from the file (if any) and the process
    /// environment, then validate it.
    ///
    /// Environment overrides:
    /// - `FAKEFEEDER_TARGET` -- Redis URL
    /// - `FAKEFEEDER_RATE` -- updates per second
    /// - `FAKEFEEDER_WEIGHTED` -- weighted selection (`true`/`false`)
    /// - `FAKEFEEDER_VERBOSE` -- per-update logging at `info`
    /// - `FAKEFEEDER_POOL_SIZE` -- pooled client count
    /// - `FAKEFEEDER_SNAPSHOT` -- ranking snapshot path
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] or [`AppError::Yaml`] if an explicitly named
    /// file cannot be read or parsed, and [`AppError::Config`] for invalid
    /// overrides or values that fail validation.
    pub fn load() -> Result<Self, AppError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be read, or
    /// [`AppError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string. Empty input yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, AppError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override fields from `lookup`, which maps a variable name to its
    /// value when set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if a set variable does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FAKEFEEDER_TARGET") {
            self.target = val;
        }
        if let Some(val) = lookup("FAKEFEEDER_RATE") {
            self.rate = val
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("invalid FAKEFEEDER_RATE: {e}")))?;
        }
        if let Some(val) = lookup("FAKEFEEDER_WEIGHTED") {
            self.weighted = parse_flag("FAKEFEEDER_WEIGHTED", &val)?;
        }
        if let Some(val) = lookup("FAKEFEEDER_VERBOSE") {
            self.verbose = parse_flag("FAKEFEEDER_VERBOSE", &val)?;
        }
        if let Some(val) = lookup("FAKEFEEDER_POOL_SIZE") {
            self.pool_size = val
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("invalid FAKEFEEDER_POOL_SIZE: {e}")))?;
        }
        if let Some(val) = lookup("FAKEFEEDER_SNAPSHOT") {
            self.snapshot_path = Some(PathBuf::from(val));
        }
        Ok(())
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] for a zero rate or pool size, a target
    /// that is not a Redis URL, or a production target.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.rate == 0 {
            return Err(AppError::Config(String::from("rate must be at least 1")));
        }
        if self.pool_size == 0 {
            return Err(AppError::Config(String::from(
                "pool size must be at least 1",
            )));
        }
        if !TARGET_SCHEMES
            .iter()
            .any(|scheme| self.target.starts_with(scheme))
        {
            return Err(AppError::Config(format!(
                "target is not a Redis URL: {}",
                redact(&self.target)
            )));
        }
        if self.target.contains(PRODUCTION_MARKER) {
            return Err(AppError::Config(String::from(
                "refusing to write fake data to a production target",
            )));
        }
        Ok(())
    }

    /// Time between scheduled updates: one second divided by the rate.
    pub fn period(&self) -> Duration {
        Duration::from_secs(1)
            .checked_div(self.rate)
            .unwrap_or(Duration::ZERO)
    }

    /// Target with any password masked, for logging.
    pub fn redacted_target(&self) -> String {
        redact(&self.target)
    }
}

/// Parse a boolean flag, accepting `true`/`false`, `1`/`0` and `yes`/`no`.
fn parse_flag(name: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(AppError::Config(format!("invalid {name}: {other}"))),
    }
}

/// Mask the userinfo portion of a URL.
fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_owned();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://***@{host}"),
        None => url.to_owned(),
    }
}

fn default_target() -> String {
    String::from("redis://localhost:6379")
}

const fn default_rate() -> u32 {
    250
}

const fn default_weighted() -> bool {
    true
}

const fn default_pool_size() -> usize {
    3
}
