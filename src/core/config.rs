//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::DEFAULT_BASE_URL;
use crate::core::errors::{FinsError, Result};
use crate::dashboard::model::{FidelityMode, Section};

/// Full File Insights configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub display: DisplayConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Where the indexing service lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

/// Time zone used when rendering timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneChoice {
    #[default]
    Local,
    Utc,
}

impl FromStr for TimeZoneChoice {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            other => Err(format!("expected \"local\" or \"utc\", got {other:?}")),
        }
    }
}

impl fmt::Display for TimeZoneChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Utc => "utc",
        })
    }
}

/// Presentation knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub time_zone: TimeZoneChoice,
    /// chrono strftime pattern for metadata timestamps.
    pub timestamp_format: String,
    /// Width in columns of the longest analytics bar.
    pub chart_width: usize,
}

/// Initial dashboard state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    pub start_section: Section,
    pub default_fidelity: FidelityMode,
    pub auto_fetch_analytics: bool,
}

/// Diagnostic and activity logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive.
    pub level: String,
    /// JSONL activity log path.
    pub activity_log: PathBuf,
    pub activity_log_enabled: bool,
    /// Diagnostic log file for the interactive dashboard.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

pub const MIN_CHART_WIDTH: usize = 10;
pub const MAX_CHART_WIDTH: usize = 200;

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            request_timeout_ms: 30_000,
            connect_timeout_ms: 5_000,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_zone: TimeZoneChoice::Local,
            timestamp_format: "%-m/%-d/%Y, %-I:%M:%S %p".to_owned(),
            chart_width: 40,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            start_section: Section::Process,
            default_fidelity: FidelityMode::Basic,
            auto_fetch_analytics: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            activity_log: home_dir()
                .join(".local")
                .join("share")
                .join("file-insights")
                .join("activity.jsonl"),
            activity_log_enabled: true,
            log_file: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir()
                .join(".config")
                .join("file-insights")
                .join("config.toml"),
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[FINS-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, env_var)
    }

    /// [`Config::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| FinsError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(FinsError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for diagnostics.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Effective config rendered back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());

        // backend
        if let Some(raw) = get("FILE_INSIGHTS_BASE_URL") {
            self.backend.base_url = raw.trim().to_owned();
        }
        if let Some(raw) = get("FILE_INSIGHTS_REQUEST_TIMEOUT_MS") {
            self.backend.request_timeout_ms = parse_env("FILE_INSIGHTS_REQUEST_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("FILE_INSIGHTS_CONNECT_TIMEOUT_MS") {
            self.backend.connect_timeout_ms = parse_env("FILE_INSIGHTS_CONNECT_TIMEOUT_MS", &raw)?;
        }

        // display
        if let Some(raw) = get("FILE_INSIGHTS_TIME_ZONE") {
            self.display.time_zone = parse_env("FILE_INSIGHTS_TIME_ZONE", &raw)?;
        }
        if let Some(raw) = get("FILE_INSIGHTS_CHART_WIDTH") {
            self.display.chart_width = parse_env("FILE_INSIGHTS_CHART_WIDTH", &raw)?;
        }

        // dashboard
        if let Some(raw) = get("FILE_INSIGHTS_AUTO_FETCH_ANALYTICS") {
            self.dashboard.auto_fetch_analytics =
                parse_env("FILE_INSIGHTS_AUTO_FETCH_ANALYTICS", &raw)?;
        }

        // logging
        if let Some(raw) = get("FILE_INSIGHTS_LOG") {
            self.logging.level = raw.trim().to_owned();
        }
        if let Some(raw) = get("FILE_INSIGHTS_ACTIVITY_LOG") {
            self.logging.activity_log = PathBuf::from(raw.trim());
        }

        Ok(())
    }

    fn normalize(&mut self) {
        let trimmed = self.backend.base_url.trim().trim_end_matches('/');
        self.backend.base_url = trimmed.to_owned();
    }

    /// Check value ranges and formats.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.backend.base_url).map_err(|error| FinsError::InvalidConfig {
            details: format!("backend.base_url {:?}: {error}", self.backend.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FinsError::InvalidConfig {
                details: format!(
                    "backend.base_url must use http or https, got {:?}",
                    url.scheme()
                ),
            });
        }
        if self.backend.request_timeout_ms == 0 {
            return Err(FinsError::InvalidConfig {
                details: "backend.request_timeout_ms must be > 0".to_owned(),
            });
        }
        if self.backend.connect_timeout_ms == 0 {
            return Err(FinsError::InvalidConfig {
                details: "backend.connect_timeout_ms must be > 0".to_owned(),
            });
        }

        if !(MIN_CHART_WIDTH..=MAX_CHART_WIDTH).contains(&self.display.chart_width) {
            return Err(FinsError::InvalidConfig {
                details: format!(
                    "display.chart_width must be in [{MIN_CHART_WIDTH},{MAX_CHART_WIDTH}], got {}",
                    self.display.chart_width
                ),
            });
        }
        validate_timestamp_format(&self.display.timestamp_format)?;

        if self.logging.level.trim().is_empty() {
            return Err(FinsError::InvalidConfig {
                details: "logging.level must not be empty".to_owned(),
            });
        }
        crate::logger::parse_filter(&self.logging.level)?;

        Ok(())
    }
}

/// Rendering with an invalid pattern panics inside chrono, so reject it here.
fn validate_timestamp_format(format: &str) -> Result<()> {
    if format.trim().is_empty() {
        return Err(FinsError::InvalidConfig {
            details: "display.timestamp_format must not be empty".to_owned(),
        });
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(FinsError::InvalidConfig {
            details: format!("display.timestamp_format {format:?} is not a valid strftime pattern"),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| FinsError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

#[cfg(test)]
mod tests {
    use super::{Config, FinsError, TimeZoneChoice};
    use crate::dashboard::model::{FidelityMode, Section};
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.backend.base_url, "http://localhost:8080");
        assert_eq!(cfg.dashboard.start_section, Section::Process);
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = Config::load_with_env(
            Some(Path::new("/nonexistent/file-insights/config.toml")),
            no_env,
        );
        let err = result.unwrap_err();
        assert!(matches!(err, FinsError::MissingConfig { .. }));
        assert_eq!(err.code(), "FINS-1002");
    }

    #[test]
    fn load_reads_toml_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[backend]
base_url = "http://indexer.internal:9000/"
request_timeout_ms = 1500

[display]
time_zone = "utc"
chart_width = 60

[dashboard]
start_section = "find_metadata"
default_fidelity = "advanced"
auto_fetch_analytics = false
"#
        )
        .unwrap();
        let cfg = Config::load_with_env(Some(file.path()), no_env).unwrap();
        assert_eq!(cfg.backend.base_url, "http://indexer.internal:9000");
        assert_eq!(cfg.backend.request_timeout_ms, 1500);
        assert_eq!(cfg.backend.connect_timeout_ms, 5_000);
        assert_eq!(cfg.display.time_zone, TimeZoneChoice::Utc);
        assert_eq!(cfg.display.chart_width, 60);
        assert_eq!(cfg.dashboard.start_section, Section::FindMetadata);
        assert_eq!(cfg.dashboard.default_fidelity, FidelityMode::Advanced);
        assert!(!cfg.dashboard.auto_fetch_analytics);
        assert_eq!(cfg.paths.config_file, file.path());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend\nbase_url = 3").unwrap();
        let err = Config::load_with_env(Some(file.path()), no_env).unwrap_err();
        assert!(matches!(err, FinsError::ConfigParse { .. }));
    }

    #[test]
    fn env_overrides_apply_and_blank_values_are_ignored() {
        let env = vars(&[
            ("FILE_INSIGHTS_BASE_URL", "https://files.example.com"),
            ("FILE_INSIGHTS_REQUEST_TIMEOUT_MS", "2500"),
            ("FILE_INSIGHTS_TIME_ZONE", "UTC"),
            ("FILE_INSIGHTS_CHART_WIDTH", "  "),
            ("FILE_INSIGHTS_AUTO_FETCH_ANALYTICS", "false"),
            ("FILE_INSIGHTS_LOG", "debug"),
            ("FILE_INSIGHTS_ACTIVITY_LOG", "/var/log/fins.jsonl"),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env_overrides_from(|name| env.get(name).cloned())
            .unwrap();
        assert_eq!(cfg.backend.base_url, "https://files.example.com");
        assert_eq!(cfg.backend.request_timeout_ms, 2500);
        assert_eq!(cfg.display.time_zone, TimeZoneChoice::Utc);
        assert_eq!(cfg.display.chart_width, 40);
        assert!(!cfg.dashboard.auto_fetch_analytics);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(
            cfg.logging.activity_log,
            PathBuf::from("/var/log/fins.jsonl")
        );
    }

    #[test]
    fn env_invalid_number_rejected() {
        let env = vars(&[("FILE_INSIGHTS_CONNECT_TIMEOUT_MS", "soon")]);
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_overrides_from(|name| env.get(name).cloned())
            .unwrap_err();
        assert!(matches!(err, FinsError::ConfigParse { context: "env", .. }));
        assert!(err.to_string().contains("FILE_INSIGHTS_CONNECT_TIMEOUT_MS"));
    }

    #[test]
    fn env_invalid_time_zone_rejected() {
        let env = vars(&[("FILE_INSIGHTS_TIME_ZONE", "mars")]);
        let mut cfg = Config::default();
        assert!(
            cfg.apply_env_overrides_from(|name| env.get(name).cloned())
                .is_err()
        );
    }

    #[test]
    fn non_http_base_url_rejected() {
        let mut cfg = Config::default();
        cfg.backend.base_url = "ftp://localhost:21".to_owned();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));

        cfg.backend.base_url = "not a url".to_owned();
        assert!(matches!(
            cfg.validate(),
            Err(FinsError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let mut cfg = Config::default();
        cfg.backend.request_timeout_ms = 0;
        assert!(cfg.validate().is_err());
        let mut cfg = Config::default();
        cfg.backend.connect_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn chart_width_out_of_range_rejected() {
        let mut cfg = Config::default();
        cfg.display.chart_width = 5;
        assert!(cfg.validate().is_err());
        cfg.display.chart_width = 201;
        assert!(cfg.validate().is_err());
        cfg.display.chart_width = 200;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_timestamp_format_rejected() {
        let mut cfg = Config::default();
        cfg.display.timestamp_format = "%Q %Y".to_owned();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("timestamp_format"));
    }

    #[test]
    fn to_toml_round_trips_through_load() {
        let cfg = Config::default();
        let text = cfg.to_toml().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let loaded = Config::load_with_env(Some(file.path()), no_env).unwrap();
        assert_eq!(loaded.backend, cfg.backend);
        assert_eq!(loaded.display, cfg.display);
        assert_eq!(loaded.dashboard, cfg.dashboard);
    }

    #[test]
    fn stable_hash_deterministic_and_sensitive() {
        let cfg = Config::default();
        let h1 = cfg.stable_hash().expect("hash");
        let h2 = cfg.stable_hash().expect("hash");
        assert_eq!(h1, h2);
        let mut other = cfg;
        other.display.chart_width = 41;
        assert_ne!(h1, other.stable_hash().expect("hash"));
    }
}
