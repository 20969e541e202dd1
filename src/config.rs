use chrono::NaiveTime;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{BookingPolicy, SearchLimits};
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub selection: SelectionSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub booking: BookingSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionSettings {
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_near_k")]
    pub near_k: usize,
    #[serde(default = "default_search_cap")]
    pub search_cap: usize,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            max_results: default_max_results(),
            near_k: default_near_k(),
            search_cap: default_search_cap(),
        }
    }
}

impl SelectionSettings {
    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            default_k: self.default_k,
            default_max_results: self.max_results,
            near_k: self.near_k,
            search_cap: self.search_cap,
        }
    }
}

fn default_k() -> usize { 5 }
fn default_max_results() -> usize { 5 }
fn default_near_k() -> usize { 10 }
fn default_search_cap() -> usize { 100 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_distance_weight")]
    pub distance: f64,
    #[serde(default = "default_load_weight")]
    pub load: f64,
    #[serde(default = "default_rating_weight")]
    pub rating: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            distance: default_distance_weight(),
            load: default_load_weight(),
            rating: default_rating_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            distance: config.distance,
            load: config.load,
            rating: config.rating,
        }
    }
}

fn default_distance_weight() -> f64 { 0.55 }
fn default_load_weight() -> f64 { 0.35 }
fn default_rating_weight() -> f64 { 0.10 }

#[derive(Debug, Clone, Deserialize)]
pub struct BookingSettings {
    /// Local time of day, "HH:MM"
    #[serde(default = "default_opening")]
    pub opening: String,
    /// Local time of day, "HH:MM"; the last slot must end by then
    #[serde(default = "default_closing")]
    pub closing: String,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            opening: default_opening(),
            closing: default_closing(),
            slot_minutes: default_slot_minutes(),
            horizon_days: default_horizon_days(),
        }
    }
}

impl BookingSettings {
    pub fn policy(&self) -> Result<BookingPolicy, ConfigError> {
        let policy = BookingPolicy {
            opening: parse_time_of_day("booking.opening", &self.opening)?,
            closing: parse_time_of_day("booking.closing", &self.closing)?,
            slot_minutes: self.slot_minutes,
            horizon_days: self.horizon_days,
        };

        if policy.horizon_days == 0 || policy.slots().is_empty() {
            return Err(ConfigError::Message(format!(
                "booking must allow at least one {} minute slot between {} and {} on at least one day",
                self.slot_minutes, self.opening, self.closing
            )));
        }

        Ok(policy)
    }
}

fn default_opening() -> String { "09:00".to_string() }
fn default_closing() -> String { "18:00".to_string() }
fn default_slot_minutes() -> u32 { 30 }
fn default_horizon_days() -> u32 { 14 }

fn parse_time_of_day(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ConfigError::Message(format!("{} '{}' is not a valid HH:MM time", key, value)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierSettings {
    /// Local time of day, "HH:MM"
    #[serde(default = "default_trigger_time")]
    pub trigger_time: String,
    /// Reminders are only logged when unset
    pub webhook_url: Option<String>,
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            trigger_time: default_trigger_time(),
            webhook_url: None,
            timeout_secs: default_webhook_timeout(),
        }
    }
}

impl NotifierSettings {
    pub fn trigger_at(&self) -> Result<NaiveTime, ConfigError> {
        parse_time_of_day("notifier.trigger_time", &self.trigger_time)
    }
}

fn default_trigger_time() -> String { "08:00".to_string() }
fn default_webhook_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_map_ttl")]
    pub map_ttl_secs: u64,
    #[serde(default = "default_map_cache_size")]
    pub map_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            map_ttl_secs: default_map_ttl(),
            map_cache_size: default_map_cache_size(),
        }
    }
}

fn default_map_ttl() -> u64 { 60 }
fn default_map_cache_size() -> u64 { 1000 }

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(ConfigError::Message(format!(
                "log format '{}' must be one of json, pretty, compact",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive; RUST_LOG takes precedence when set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingSettings {
    /// Apply LOG_LEVEL / LOG_FORMAT style overrides on top of the file values
    pub fn with_overrides(mut self, level: Option<String>, format: Option<String>) -> Result<Self, ConfigError> {
        if let Some(level) = level.filter(|l| !l.trim().is_empty()) {
            self.level = level;
        }
        if let Some(format) = format.filter(|f| !f.trim().is_empty()) {
            self.format = format.trim().parse()?;
        }
        Ok(self)
    }
}

fn default_log_level() -> String { "info".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with BRANCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., BRANCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("BRANCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        let mut settings: Self = settings.try_deserialize()?;
        settings.logging = settings
            .logging
            .with_overrides(std::env::var("LOG_LEVEL").ok(), std::env::var("LOG_FORMAT").ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("BRANCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.notifier.trigger_at()?;
        self.booking.policy()?;

        let selection = &self.selection;
        if selection.search_cap == 0 || selection.max_results > selection.search_cap {
            return Err(ConfigError::Message(format!(
                "selection.max_results ({}) must be between 1 and selection.search_cap ({})",
                selection.max_results, selection.search_cap
            )));
        }

        let weights = &self.scoring.weights;
        if [weights.distance, weights.load, weights.rating]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(ConfigError::Message("scoring weights must be non-negative".to_string()));
        }

        Ok(())
    }
}

/// Let the conventional DATABASE_URL variable override database.url
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(database_url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", database_url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_from(toml: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [database]
        url = "postgres://localhost/branch_locator"
    "#;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.distance, 0.55);
        assert_eq!(weights.load, 0.35);
        assert_eq!(weights.rating, 0.10);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Json);
    }

    #[test]
    fn test_logging_format_from_file() {
        let toml = format!("{}\n[logging]\nlevel = \"debug\"\nformat = \"pretty\"\n", MINIMAL);
        let settings = settings_from(&toml).unwrap();

        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Pretty);

        let toml = format!("{}\n[logging]\nformat = \"xml\"\n", MINIMAL);
        assert!(settings_from(&toml).is_err());
    }

    #[test]
    fn test_logging_env_overrides() {
        let logging = LoggingSettings::default()
            .with_overrides(Some("warn".to_string()), Some("Compact".to_string()))
            .unwrap();
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.format, LogFormat::Compact);

        let logging = LoggingSettings::default().with_overrides(None, Some(" ".to_string())).unwrap();
        assert_eq!(logging.format, LogFormat::Json);

        assert!(LoggingSettings::default()
            .with_overrides(None, Some("yaml".to_string()))
            .is_err());
    }

    #[test]
    fn test_booking_policy_from_settings() {
        let settings = settings_from(MINIMAL).unwrap();
        assert_eq!(settings.booking.policy().unwrap(), BookingPolicy::default());

        let toml = format!(
            "{}\n[booking]\nopening = \"10:00\"\nclosing = \"12:00\"\nslot_minutes = 60\nhorizon_days = 7\n",
            MINIMAL
        );
        let policy = settings_from(&toml).unwrap().booking.policy().unwrap();
        assert_eq!(policy.slots().len(), 2);
        assert_eq!(policy.horizon_days, 7);
    }

    #[test]
    fn test_booking_without_slots_rejected() {
        let toml = format!("{}\n[booking]\nopening = \"18:00\"\nclosing = \"09:00\"\n", MINIMAL);
        assert!(settings_from(&toml).is_err());

        let toml = format!("{}\n[booking]\nslot_minutes = 0\n", MINIMAL);
        assert!(settings_from(&toml).is_err());
    }

    #[test]
    fn test_minimal_settings_fill_defaults() {
        let settings = settings_from(MINIMAL).unwrap();

        assert_eq!(settings.selection.search_cap, 100);
        assert_eq!(settings.selection.limits().default_k, 5);
        assert_eq!(settings.notifier.trigger_at().unwrap(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert!(settings.notifier.webhook_url.is_none());
        assert_eq!(settings.cache.map_ttl_secs, 60);
    }

    #[test]
    fn test_invalid_trigger_time_rejected() {
        let toml = format!("{}\n[notifier]\ntrigger_time = \"25:99\"\n", MINIMAL);
        assert!(settings_from(&toml).is_err());
    }

    #[test]
    fn test_max_results_above_cap_rejected() {
        let toml = format!("{}\n[selection]\nmax_results = 20\nsearch_cap = 10\n", MINIMAL);
        assert!(settings_from(&toml).is_err());
    }
}
