//! TOML configuration loading and validation.
//!
//! The configuration carries the account credentials, the baseline weekly
//! program, and the peak-program policy. Everything downstream assumes the
//! bounds enforced here (sorted slot times, sane temperature and duration
//! ranges), so validation is strict and the rest of the crate performs none.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Weekday};
use serde::Deserialize;
use thiserror::Error;

use crate::events::feed::DEFAULT_FEED_URL;
use crate::models::{parse_clock_time, weekday_name, DailyProgram, DaySlot, WeeklyProgram};

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub feed: FeedConfig,
    /// The normal every-day program.
    pub normal_program: WeeklyProgram,
    /// How to modify the program during peak events.
    pub peak_program: PeakPolicy,
}

/// Where and how often to fetch the peak-event feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub cache_ttl: std::time::Duration,
    pub cache_file: Option<PathBuf>,
}

impl FeedConfig {
    /// The feed cache location: the configured path, or a per-user default.
    pub fn cache_path(&self) -> PathBuf {
        if let Some(path) = &self.cache_file {
            return path.clone();
        }
        match std::env::var_os("HOME") {
            Some(home) => Path::new(&home)
                .join(".cache")
                .join("peaksched")
                .join("peak_events.json"),
            None => PathBuf::from("peak_events.json"),
        }
    }
}

/// Policy for overlaying a peak event onto the normal program.
#[derive(Debug, Clone)]
pub struct PeakPolicy {
    /// How long to pre-heat before a peak event. Careful not to overlap the
    /// previous event with an overly long pre-heat.
    pub pre_heat: Duration,
    /// How long before and after the peak event to keep the peak temperature,
    /// to absorb clock drift between this machine and the thermostat.
    pub peak_buffer: Duration,
    /// Degrees added to the reference heat setpoint while pre-heating.
    pub pre_heat_temp_offset: i16,
    /// Degrees added to the reference heat setpoint during the peak period.
    pub peak_temp_offset: i16,
    /// Hold the peak period's normal temperature before pre-heating starts,
    /// instead of whatever the baseline had there, so pre-heating starts
    /// from a warmer floor.
    pub maintain_normal_temp_before_pre_heat: bool,
}

/// Failure to load or validate the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("no config file found in standard locations")]
    NotFound,
}

impl Config {
    /// Load and validate the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&body)
    }

    /// Parse and validate a configuration document.
    pub fn from_toml_str(body: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(body)?;
        let config = file.into_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from the default locations:
    /// `peaksched.toml` in the working directory, then
    /// `~/.config/peaksched/config.toml`.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let mut candidates = vec![PathBuf::from("peaksched.toml")];
        if let Some(home) = std::env::var_os("HOME") {
            candidates.push(
                Path::new(&home)
                    .join(".config")
                    .join("peaksched")
                    .join("config.toml"),
            );
        }
        for path in candidates {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Err(ConfigError::NotFound)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ConfigError::Invalid(
                "username and password are required".to_string(),
            ));
        }
        reqwest::Url::parse(&self.feed.url)
            .map_err(|err| ConfigError::Invalid(format!("feed url {:?}: {err}", self.feed.url)))?;
        for (weekday, dp) in self.normal_program.iter() {
            validate_daily_program(weekday, dp)?;
        }
        validate_peak_policy(&self.peak_program)
    }
}

fn validate_daily_program(weekday: Weekday, dp: &DailyProgram) -> Result<(), ConfigError> {
    let day = weekday_name(weekday);
    for (name, slot) in dp.slots() {
        validate_day_slot(day, name, &slot)?;
    }

    let mut last = Duration::zero();
    for (name, slot) in dp.slots() {
        if slot.time < last {
            return Err(ConfigError::Invalid(format!(
                "{day} program times aren't in order at {name}"
            )));
        }
        last = slot.time;
    }
    Ok(())
}

fn validate_day_slot(day: &str, name: &str, slot: &DaySlot) -> Result<(), ConfigError> {
    if slot.time < Duration::zero() || slot.time > Duration::hours(24) {
        return Err(ConfigError::Invalid(format!(
            "{day} {name}: time must be between 00:00 and 24:00"
        )));
    }
    if !(0..=50).contains(&slot.heat) {
        return Err(ConfigError::Invalid(format!(
            "{day} {name}: heat must be between 0C and 50C, got {}",
            slot.heat
        )));
    }
    if !(0..=50).contains(&slot.cool) {
        return Err(ConfigError::Invalid(format!(
            "{day} {name}: cool must be between 0C and 50C, got {}",
            slot.cool
        )));
    }
    Ok(())
}

fn validate_peak_policy(policy: &PeakPolicy) -> Result<(), ConfigError> {
    if policy.pre_heat < Duration::zero() || policy.pre_heat > Duration::hours(2) {
        return Err(ConfigError::Invalid(format!(
            "pre-heat duration should be between 0m and 2h, got {}m",
            policy.pre_heat.num_minutes()
        )));
    }
    if policy.peak_buffer < Duration::zero() || policy.peak_buffer > Duration::minutes(10) {
        return Err(ConfigError::Invalid(format!(
            "peak buffer duration should be between 0m and 10m, got {}m",
            policy.peak_buffer.num_minutes()
        )));
    }
    if !(0..=10).contains(&policy.pre_heat_temp_offset) {
        return Err(ConfigError::Invalid(format!(
            "pre-heat temp offset should be between 0C and 10C, got {}",
            policy.pre_heat_temp_offset
        )));
    }
    if !(-10..=0).contains(&policy.peak_temp_offset) {
        return Err(ConfigError::Invalid(format!(
            "peak temp offset should be between -10C and 0C, got {}",
            policy.peak_temp_offset
        )));
    }
    Ok(())
}

// Raw document shape. Domain types are built (and validated) from these.

#[derive(Deserialize)]
struct ConfigFile {
    username: String,
    password: String,
    #[serde(default)]
    feed: FeedTable,
    normal_program: WeekTable,
    #[serde(default)]
    peak_program: PeakTable,
}

#[derive(Deserialize)]
struct FeedTable {
    #[serde(default = "default_feed_url")]
    url: String,
    #[serde(default = "default_cache_ttl_minutes")]
    cache_ttl_minutes: u64,
    #[serde(default)]
    cache_file: Option<PathBuf>,
}

impl Default for FeedTable {
    fn default() -> Self {
        FeedTable {
            url: default_feed_url(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
            cache_file: None,
        }
    }
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_cache_ttl_minutes() -> u64 {
    360
}

#[derive(Deserialize)]
struct WeekTable {
    sunday: DayTable,
    monday: DayTable,
    tuesday: DayTable,
    wednesday: DayTable,
    thursday: DayTable,
    friday: DayTable,
    saturday: DayTable,
}

#[derive(Deserialize)]
struct DayTable {
    morning: SlotEntry,
    day: SlotEntry,
    evening: SlotEntry,
    night: SlotEntry,
}

#[derive(Deserialize)]
struct SlotEntry {
    time: String,
    heat: i16,
    cool: i16,
}

#[derive(Deserialize, Default)]
struct PeakTable {
    #[serde(default)]
    pre_heat_minutes: i64,
    #[serde(default)]
    peak_buffer_minutes: i64,
    #[serde(default)]
    pre_heat_temp_offset: i16,
    #[serde(default)]
    peak_temp_offset: i16,
    #[serde(default)]
    maintain_normal_temp_before_pre_heat: bool,
}

impl ConfigFile {
    fn into_config(self) -> Result<Config, ConfigError> {
        let week = self.normal_program;
        let days = [
            convert_day("sunday", week.sunday)?,
            convert_day("monday", week.monday)?,
            convert_day("tuesday", week.tuesday)?,
            convert_day("wednesday", week.wednesday)?,
            convert_day("thursday", week.thursday)?,
            convert_day("friday", week.friday)?,
            convert_day("saturday", week.saturday)?,
        ];
        Ok(Config {
            username: self.username,
            password: self.password,
            feed: FeedConfig {
                url: self.feed.url,
                cache_ttl: std::time::Duration::from_secs(self.feed.cache_ttl_minutes * 60),
                cache_file: self.feed.cache_file,
            },
            normal_program: WeeklyProgram::from_days(days),
            peak_program: PeakPolicy {
                pre_heat: Duration::minutes(self.peak_program.pre_heat_minutes),
                peak_buffer: Duration::minutes(self.peak_program.peak_buffer_minutes),
                pre_heat_temp_offset: self.peak_program.pre_heat_temp_offset,
                peak_temp_offset: self.peak_program.peak_temp_offset,
                maintain_normal_temp_before_pre_heat: self
                    .peak_program
                    .maintain_normal_temp_before_pre_heat,
            },
        })
    }
}

fn convert_day(day: &str, table: DayTable) -> Result<DailyProgram, ConfigError> {
    Ok(DailyProgram {
        morning: convert_slot(day, "morning", table.morning)?,
        day: convert_slot(day, "day", table.day)?,
        evening: convert_slot(day, "evening", table.evening)?,
        night: convert_slot(day, "night", table.night)?,
    })
}

fn convert_slot(day: &str, name: &str, entry: SlotEntry) -> Result<DaySlot, ConfigError> {
    let time = parse_clock_time(&entry.time).map_err(|err| {
        ConfigError::Invalid(format!("{day} {name}: invalid time {:?}: {err}", entry.time))
    })?;
    Ok(DaySlot {
        time,
        heat: entry.heat,
        cool: entry.cool,
    })
}
