//! End-to-end orchestration: one scheduler run from configuration to an
//! (optionally dry-run) device update.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, info, warn};

use crate::api::StateData;
use crate::client::VendorClient;
use crate::config::Config;
use crate::events::{feed, seen, seen::SeenEvents, PeakEvent};
use crate::models::{weekday_name, WeeklyProgram, DEVICE_DAY_ORDER};
use crate::scheduler;

/// Options from the command line.
#[derive(Debug, Default)]
pub struct Options {
    /// Config file location; the default locations are searched when unset.
    pub config: Option<PathBuf>,
    /// Peak-event cache location, overriding config and default.
    pub events_cache: Option<PathBuf>,
    /// Compute and report, but change nothing on the device.
    pub dry_run: bool,
}

/// Run the scheduler once: fetch events, assemble the program for now, diff
/// it against the device, and upload when they differ.
pub async fn run(options: Options) -> Result<()> {
    let config = match &options.config {
        Some(path) => Config::from_file(path),
        None => Config::from_default_location(),
    }
    .context("failed to read config")?;

    let cache_path = options
        .events_cache
        .clone()
        .unwrap_or_else(|| config.feed.cache_path());
    let events = feed::peak_events(&config.feed.url, &cache_path, config.feed.cache_ttl)
        .await
        .context("failed to get peak events")?;

    let now = Local::now().fixed_offset();
    announce_upcoming(&events, now);

    // Based on the config and the list of peak events, assemble a program
    // for the current week.
    let program = scheduler::assemble_program(&config, now, &events);
    let new_state = program.to_state_data();

    let mut client = VendorClient::new()?;
    client
        .login(&config.username, &config.password)
        .await
        .context("login failed")?;

    let devices = client
        .devices()
        .await
        .context("failed to get list of devices")?;
    let Some(device) = devices.first() else {
        bail!("expected one device, found none");
    };
    if devices.len() > 1 {
        warn!(
            "expected exactly one device, found {}; using {}",
            devices.len(),
            device.uuid
        );
    }

    if device.state_data == new_state {
        debug!("no changes required to the thermostat program");
        return Ok(());
    }

    info!(
        "the thermostat program differs from the one that was computed:\n{}",
        state_diff(&device.state_data, &new_state)
    );

    if options.dry_run {
        info!("dry-run; exiting early without any modifications");
        return Ok(());
    }

    client
        .set_device_attributes(&device.uuid, &new_state)
        .await
        .context("failed to update device schedule")?;
    info!("updated the program on device {}", device.uuid);
    Ok(())
}

/// Log upcoming events the operator has not been told about yet.
fn announce_upcoming(events: &[PeakEvent], now: DateTime<FixedOffset>) {
    let mut store = SeenEvents::from_path(&seen::default_path())
        .map_err(|err| warn!("failed to load seen-event store: {err}"))
        .ok();

    for event in events.iter().filter(|e| e.start > now) {
        if store.as_ref().is_some_and(|s| s.contains(event)) {
            continue;
        }
        info!("upcoming peak event: {event}");
        if let Some(store) = store.as_mut() {
            if let Err(err) = store.record(event) {
                warn!("failed to record seen event: {err}");
            }
        }
    }
}

/// Human-readable per-slot diff between the device's schedule and the
/// computed one. Falls back to raw program strings when the device data
/// does not decode.
fn state_diff(current: &StateData, next: &StateData) -> String {
    match (
        WeeklyProgram::from_state_data(current),
        WeeklyProgram::from_state_data(next),
    ) {
        (Ok(current), Ok(next)) => program_diff(&current, &next),
        _ => raw_diff(current, next),
    }
}

fn program_diff(current: &WeeklyProgram, next: &WeeklyProgram) -> String {
    let mut out = String::new();
    for weekday in DEVICE_DAY_ORDER {
        let slots = current.on(weekday).slots();
        for ((name, cur), (_, new)) in slots.into_iter().zip(next.on(weekday).slots()) {
            if cur != new {
                out.push_str(&format!(
                    "  {} {}: {} -> {}\n",
                    weekday_name(weekday),
                    name,
                    cur,
                    new
                ));
            }
        }
    }
    out
}

fn raw_diff(current: &StateData, next: &StateData) -> String {
    let mut out = String::new();
    for weekday in DEVICE_DAY_ORDER {
        let (cur, new) = (current.program(weekday), next.program(weekday));
        if cur != new {
            out.push_str(&format!(
                "  {}: {} -> {}\n",
                weekday_name(weekday),
                cur,
                new
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyProgram, DaySlot};
    use chrono::{Duration, Weekday};

    fn baseline_week() -> WeeklyProgram {
        let slot = |h: i64, heat: i16, cool: i16| DaySlot {
            time: Duration::hours(h),
            heat,
            cool,
        };
        let day = DailyProgram {
            morning: slot(7, 21, 24),
            day: slot(9, 20, 24),
            evening: slot(16, 21, 24),
            night: slot(21, 20, 25),
        };
        WeeklyProgram::from_days([day; 7])
    }

    #[test]
    fn test_state_diff_names_changed_slots_only() {
        let current = baseline_week();
        let mut next = current.clone();
        next.on_mut(Weekday::Wed).day = DaySlot {
            time: Duration::hours(5) + Duration::minutes(58),
            heat: 18,
            cool: 24,
        };

        let diff = state_diff(&current.to_state_data(), &next.to_state_data());
        assert!(diff.contains("wednesday day: 09:00 20/24 -> 05:58 18/24"));
        assert!(!diff.contains("monday"));
        assert!(!diff.contains("wednesday morning"));
    }

    #[test]
    fn test_state_diff_falls_back_to_raw_strings() {
        let next = baseline_week().to_state_data();
        let mut current = next.clone();
        current.friday = "garbage".to_string();

        let diff = state_diff(&current, &next);
        assert!(diff.contains("friday: garbage ->"));
        assert!(!diff.contains("monday"));
    }

    #[test]
    fn test_state_diff_empty_for_equal_programs() {
        let state = baseline_week().to_state_data();
        assert!(state_diff(&state, &state).is_empty());
    }
}
