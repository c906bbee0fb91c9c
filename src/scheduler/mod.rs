//! Assembly of the weekly program around peak events.
//!
//! This is the heart of the crate: a pure function from the baseline weekly
//! program, the peak-program policy, the current instant, and the announced
//! peak events to the program that should be on the thermostat right now.
//! It performs no I/O and never touches the caller's baseline.

use chrono::{DateTime, Datelike, Duration, FixedOffset};
use tracing::debug;

use crate::config::Config;
use crate::events::PeakEvent;
use crate::models::{time_of_day, DaySlot, WeeklyProgram};

/// Pick the single event worth reacting to at `now`: the first event (in
/// list order) ending strictly within the next twelve hours.
///
/// Events further out are not yet due for pre-heating and events already
/// ended no longer matter. At most one event is ever overlaid per run; a
/// second event inside the window is deliberately left for a later run, once
/// the first has passed.
pub fn relevant_event<'a>(
    events: &'a [PeakEvent],
    now: DateTime<FixedOffset>,
) -> Option<&'a PeakEvent> {
    let horizon = now + Duration::hours(12);
    events.iter().find(|e| now < e.end && e.end < horizon)
}

/// Assemble the weekly program for `now`, overlaying the relevant peak event
/// (if any) onto the configured normal program.
///
/// For the selected event the day of the event is rebuilt around four
/// transitions: pre-heat (warmer, before the event), peak (cooler, through
/// the event plus a clock-drift buffer on both sides), restore (back to the
/// reference temperature), and whatever the baseline would do next. The
/// previous day's night slot is rewritten as well, so that a pre-heat
/// reaching back across midnight ramps from the right temperature.
///
/// All temperatures are relative to the baseline slot in effect just before
/// the buffered end of the event. Slot times are written as computed, without
/// re-sorting: for policy values within the configured bounds the four
/// transitions naturally land in slot order.
pub fn assemble_program(
    config: &Config,
    now: DateTime<FixedOffset>,
    events: &[PeakEvent],
) -> WeeklyProgram {
    let mut wp = config.normal_program.clone();
    let policy = &config.peak_program;

    let Some(event) = relevant_event(events, now) else {
        return wp;
    };
    debug!("found relevant peak event: {event}");

    let start_of_day = time_of_day(&event.start);
    let end_of_day = time_of_day(&event.end);
    let start_weekday = event.start.weekday();
    let end_weekday = event.end.weekday();

    // The regime in effect before pre-heating starts. With
    // maintain_normal_temp_before_pre_heat the peak period's own baseline
    // temperature is held instead, so pre-heating starts from a warmer floor.
    let before_pre_heat = if policy.maintain_normal_temp_before_pre_heat {
        wp.slot_after(start_weekday, start_of_day)
    } else {
        wp.slot_before(start_weekday, start_of_day - policy.pre_heat)
    };

    // The reference point every offset is computed against: the baseline
    // slot in effect just before the buffered end of the peak period.
    let before_end = wp.slot_before(end_weekday, end_of_day + policy.peak_buffer);

    let pre_heat = DaySlot {
        time: start_of_day - policy.pre_heat,
        heat: before_end.heat + policy.pre_heat_temp_offset,
        cool: before_end.cool,
    };
    let peak = DaySlot {
        time: start_of_day - policy.peak_buffer,
        heat: before_end.heat + policy.peak_temp_offset,
        cool: before_end.cool,
    };
    let restore = DaySlot {
        time: end_of_day + policy.peak_buffer,
        heat: before_end.heat,
        cool: before_end.cool,
    };
    let after_peak = wp.slot_after(end_weekday, end_of_day + policy.peak_buffer);

    // Ramp toward pre-heat conditions before midnight.
    let yesterday = wp.on_mut(start_weekday.pred());
    yesterday.night.heat = before_pre_heat.heat;
    yesterday.night.cool = before_pre_heat.cool;

    let today = wp.on_mut(start_weekday);
    today.morning = pre_heat;
    today.day = peak;
    today.evening = restore;
    today.night = after_peak;

    wp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeedConfig, PeakPolicy};
    use crate::events::feed::DEFAULT_FEED_URL;
    use crate::models::DailyProgram;
    use chrono::{TimeZone, Weekday};

    fn slot(time: Duration, heat: i16, cool: i16) -> DaySlot {
        DaySlot { time, heat, cool }
    }

    fn hours(h: i64) -> Duration {
        Duration::hours(h)
    }

    fn baseline_day() -> DailyProgram {
        DailyProgram {
            morning: slot(hours(7), 21, 24),
            day: slot(hours(9), 20, 24),
            evening: slot(hours(16), 21, 24),
            night: slot(hours(21), 20, 25),
        }
    }

    fn test_config() -> Config {
        Config {
            username: "user".to_string(),
            password: "password".to_string(),
            feed: FeedConfig {
                url: DEFAULT_FEED_URL.to_string(),
                cache_ttl: std::time::Duration::from_secs(3600),
                cache_file: None,
            },
            normal_program: WeeklyProgram::from_days([baseline_day(); 7]),
            peak_program: PeakPolicy {
                pre_heat: Duration::hours(1),
                peak_buffer: Duration::minutes(2),
                pre_heat_temp_offset: 2,
                peak_temp_offset: -2,
                maintain_normal_temp_before_pre_heat: false,
            },
        }
    }

    fn est(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        // January 2024; the 24th is a Wednesday.
        chrono::FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, day, hour, minute, 0)
            .unwrap()
    }

    /// Peak events on Wednesday Jan 24: 06:00-09:00 and 16:00-20:00.
    fn wednesday_events() -> Vec<PeakEvent> {
        vec![
            PeakEvent {
                start: est(24, 6, 0),
                end: est(24, 9, 0),
            },
            PeakEvent {
                start: est(24, 16, 0),
                end: est(24, 20, 0),
            },
        ]
    }

    #[test]
    fn test_no_events_returns_baseline() {
        let config = test_config();
        let program = assemble_program(&config, est(24, 4, 0), &[]);
        assert_eq!(program, config.normal_program);
    }

    #[test]
    fn test_relevant_event_window() {
        let events = wednesday_events();

        // Before either event: only the morning event ends within 12h.
        assert_eq!(relevant_event(&events, est(24, 4, 0)), Some(&events[0]));
        // The boundary is exclusive: an event ending exactly 12h out is not
        // yet relevant.
        assert_eq!(relevant_event(&events, est(23, 21, 0)), None);
        // During the first event it is still the one being handled.
        assert_eq!(relevant_event(&events, est(24, 8, 0)), Some(&events[0]));
        // Once it has ended, the evening event takes over.
        assert_eq!(relevant_event(&events, est(24, 10, 0)), Some(&events[1]));
        // An event that just ended is not relevant either.
        assert_eq!(relevant_event(&events, est(24, 20, 0)), None);
        assert_eq!(relevant_event(&events, est(24, 22, 0)), None);
    }

    #[test]
    fn test_morning_peak_overlay() {
        let config = test_config();
        let program = assemble_program(&config, est(24, 4, 0), &wednesday_events());

        let expected = DailyProgram {
            morning: slot(hours(5), 22, 24),
            day: slot(hours(6) - Duration::minutes(2), 18, 24),
            evening: slot(hours(9) + Duration::minutes(2), 20, 24),
            night: slot(hours(16), 21, 24),
        };
        assert_eq!(*program.on(Weekday::Wed), expected);

        // The previous night keeps the baseline values: before pre-heating
        // the temperature regime carried over midnight is unchanged.
        assert_eq!(program.on(Weekday::Tue).night, slot(hours(21), 20, 25));

        // Every other day is untouched.
        for weekday in [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ] {
            assert_eq!(*program.on(weekday), baseline_day());
        }
    }

    #[test]
    fn test_maintain_normal_temp_before_pre_heat() {
        let mut config = test_config();
        config.peak_program.maintain_normal_temp_before_pre_heat = true;
        let program = assemble_program(&config, est(24, 4, 0), &wednesday_events());

        // Wednesday's overlay is identical...
        let expected = DailyProgram {
            morning: slot(hours(5), 22, 24),
            day: slot(hours(6) - Duration::minutes(2), 18, 24),
            evening: slot(hours(9) + Duration::minutes(2), 20, 24),
            night: slot(hours(16), 21, 24),
        };
        assert_eq!(*program.on(Weekday::Wed), expected);

        // ...but the night before holds the peak period's normal temperature
        // (the 07:00 morning slot) instead of the baseline night values.
        assert_eq!(program.on(Weekday::Tue).night, slot(hours(21), 21, 24));
    }

    #[test]
    fn test_stable_across_the_peak_window() {
        let config = test_config();
        let at_4h = assemble_program(&config, est(24, 4, 0), &wednesday_events());
        let at_8h = assemble_program(&config, est(24, 8, 0), &wednesday_events());
        assert_eq!(at_4h, at_8h);
    }

    #[test]
    fn test_switches_to_next_event_once_first_ends() {
        let config = test_config();
        let program = assemble_program(&config, est(24, 10, 0), &wednesday_events());

        let expected = DailyProgram {
            morning: slot(hours(15), 23, 24),
            day: slot(hours(16) - Duration::minutes(2), 19, 24),
            evening: slot(hours(20) + Duration::minutes(2), 21, 24),
            night: slot(hours(21), 20, 25),
        };
        assert_eq!(*program.on(Weekday::Wed), expected);

        // The pre-heat reference now resolves against the day slot.
        assert_eq!(program.on(Weekday::Tue).night, slot(hours(21), 20, 24));
    }

    #[test]
    fn test_reverts_to_baseline_after_both_events() {
        let config = test_config();
        let program = assemble_program(&config, est(24, 22, 0), &wednesday_events());
        assert_eq!(program, config.normal_program);
    }

    #[test]
    fn test_baseline_is_not_mutated() {
        let config = test_config();
        let before = config.normal_program.clone();
        let _ = assemble_program(&config, est(24, 4, 0), &wednesday_events());
        assert_eq!(config.normal_program, before);
    }

    #[test]
    fn test_event_just_after_midnight() {
        let mut config = test_config();
        config.peak_program.maintain_normal_temp_before_pre_heat = true;
        let events = [PeakEvent {
            start: est(24, 0, 30),
            end: est(24, 4, 0),
        }];
        let program = assemble_program(&config, est(23, 23, 0), &events);

        let wednesday = program.on(Weekday::Wed);
        // Pre-heat reaches back across midnight; the slot time is negative
        // and wraps to 23:30 only at the wire format.
        assert_eq!(wednesday.morning.time, Duration::minutes(-30));
        // No baseline slot precedes the buffered end, so the reference falls
        // back to the temperature carried over from Tuesday night.
        assert_eq!(wednesday.morning.heat, 22);
        assert_eq!(wednesday.day, slot(Duration::minutes(28), 18, 25));
        assert_eq!(
            wednesday.evening,
            slot(hours(4) + Duration::minutes(2), 20, 25)
        );
        assert_eq!(wednesday.night, slot(hours(7), 21, 24));

        // Tuesday's night slot ramps toward the held temperature: the first
        // Wednesday baseline slot at or after the event start.
        assert_eq!(program.on(Weekday::Tue).night, slot(hours(21), 21, 24));
    }

    #[test]
    fn test_ignores_second_event_in_same_window() {
        // Both events end within 12h of 05:00; only the first is overlaid.
        let config = test_config();
        let program = assemble_program(&config, est(24, 5, 0), &wednesday_events());

        assert_eq!(program.on(Weekday::Wed).morning, slot(hours(5), 22, 24));
        assert_eq!(
            program.on(Weekday::Wed).evening,
            slot(hours(9) + Duration::minutes(2), 20, 24)
        );
    }
}
