//! The thermostat program model.
//!
//! A week is seven [`DailyProgram`]s, one per weekday; a day is four named
//! [`DaySlot`]s (morning, day, evening, night) whose start times must be
//! non-decreasing. The model also owns the vendor's fixed-width program-string
//! encoding, in both directions: rendering for upload and parsing for
//! human-readable diffs against the schedule already on the device.

use chrono::{Duration, Weekday};
use thiserror::Error;

use crate::api::StateData;
use crate::models::time::hours_minutes;

/// Device field order: `PGM_01` is Monday, `PGM_07` is Sunday.
pub const DEVICE_DAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Lowercase weekday name, as used in configuration keys and diff output.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// One scheduled transition within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySlot {
    /// Start time as an offset from local midnight.
    pub time: Duration,
    /// Heating setpoint in whole degrees Celsius.
    pub heat: i16,
    /// Cooling setpoint in whole degrees Celsius.
    pub cool: i16,
}

impl std::fmt::Display for DaySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (h, m) = hours_minutes(self.time);
        write!(f, "{:02}:{:02} {}/{}", h, m, self.heat, self.cool)
    }
}

/// The program for a single day: exactly four named slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyProgram {
    pub morning: DaySlot,
    pub day: DaySlot,
    pub evening: DaySlot,
    pub night: DaySlot,
}

impl DailyProgram {
    /// The four slots with their conventional names, in time order.
    pub fn slots(&self) -> [(&'static str, DaySlot); 4] {
        [
            ("morning", self.morning),
            ("day", self.day),
            ("evening", self.evening),
            ("night", self.night),
        ]
    }

    /// Render this day in the vendor program-string encoding: 8 `HHMMTTT`
    /// groups, the four heat triples followed by the four cool triples.
    /// Slot times outside `[0h, 24h)` wrap around.
    pub fn program_string(&self) -> String {
        let mut out = String::with_capacity(PROGRAM_STRING_LEN);
        for (_, slot) in self.slots() {
            let (h, m) = hours_minutes(slot.time);
            out.push_str(&format!("{:02}{:02}{:03}", h, m, slot.heat * 10));
        }
        for (_, slot) in self.slots() {
            let (h, m) = hours_minutes(slot.time);
            out.push_str(&format!("{:02}{:02}{:03}", h, m, slot.cool * 10));
        }
        out
    }

    /// Decode a vendor program string back into a daily program.
    ///
    /// Times are taken from the heat triples; the device repeats them in the
    /// cool triples. Sub-degree temperatures (the device stores tenths) are
    /// truncated to whole degrees, which is all the model carries.
    pub fn from_program_string(s: &str) -> Result<Self, ProgramStringError> {
        if s.len() != PROGRAM_STRING_LEN {
            return Err(ProgramStringError::Length(s.len()));
        }
        if !s.is_ascii() {
            return Err(ProgramStringError::Field(s.to_string()));
        }
        let mut groups = [(Duration::zero(), 0i16); 8];
        for (i, group) in groups.iter_mut().enumerate() {
            *group = parse_group(&s[i * GROUP_LEN..(i + 1) * GROUP_LEN])?;
        }
        let slot = |i: usize| DaySlot {
            time: groups[i].0,
            heat: groups[i].1,
            cool: groups[i + 4].1,
        };
        Ok(DailyProgram {
            morning: slot(0),
            day: slot(1),
            evening: slot(2),
            night: slot(3),
        })
    }
}

const GROUP_LEN: usize = 7;
const PROGRAM_STRING_LEN: usize = 8 * GROUP_LEN;

/// Failure to decode a vendor program string.
#[derive(Debug, Error)]
pub enum ProgramStringError {
    #[error("program string must be {PROGRAM_STRING_LEN} characters, got {0}")]
    Length(usize),
    #[error("invalid program string field {0:?}")]
    Field(String),
}

fn parse_group(group: &str) -> Result<(Duration, i16), ProgramStringError> {
    let field = |range: std::ops::Range<usize>| {
        group[range.clone()]
            .parse::<i16>()
            .map_err(|_| ProgramStringError::Field(group[range].to_string()))
    };
    let hours = field(0..2)?;
    let minutes = field(2..4)?;
    let tenths = field(4..7)?;
    Ok((
        Duration::hours(i64::from(hours)) + Duration::minutes(i64::from(minutes)),
        tenths / 10,
    ))
}

/// The program for a whole week, one daily program per weekday.
///
/// Lookups assume each day's slot times are non-decreasing; configuration
/// validation enforces that before a program reaches this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyProgram {
    /// Indexed by `Weekday::num_days_from_sunday()`: Sunday first.
    days: [DailyProgram; 7],
}

impl WeeklyProgram {
    /// Build a weekly program from seven daily programs, Sunday first.
    pub fn from_days(days: [DailyProgram; 7]) -> Self {
        WeeklyProgram { days }
    }

    /// The daily program for `weekday`.
    pub fn on(&self, weekday: Weekday) -> &DailyProgram {
        &self.days[weekday.num_days_from_sunday() as usize]
    }

    /// Mutable access to the daily program for `weekday`.
    pub fn on_mut(&mut self, weekday: Weekday) -> &mut DailyProgram {
        &mut self.days[weekday.num_days_from_sunday() as usize]
    }

    /// The daily program for the day before `weekday`, wrapping Sunday back
    /// to Saturday.
    pub fn before(&self, weekday: Weekday) -> &DailyProgram {
        self.on(weekday.pred())
    }

    /// The daily program for the day after `weekday`, wrapping Saturday on
    /// to Sunday.
    pub fn after(&self, weekday: Weekday) -> &DailyProgram {
        self.on(weekday.succ())
    }

    /// All seven days with their weekdays, Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DailyProgram)> {
        let mut weekday = Weekday::Sun;
        self.days.iter().map(move |dp| {
            let entry = (weekday, dp);
            weekday = weekday.succ();
            entry
        })
    }

    /// The last slot on `weekday` whose start time is at or before `when`.
    ///
    /// When every slot starts after `when`, the temperature in effect is
    /// whatever carried over midnight: a synthetic slot at 00:00 holding the
    /// previous day's night setpoints.
    pub fn slot_before(&self, weekday: Weekday, when: Duration) -> DaySlot {
        let dp = self.on(weekday);
        for slot in [dp.night, dp.evening, dp.day, dp.morning] {
            if slot.time <= when {
                return slot;
            }
        }
        let previous = self.before(weekday);
        DaySlot {
            time: Duration::zero(),
            heat: previous.night.heat,
            cool: previous.night.cool,
        }
    }

    /// The first slot on `weekday` whose start time is at or after `when`.
    ///
    /// When every slot starts before `when`, the next transition belongs to
    /// the following day: a synthetic slot at `when` holding the next day's
    /// morning setpoints.
    pub fn slot_after(&self, weekday: Weekday, when: Duration) -> DaySlot {
        let dp = self.on(weekday);
        for slot in [dp.morning, dp.day, dp.evening, dp.night] {
            if slot.time >= when {
                return slot;
            }
        }
        let next = self.after(weekday);
        DaySlot {
            time: when,
            heat: next.morning.heat,
            cool: next.morning.cool,
        }
    }

    /// Render the whole week into the vendor's per-day program strings.
    pub fn to_state_data(&self) -> StateData {
        StateData {
            monday: self.on(Weekday::Mon).program_string(),
            tuesday: self.on(Weekday::Tue).program_string(),
            wednesday: self.on(Weekday::Wed).program_string(),
            thursday: self.on(Weekday::Thu).program_string(),
            friday: self.on(Weekday::Fri).program_string(),
            saturday: self.on(Weekday::Sat).program_string(),
            sunday: self.on(Weekday::Sun).program_string(),
        }
    }

    /// Decode a device's program strings back into a weekly program.
    pub fn from_state_data(data: &StateData) -> Result<Self, ProgramStringError> {
        let mut days = [DailyProgram::from_program_string(&data.sunday)?; 7];
        for weekday in DEVICE_DAY_ORDER {
            days[weekday.num_days_from_sunday() as usize] =
                DailyProgram::from_program_string(data.program(weekday))?;
        }
        Ok(WeeklyProgram { days })
    }
}
